use serde::Serialize;
use time::{Duration, OffsetDateTime};

use super::category::Category;
use crate::pantry::Ingredient;

const DEFAULT_SHELF_LIFE_DAYS: i64 = 14;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Specific items, checked by substring before the category bucket.
const SHELF_LIFE_TABLE: &[(&str, i64)] = &[
    ("berries", 5),
    ("strawberr", 5),
    ("raspberr", 3),
    ("banana", 5),
    ("avocado", 4),
    ("lettuce", 7),
    ("spinach", 5),
    ("herbs", 7),
    ("cilantro", 7),
    ("mushroom", 7),
    ("tomato", 7),
    ("apple", 30),
    ("potato", 30),
    ("onion", 30),
    ("garlic", 60),
    ("carrot", 21),
    ("ground", 2),
    ("chicken", 2),
    ("fish", 2),
    ("salmon", 2),
    ("shrimp", 2),
    ("bacon", 7),
    ("steak", 4),
    ("milk", 7),
    ("cream", 10),
    ("yogurt", 14),
    ("egg", 28),
    ("butter", 60),
    ("hard cheese", 60),
    ("parmesan", 90),
    ("cheese", 21),
    ("bread", 5),
    ("tortilla", 14),
];

fn category_shelf_life(category: Category) -> Option<i64> {
    let days = match category {
        Category::Produce => 7,
        Category::Meat => 3,
        Category::Dairy => 10,
        Category::Grains => 180,
        Category::Canned => 730,
        Category::Frozen => 180,
        Category::Spices => 365,
        Category::Condiments => 180,
        Category::Beverages => 30,
        Category::Snacks => 60,
        Category::Other => return None,
    };
    Some(days)
}

pub fn estimate_shelf_life_days(name: &str, category: Category) -> i64 {
    let lower = name.trim().to_lowercase();
    if !lower.is_empty() {
        if let Some((_, days)) = SHELF_LIFE_TABLE
            .iter()
            .find(|(fragment, _)| lower.contains(fragment))
        {
            return *days;
        }
    }
    category_shelf_life(category).unwrap_or(DEFAULT_SHELF_LIFE_DAYS)
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FreshnessStatus {
    Expired,
    Critical,
    Warning,
    Good,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExpiryInfo {
    pub days_left: i64,
    pub status: FreshnessStatus,
    /// No explicit date was recorded; `days_left` is a prediction.
    pub is_estimated: bool,
    pub label: String,
}

fn ceil_days(delta: Duration) -> i64 {
    (delta.as_seconds_f64() / SECONDS_PER_DAY).ceil() as i64
}

/// Instant the ingredient expires, and whether it was estimated.
pub fn expires_at(ingredient: &Ingredient) -> (OffsetDateTime, bool) {
    match ingredient.expiration_date {
        Some(date) => (date.midnight().assume_utc(), false),
        None => {
            let shelf = estimate_shelf_life_days(&ingredient.name, ingredient.category);
            (ingredient.added_at + Duration::days(shelf), true)
        }
    }
}

pub fn days_until_expiration_at(ingredient: &Ingredient, now: OffsetDateTime) -> i64 {
    let (at, _) = expires_at(ingredient);
    ceil_days(at - now)
}

pub fn days_until_expiration(ingredient: &Ingredient) -> i64 {
    days_until_expiration_at(ingredient, OffsetDateTime::now_utc())
}

pub fn classify_days(days_left: i64) -> FreshnessStatus {
    match days_left {
        d if d < 0 => FreshnessStatus::Expired,
        0..=2 => FreshnessStatus::Critical,
        3..=5 => FreshnessStatus::Warning,
        _ => FreshnessStatus::Good,
    }
}

fn label_for(days_left: i64, is_estimated: bool) -> String {
    let base = match days_left {
        d if d < -1 => format!("Expired {} days ago", -d),
        -1 => "Expired yesterday".to_string(),
        0 => "Expires today".to_string(),
        1 => "Expires tomorrow".to_string(),
        d => format!("{} days left", d),
    };
    if is_estimated {
        format!("~{}", base)
    } else {
        base
    }
}

pub fn status_at(ingredient: &Ingredient, now: OffsetDateTime) -> ExpiryInfo {
    let (at, is_estimated) = expires_at(ingredient);
    let days_left = ceil_days(at - now);
    ExpiryInfo {
        days_left,
        status: classify_days(days_left),
        is_estimated,
        label: label_for(days_left, is_estimated),
    }
}

pub fn status(ingredient: &Ingredient) -> ExpiryInfo {
    status_at(ingredient, OffsetDateTime::now_utc())
}

/// Items expiring within `horizon_days` (expired ones included), soonest first.
pub fn expiring_within<'a>(
    items: &'a [Ingredient],
    horizon_days: i64,
    now: OffsetDateTime,
) -> Vec<(&'a Ingredient, ExpiryInfo)> {
    let mut out: Vec<_> = items
        .iter()
        .map(|i| (i, status_at(i, now)))
        .filter(|(_, info)| info.days_left <= horizon_days)
        .collect();
    out.sort_by_key(|(_, info)| info.days_left);
    out
}
