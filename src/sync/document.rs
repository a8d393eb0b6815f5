use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::meal_plans::MealPlanEntry;
use crate::pantry::Ingredient;
use crate::recipes::Recipe;
use crate::settings::NotificationPrefs;
use crate::shopping::ShoppingList;

/// Which remote document a write lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum DocKey {
    User(Uuid),
    Household(Uuid),
}

impl fmt::Display for DocKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocKey::User(id) => write!(f, "userData/{}", id),
            DocKey::Household(id) => write!(f, "householdData/{}", id),
        }
    }
}

/// One independently synced top-level field of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncField {
    Pantry,
    ShoppingLists,
    MealPlans,
    Favorites,
    Recipes,
    Settings,
}

impl SyncField {
    pub const ALL: [SyncField; 6] = [
        SyncField::Pantry,
        SyncField::ShoppingLists,
        SyncField::MealPlans,
        SyncField::Favorites,
        SyncField::Recipes,
        SyncField::Settings,
    ];
}

/// Serialized snapshot held remotely, and also the shape of a field-level patch:
/// `None` means "absent" (never written, or not part of this patch).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncedDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pantry: Option<Vec<Ingredient>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shopping_lists: Option<Vec<ShoppingList>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meal_plans: Option<Vec<MealPlanEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorites: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipes: Option<Vec<Recipe>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<NotificationPrefs>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_synced: Option<OffsetDateTime>,
    /// Session that produced the latest write; used to recognise our own echoes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_writer: Option<Uuid>,
}

impl SyncedDocument {
    pub fn has(&self, field: SyncField) -> bool {
        match field {
            SyncField::Pantry => self.pantry.is_some(),
            SyncField::ShoppingLists => self.shopping_lists.is_some(),
            SyncField::MealPlans => self.meal_plans.is_some(),
            SyncField::Favorites => self.favorites.is_some(),
            SyncField::Recipes => self.recipes.is_some(),
            SyncField::Settings => self.settings.is_some(),
        }
    }

    pub fn fields(&self) -> Vec<SyncField> {
        SyncField::ALL.into_iter().filter(|f| self.has(*f)).collect()
    }

    /// JSON form of one field, `None` when absent.
    pub fn field_value(&self, field: SyncField) -> Option<serde_json::Value> {
        let value = match field {
            SyncField::Pantry => self.pantry.as_ref().map(serde_json::to_value),
            SyncField::ShoppingLists => self.shopping_lists.as_ref().map(serde_json::to_value),
            SyncField::MealPlans => self.meal_plans.as_ref().map(serde_json::to_value),
            SyncField::Favorites => self.favorites.as_ref().map(serde_json::to_value),
            SyncField::Recipes => self.recipes.as_ref().map(serde_json::to_value),
            SyncField::Settings => self.settings.as_ref().map(serde_json::to_value),
        };
        value.and_then(|v| v.ok())
    }

    pub fn clear(&mut self, field: SyncField) {
        match field {
            SyncField::Pantry => self.pantry = None,
            SyncField::ShoppingLists => self.shopping_lists = None,
            SyncField::MealPlans => self.meal_plans = None,
            SyncField::Favorites => self.favorites = None,
            SyncField::Recipes => self.recipes = None,
            SyncField::Settings => self.settings = None,
        }
    }

    /// Field-level merge: fields present in `patch` replace ours, the rest are kept.
    pub fn merge(&mut self, patch: SyncedDocument) {
        if patch.pantry.is_some() {
            self.pantry = patch.pantry;
        }
        if patch.shopping_lists.is_some() {
            self.shopping_lists = patch.shopping_lists;
        }
        if patch.meal_plans.is_some() {
            self.meal_plans = patch.meal_plans;
        }
        if patch.favorites.is_some() {
            self.favorites = patch.favorites;
        }
        if patch.recipes.is_some() {
            self.recipes = patch.recipes;
        }
        if patch.settings.is_some() {
            self.settings = patch.settings;
        }
        if patch.last_synced.is_some() {
            self.last_synced = patch.last_synced;
        }
        if patch.last_writer.is_some() {
            self.last_writer = patch.last_writer;
        }
    }
}
