use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::classify::Category;

/// One on-hand pantry entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub category: Category,
    pub quantity: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(
        default,
        with = "crate::dates::iso_date::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expiration_date: Option<Date>,
    #[serde(with = "time::serde::rfc3339")]
    pub added_at: OffsetDateTime,
}

fn default_unit() -> String {
    "unit".into()
}

/// Everything the caller supplies for a new entry; id and `added_at` are assigned on add.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIngredient {
    pub name: String,
    #[serde(default)]
    pub category: Category,
    pub quantity: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default, with = "crate::dates::iso_date::option")]
    pub expiration_date: Option<Date>,
}

impl NewIngredient {
    pub fn new(
        name: impl Into<String>,
        category: Category,
        quantity: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            quantity,
            unit: unit.into(),
            expiration_date: None,
        }
    }

    pub fn expiring(mut self, date: Date) -> Self {
        self.expiration_date = Some(date);
        self
    }
}

/// Partial update. `expiration_date: Some(None)` clears the date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngredientPatch {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub expiration_date: Option<Option<Date>>,
}

impl IngredientPatch {
    pub fn quantity(quantity: f64) -> Self {
        Self {
            quantity: Some(quantity),
            ..Self::default()
        }
    }
}
