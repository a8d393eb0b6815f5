use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::classify::ShoppingCategory;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItem {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub category: ShoppingCategory,
    pub quantity: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub checked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_price: Option<f64>,
    /// Recipe the item was imported from, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipe_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingList {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub items: Vec<ShoppingItem>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default)]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShoppingItem {
    pub name: String,
    #[serde(default)]
    pub category: ShoppingCategory,
    #[serde(default = "one")]
    pub quantity: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub estimated_price: Option<f64>,
    #[serde(default)]
    pub recipe_id: Option<String>,
}

fn one() -> f64 {
    1.0
}

fn default_unit() -> String {
    "unit".into()
}

impl NewShoppingItem {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: ShoppingCategory::Other,
            quantity: 1.0,
            unit: "unit".into(),
            estimated_price: None,
            recipe_id: None,
        }
    }

    pub fn with_category(mut self, category: ShoppingCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_quantity(mut self, quantity: f64, unit: impl Into<String>) -> Self {
        self.quantity = quantity;
        self.unit = unit.into();
        self
    }

    pub fn from_recipe(mut self, recipe_id: impl Into<String>) -> Self {
        self.recipe_id = Some(recipe_id.into());
        self
    }
}
