use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::meal_plans::MealType;
use crate::recipes::{Difficulty, Recipe, RecipeIngredient, RecipeSource};

/// Which structured payload a completion is expected to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Suggestions,
    Substitutions,
    WeeklyPlan,
    VoiceIntent,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealSuggestion {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cook_time: Option<u32>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub servings: Option<u32>,
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredient>,
    #[serde(default)]
    pub instructions: Vec<String>,
    /// Pantry items the suggestion is meant to use up.
    #[serde(default)]
    pub uses_expiring: Vec<String>,
}

impl MealSuggestion {
    pub fn into_recipe(self) -> Recipe {
        let mut recipe = Recipe::new(format!("ai-{}", Uuid::new_v4()), self.title, RecipeSource::Ai)
            .with_ingredients(self.ingredients);
        recipe.description = self.description;
        recipe.cook_time = self.cook_time.unwrap_or_default();
        recipe.difficulty = self.difficulty.unwrap_or_default();
        recipe.servings = self.servings.unwrap_or(1).max(1);
        recipe.instructions = self.instructions;
        recipe
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Substitution {
    pub original: String,
    pub substitute: String,
    #[serde(default)]
    pub ratio: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedMeal {
    pub meal_type: MealType,
    pub title: String,
    #[serde(default)]
    pub recipe_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedDay {
    pub day: String,
    #[serde(default)]
    pub meals: Vec<PlannedMeal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPlan {
    pub days: Vec<PlannedDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceItem {
    pub name: String,
    #[serde(default)]
    pub quantity: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

/// What a spoken command asks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoiceIntent {
    AddPantry { items: Vec<VoiceItem> },
    AddShopping { items: Vec<VoiceItem> },
    Navigate { route: String },
    Chat { message: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum AiResponse {
    SuggestionList(Vec<MealSuggestion>),
    SubstitutionList(Vec<Substitution>),
    WeeklyPlan(WeeklyPlan),
    VoiceIntent(VoiceIntent),
}
