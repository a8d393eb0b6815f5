mod repo_types;
mod services;

pub use repo_types::{Ingredient, IngredientPatch, NewIngredient};
pub use services::PantryStore;
