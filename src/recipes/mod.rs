mod repo_types;
mod services;

pub use repo_types::{Difficulty, Recipe, RecipeIngredient, RecipePatch, RecipeSource};
pub use services::{
    fetch_from_catalog, CatalogQuery, RecipeCatalog, RecipeStore, RecipesSnapshot, MAX_RATING,
};
