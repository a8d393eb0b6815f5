use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use super::repo_types::{Recipe, RecipeIngredient, RecipePatch, RecipeSource};
use crate::error::{AppError, Result};
use crate::local::Namespace;
use crate::sync::SyncHandle;

pub const MAX_RATING: u8 = 5;

/// Local snapshot layout of the recipes namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RecipesSnapshot {
    #[serde(default)]
    pub recipes: Vec<Recipe>,
    #[serde(default)]
    pub favorites: Vec<String>,
}

/// Stored recipes plus the favorite id set. Favorites only reference recipes held here.
#[derive(Default)]
pub struct RecipeStore {
    recipes: Vec<Recipe>,
    favorites: Vec<String>,
    sync: Option<SyncHandle>,
}

impl RecipeStore {
    pub fn new(sync: Option<SyncHandle>) -> Self {
        Self {
            recipes: Vec::new(),
            favorites: Vec::new(),
            sync,
        }
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn favorite_ids(&self) -> &[String] {
        &self.favorites
    }

    pub fn get(&self, id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    /// Inserts, or merges into the recipe with the same id. Local favorite and rating survive.
    pub fn upsert(&mut self, recipe: Recipe) -> Result<Recipe> {
        let stored = self.upsert_quiet(recipe)?;
        self.persist_recipes();
        Ok(stored)
    }

    /// Stores many recipes with a single write.
    pub fn upsert_many(&mut self, recipes: Vec<Recipe>) -> Result<usize> {
        let mut stored = 0;
        for recipe in recipes {
            match self.upsert_quiet(recipe) {
                Ok(_) => stored += 1,
                Err(e) => warn!(error = %e, "skipping invalid recipe"),
            }
        }
        if stored > 0 {
            self.persist_recipes();
        }
        Ok(stored)
    }

    fn upsert_quiet(&mut self, mut recipe: Recipe) -> Result<Recipe> {
        if recipe.id.trim().is_empty() {
            return Err(AppError::validation("recipe id is required"));
        }
        if recipe.title.trim().is_empty() {
            return Err(AppError::validation("recipe title is required"));
        }
        recipe.rating = recipe.rating.min(MAX_RATING);
        recipe.is_favorite = self.favorites.contains(&recipe.id);

        match self.recipes.iter_mut().find(|r| r.id == recipe.id) {
            Some(existing) => {
                recipe.rating = existing.rating;
                recipe.created_at = recipe.created_at.or(existing.created_at);
                recipe.description = recipe.description.or_else(|| existing.description.take());
                recipe.image = recipe.image.or_else(|| existing.image.take());
                recipe.source_id = recipe.source_id.or_else(|| existing.source_id.take());
                recipe.category = recipe.category.or_else(|| existing.category.take());
                recipe.cuisine = recipe.cuisine.or_else(|| existing.cuisine.take());
                if recipe.ingredients.is_empty() {
                    recipe.ingredients = std::mem::take(&mut existing.ingredients);
                }
                if recipe.instructions.is_empty() {
                    recipe.instructions = std::mem::take(&mut existing.instructions);
                }
                if recipe.cook_time == 0 {
                    recipe.cook_time = existing.cook_time;
                }
                debug!(id = %recipe.id, "recipe merged");
                *existing = recipe.clone();
            }
            None => {
                if recipe.created_at.is_none() {
                    recipe.created_at = Some(OffsetDateTime::now_utc());
                }
                debug!(id = %recipe.id, "recipe stored");
                self.recipes.push(recipe.clone());
            }
        }
        Ok(recipe)
    }

    /// Stores a user-authored recipe under a fresh id.
    pub fn add_custom(
        &mut self,
        title: &str,
        ingredients: Vec<RecipeIngredient>,
        instructions: Vec<String>,
    ) -> Result<Recipe> {
        let id = format!("custom-{}", Uuid::new_v4());
        let mut recipe =
            Recipe::new(id, title.trim(), RecipeSource::Custom).with_ingredients(ingredients);
        recipe.instructions = instructions;
        self.upsert(recipe)
    }

    pub fn update(&mut self, id: &str, patch: RecipePatch) -> Result<Recipe> {
        if matches!(patch.title.as_deref().map(str::trim), Some("")) {
            return Err(AppError::validation("recipe title is required"));
        }
        let recipe = self
            .recipes
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::not_found(format!("recipe {}", id)))?;
        if let Some(v) = patch.title {
            recipe.title = v;
        }
        if let Some(v) = patch.description {
            recipe.description = Some(v);
        }
        if let Some(v) = patch.image {
            recipe.image = Some(v);
        }
        if let Some(v) = patch.cook_time {
            recipe.cook_time = v;
        }
        if let Some(v) = patch.difficulty {
            recipe.difficulty = v;
        }
        if let Some(v) = patch.servings {
            recipe.servings = v;
        }
        if let Some(v) = patch.ingredients {
            recipe.ingredients = v;
        }
        if let Some(v) = patch.instructions {
            recipe.instructions = v;
        }
        if let Some(v) = patch.category {
            recipe.category = Some(v);
        }
        if let Some(v) = patch.cuisine {
            recipe.cuisine = Some(v);
        }
        let updated = recipe.clone();
        self.persist_recipes();
        Ok(updated)
    }

    /// Removes the recipe and its favorite id together.
    pub fn remove(&mut self, id: &str) -> Result<Recipe> {
        let idx = self
            .recipes
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| AppError::not_found(format!("recipe {}", id)))?;
        let removed = self.recipes.remove(idx);
        let was_favorite = self.favorites.iter().any(|f| f == id);
        self.favorites.retain(|f| f != id);
        self.persist_recipes();
        if was_favorite {
            self.persist_favorites();
        }
        Ok(removed)
    }

    /// Flips the favorite flag and returns the new state.
    pub fn toggle_favorite(&mut self, id: &str) -> Result<bool> {
        let recipe = self
            .recipes
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::not_found(format!("recipe {}", id)))?;
        recipe.is_favorite = !recipe.is_favorite;
        let now_favorite = recipe.is_favorite;
        if now_favorite {
            self.favorites.push(id.to_string());
        } else {
            self.favorites.retain(|f| f != id);
        }
        self.persist_recipes();
        self.persist_favorites();
        Ok(now_favorite)
    }

    /// Sets the rating, clamped to `0..=5`.
    pub fn rate(&mut self, id: &str, rating: i64) -> Result<u8> {
        let recipe = self
            .recipes
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| AppError::not_found(format!("recipe {}", id)))?;
        let rating = rating.clamp(0, MAX_RATING as i64) as u8;
        recipe.rating = rating;
        self.persist_recipes();
        Ok(rating)
    }

    pub fn favorites(&self) -> Vec<&Recipe> {
        self.favorites.iter().filter_map(|id| self.get(id)).collect()
    }

    pub fn custom(&self) -> Vec<&Recipe> {
        self.recipes.iter().filter(|r| r.is_custom).collect()
    }

    /// Case-insensitive substring search over title, category and cuisine.
    pub fn search(&self, query: &str) -> Vec<&Recipe> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return self.recipes.iter().collect();
        }
        self.recipes
            .iter()
            .filter(|r| {
                r.title.to_lowercase().contains(&q)
                    || r.category.as_deref().is_some_and(|c| c.to_lowercase().contains(&q))
                    || r.cuisine.as_deref().is_some_and(|c| c.to_lowercase().contains(&q))
            })
            .collect()
    }

    pub fn snapshot(&self) -> RecipesSnapshot {
        RecipesSnapshot {
            recipes: self.recipes.clone(),
            favorites: self.favorites.clone(),
        }
    }

    pub fn replace_recipes_from_remote(&mut self, recipes: Vec<Recipe>) {
        self.recipes = recipes;
        self.reconcile_favorites();
    }

    pub fn replace_favorites_from_remote(&mut self, favorites: Vec<String>) {
        self.favorites = favorites;
        self.reconcile_favorites();
    }

    /// Drops dangling favorite ids and realigns the per-recipe flag with the set.
    fn reconcile_favorites(&mut self) {
        let recipes = &self.recipes;
        self.favorites.retain(|id| recipes.iter().any(|r| &r.id == id));
        let mut seen = Vec::with_capacity(self.favorites.len());
        self.favorites.retain(|id| {
            let fresh = !seen.contains(id);
            seen.push(id.clone());
            fresh
        });
        for recipe in &mut self.recipes {
            recipe.is_favorite = self.favorites.contains(&recipe.id);
        }
    }

    fn save_local(&self) {
        if let Some(sync) = &self.sync {
            sync.save_local(Namespace::Recipes, &self.snapshot());
        }
    }

    fn persist_recipes(&self) {
        if let Some(sync) = &self.sync {
            self.save_local();
            sync.sync_recipes(&self.recipes);
        }
    }

    fn persist_favorites(&self) {
        if let Some(sync) = &self.sync {
            self.save_local();
            sync.sync_favorites(&self.favorites);
        }
    }
}

/// Remote recipe catalog; returns already-normalized records.
#[async_trait]
pub trait RecipeCatalog: Send + Sync {
    async fn fetch_random(&self, count: usize) -> anyhow::Result<Vec<Recipe>>;
    async fn search_by_name(&self, query: &str) -> anyhow::Result<Vec<Recipe>>;
    async fn search_by_ingredient(&self, name: &str) -> anyhow::Result<Vec<Recipe>>;
}

#[derive(Debug, Clone)]
pub enum CatalogQuery {
    Random(usize),
    ByName(String),
    ByIngredient(String),
}

/// Fetches from the catalog. A failed or unusable response yields an empty list.
pub async fn fetch_from_catalog(catalog: &dyn RecipeCatalog, query: &CatalogQuery) -> Vec<Recipe> {
    let result = match query {
        CatalogQuery::Random(n) => catalog.fetch_random(*n).await,
        CatalogQuery::ByName(q) => catalog.search_by_name(q).await,
        CatalogQuery::ByIngredient(i) => catalog.search_by_ingredient(i).await,
    };
    match result {
        Ok(recipes) => recipes,
        Err(e) => {
            let err = AppError::UpstreamMalformed(format!("{:#}", e));
            warn!(error = %err, ?query, "catalog fetch failed; using empty result");
            Vec::new()
        }
    }
}
