use time::{Date, Duration};
use uuid::Uuid;

use super::repo_types::{MealPlanEntry, MealType};
use crate::dates;
use crate::error::{AppError, Result};
use crate::local::Namespace;
use crate::recipes::Recipe;
use crate::sync::SyncHandle;

/// Date + slot assignments. A slot holds one entry; replacing it is an explicit call.
#[derive(Default)]
pub struct MealPlanStore {
    entries: Vec<MealPlanEntry>,
    sync: Option<SyncHandle>,
}

impl MealPlanStore {
    pub fn new(sync: Option<SyncHandle>) -> Self {
        Self {
            entries: Vec::new(),
            sync,
        }
    }

    pub fn entries(&self) -> &[MealPlanEntry] {
        &self.entries
    }

    pub fn entry_for(&self, date: Date, meal_type: MealType) -> Option<&MealPlanEntry> {
        self.entries
            .iter()
            .find(|e| e.date == date && e.meal_type == meal_type)
    }

    /// Plans `recipe` into an empty slot; an occupied slot is a `Conflict` for the caller
    /// to resolve.
    pub fn add(
        &mut self,
        date: Date,
        meal_type: MealType,
        recipe: &Recipe,
    ) -> Result<MealPlanEntry> {
        if let Some(existing) = self.entry_for(date, meal_type) {
            return Err(AppError::Conflict(format!(
                "{} {:?} already planned with recipe {}",
                dates::format(date),
                meal_type,
                existing.recipe_id
            )));
        }
        let entry = MealPlanEntry {
            id: Uuid::new_v4(),
            date,
            meal_type,
            recipe_id: recipe.id.clone(),
            recipe: Some(recipe.clone()),
        };
        self.entries.push(entry.clone());
        self.persist();
        Ok(entry)
    }

    /// Puts `recipe` into the slot, replacing whatever was there.
    pub fn replace_slot(
        &mut self,
        date: Date,
        meal_type: MealType,
        recipe: &Recipe,
    ) -> MealPlanEntry {
        self.entries
            .retain(|e| !(e.date == date && e.meal_type == meal_type));
        let entry = MealPlanEntry {
            id: Uuid::new_v4(),
            date,
            meal_type,
            recipe_id: recipe.id.clone(),
            recipe: Some(recipe.clone()),
        };
        self.entries.push(entry.clone());
        self.persist();
        entry
    }

    pub fn remove(&mut self, id: Uuid) -> Result<MealPlanEntry> {
        let idx = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| AppError::not_found(format!("meal plan entry {}", id)))?;
        let removed = self.entries.remove(idx);
        self.persist();
        Ok(removed)
    }

    /// Drops every entry that points at `recipe_id`.
    pub fn remove_recipe(&mut self, recipe_id: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| e.recipe_id != recipe_id);
        let removed = before - self.entries.len();
        if removed > 0 {
            self.persist();
        }
        removed
    }

    /// Entries with `start <= date <= end`, ordered by date then slot.
    pub fn entries_between(&self, start: Date, end: Date) -> Vec<&MealPlanEntry> {
        let mut out: Vec<_> = self
            .entries
            .iter()
            .filter(|e| e.date >= start && e.date <= end)
            .collect();
        out.sort_by_key(|e| (e.date, e.meal_type as u8));
        out
    }

    pub fn week_of(&self, start: Date) -> Vec<&MealPlanEntry> {
        self.entries_between(start, start + Duration::days(6))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
    }

    pub fn replace_from_remote(&mut self, entries: Vec<MealPlanEntry>) {
        self.entries = entries;
    }

    fn persist(&self) {
        if let Some(sync) = &self.sync {
            sync.save_local(Namespace::MealPlans, &self.entries);
            sync.sync_meal_plans(&self.entries);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::RecipeSource;
    use time::macros::date;

    fn recipe(id: &str) -> Recipe {
        Recipe::new(id, format!("Recipe {}", id), RecipeSource::Ai)
    }

    #[test]
    fn occupied_slot_is_a_conflict_until_replaced() {
        let mut plans = MealPlanStore::default();
        let day = date!(2026 - 10 - 14);
        plans.add(day, MealType::Dinner, &recipe("a")).unwrap();
        let err = plans.add(day, MealType::Dinner, &recipe("b")).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        plans.add(day, MealType::Lunch, &recipe("b")).unwrap();

        plans.replace_slot(day, MealType::Dinner, &recipe("c"));
        assert_eq!(plans.entries().len(), 2);
        assert_eq!(plans.entry_for(day, MealType::Dinner).unwrap().recipe_id, "c");
    }

    #[test]
    fn week_view_is_sorted_and_bounded() {
        let mut plans = MealPlanStore::default();
        plans.add(date!(2026 - 10 - 20), MealType::Dinner, &recipe("late")).unwrap();
        plans.add(date!(2026 - 10 - 12), MealType::Dinner, &recipe("first")).unwrap();
        plans.add(date!(2026 - 10 - 12), MealType::Breakfast, &recipe("early")).unwrap();
        plans.add(date!(2026 - 10 - 11), MealType::Dinner, &recipe("before")).unwrap();

        let week: Vec<_> = plans
            .week_of(date!(2026 - 10 - 12))
            .iter()
            .map(|e| e.recipe_id.as_str())
            .collect();
        assert_eq!(week, vec!["early", "first"]);
    }

    #[test]
    fn removing_a_recipe_clears_its_slots() {
        let mut plans = MealPlanStore::default();
        let entry = plans.add(date!(2026 - 10 - 14), MealType::Snack, &recipe("a")).unwrap();
        plans.add(date!(2026 - 10 - 15), MealType::Snack, &recipe("a")).unwrap();
        assert_eq!(plans.remove_recipe("a"), 2);
        assert!(matches!(plans.remove(entry.id), Err(AppError::NotFound(_))));
    }
}
