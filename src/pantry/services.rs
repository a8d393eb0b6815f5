use time::{Date, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::repo_types::{Ingredient, IngredientPatch, NewIngredient};
use crate::classify::{classify, suggest_unit};
use crate::error::{AppError, Result};
use crate::local::Namespace;
use crate::matching;
use crate::sync::SyncHandle;

fn check_quantity(quantity: f64) -> Result<()> {
    if !quantity.is_finite() || quantity < 0.0 {
        return Err(AppError::validation(format!(
            "quantity must be a non-negative number, got {}",
            quantity
        )));
    }
    Ok(())
}

fn check_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation("ingredient name is required"));
    }
    Ok(trimmed.to_string())
}

/// On-hand ingredients. Local state is authoritative until a remote snapshot replaces it.
#[derive(Default)]
pub struct PantryStore {
    items: Vec<Ingredient>,
    sync: Option<SyncHandle>,
}

impl PantryStore {
    pub fn new(sync: Option<SyncHandle>) -> Self {
        Self {
            items: Vec::new(),
            sync,
        }
    }

    pub fn items(&self) -> &[Ingredient] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Ingredient> {
        self.items.iter().find(|i| i.id == id)
    }

    /// First entry whose name loosely matches `name`, in pantry order.
    pub fn find_loose(&self, name: &str) -> Option<&Ingredient> {
        matching::find_first(&self.items, name, |i| i.name.as_str())
    }

    pub fn add(&mut self, new: NewIngredient) -> Result<Ingredient> {
        let name = check_name(&new.name)?;
        check_quantity(new.quantity)?;
        let unit = match new.unit.trim() {
            "" => "unit".to_string(),
            u => u.to_string(),
        };
        let ingredient = Ingredient {
            id: Uuid::new_v4(),
            name,
            category: new.category,
            quantity: new.quantity,
            unit,
            expiration_date: new.expiration_date,
            added_at: OffsetDateTime::now_utc(),
        };
        debug!(id = %ingredient.id, name = %ingredient.name, "pantry add");
        self.items.push(ingredient.clone());
        self.persist();
        Ok(ingredient)
    }

    /// Classifies the name and fills in a plausible unit before adding.
    pub fn add_smart(
        &mut self,
        name: &str,
        quantity: Option<f64>,
        unit: Option<&str>,
        expiration_date: Option<Date>,
    ) -> Result<Ingredient> {
        let category = classify(name);
        let unit = match unit.map(str::trim) {
            Some(u) if !u.is_empty() => u.to_string(),
            _ => suggest_unit(name, category),
        };
        self.add(NewIngredient {
            name: name.to_string(),
            category,
            quantity: quantity.unwrap_or(1.0),
            unit,
            expiration_date,
        })
    }

    pub fn update(&mut self, id: Uuid, patch: IngredientPatch) -> Result<Ingredient> {
        if let Some(q) = patch.quantity {
            check_quantity(q)?;
        }
        let name = patch.name.as_deref().map(check_name).transpose()?;
        let item = self
            .items
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| AppError::not_found(format!("pantry item {}", id)))?;

        if let Some(name) = name {
            item.name = name;
        }
        if let Some(category) = patch.category {
            item.category = category;
        }
        if let Some(quantity) = patch.quantity {
            item.quantity = quantity;
        }
        if let Some(unit) = patch.unit {
            item.unit = unit;
        }
        if let Some(expiration_date) = patch.expiration_date {
            item.expiration_date = expiration_date;
        }
        let updated = item.clone();
        self.persist();
        Ok(updated)
    }

    pub fn remove(&mut self, id: Uuid) -> Result<Ingredient> {
        let idx = self
            .items
            .iter()
            .position(|i| i.id == id)
            .ok_or_else(|| AppError::not_found(format!("pantry item {}", id)))?;
        let removed = self.items.remove(idx);
        debug!(id = %id, name = %removed.name, "pantry remove");
        self.persist();
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
    }

    /// Applies remote or locally persisted state without scheduling a write back.
    pub fn replace_from_remote(&mut self, items: Vec<Ingredient>) {
        self.items = items;
    }

    fn persist(&self) {
        if let Some(sync) = &self.sync {
            sync.save_local(Namespace::Pantry, &self.items);
            sync.sync_pantry(&self.items);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Category;

    #[test]
    fn add_assigns_id_and_timestamp() {
        let mut pantry = PantryStore::default();
        let before = OffsetDateTime::now_utc();
        let item = pantry
            .add(NewIngredient::new("Rice", Category::Grains, 2.0, "bag"))
            .unwrap();
        assert_eq!(pantry.len(), 1);
        assert!(item.added_at >= before);
        assert_eq!(pantry.get(item.id).unwrap().name, "Rice");
    }

    #[test]
    fn add_rejects_blank_name_and_negative_quantity() {
        let mut pantry = PantryStore::default();
        let err = pantry
            .add(NewIngredient::new("  ", Category::Other, 1.0, "unit"))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        let err = pantry
            .add(NewIngredient::new("milk", Category::Dairy, -1.0, "gal"))
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(pantry.is_empty());
    }

    #[test]
    fn add_smart_classifies_and_picks_unit() {
        let mut pantry = PantryStore::default();
        let item = pantry.add_smart("chicken breast", None, None, None).unwrap();
        assert_eq!(item.category, Category::Meat);
        assert!(!item.unit.is_empty());
        assert_eq!(item.quantity, 1.0);

        let item = pantry.add_smart("whole milk", Some(2.0), Some(" "), None).unwrap();
        assert_eq!(item.unit, "gal");

        let item = pantry.add_smart("whole milk", Some(1.0), Some("l"), None).unwrap();
        assert_eq!(item.unit, "l");
    }

    #[test]
    fn update_merges_fields_and_reports_missing() {
        let mut pantry = PantryStore::default();
        let item = pantry.add_smart("eggs", Some(12.0), None, None).unwrap();
        let updated = pantry
            .update(item.id, IngredientPatch::quantity(6.0))
            .unwrap();
        assert_eq!(updated.quantity, 6.0);
        assert_eq!(updated.name, "eggs");
        assert_eq!(updated.added_at, item.added_at);

        let err = pantry
            .update(Uuid::new_v4(), IngredientPatch::quantity(1.0))
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn remove_and_clear() {
        let mut pantry = PantryStore::default();
        let a = pantry.add_smart("apples", None, None, None).unwrap();
        pantry.add_smart("pears", None, None, None).unwrap();
        pantry.remove(a.id).unwrap();
        assert!(pantry.remove(a.id).is_err());
        assert_eq!(pantry.len(), 1);
        pantry.clear();
        assert!(pantry.is_empty());
    }

    #[test]
    fn find_loose_uses_pantry_order() {
        let mut pantry = PantryStore::default();
        pantry.add_smart("Green Onions", None, None, None).unwrap();
        pantry.add_smart("Onion", None, None, None).unwrap();
        assert_eq!(pantry.find_loose("onion").unwrap().name, "Green Onions");
        assert!(pantry.find_loose("saffron").is_none());
    }
}
