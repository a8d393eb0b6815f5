use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use super::repo_types::{NewShoppingItem, ShoppingItem, ShoppingList};
use crate::error::{AppError, Result};
use crate::local::Namespace;
use crate::matching;
use crate::sync::SyncHandle;

pub const DEFAULT_LIST_NAME: &str = "Shopping List";

/// Named shopping lists; at most one is active and receives default additions.
#[derive(Default)]
pub struct ShoppingStore {
    lists: Vec<ShoppingList>,
    sync: Option<SyncHandle>,
}

impl ShoppingStore {
    pub fn new(sync: Option<SyncHandle>) -> Self {
        Self {
            lists: Vec::new(),
            sync,
        }
    }

    pub fn lists(&self) -> &[ShoppingList] {
        &self.lists
    }

    pub fn list(&self, list_id: Uuid) -> Option<&ShoppingList> {
        self.lists.iter().find(|l| l.id == list_id)
    }

    pub fn active_list(&self) -> Option<&ShoppingList> {
        self.lists.iter().find(|l| l.is_active)
    }

    /// Creates a list; the first list created becomes the active one.
    pub fn create_list(&mut self, name: &str) -> Result<Uuid> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("list name is required"));
        }
        let list = ShoppingList {
            id: Uuid::new_v4(),
            name: name.to_string(),
            items: Vec::new(),
            created_at: OffsetDateTime::now_utc(),
            is_active: self.active_list().is_none(),
        };
        let id = list.id;
        self.lists.push(list);
        self.persist();
        Ok(id)
    }

    pub fn set_active_list(&mut self, list_id: Uuid) -> Result<()> {
        if self.list(list_id).is_none() {
            return Err(AppError::not_found(format!("shopping list {}", list_id)));
        }
        for list in &mut self.lists {
            list.is_active = list.id == list_id;
        }
        self.persist();
        Ok(())
    }

    /// Deletes a list; if it was active, the oldest remaining list takes over.
    pub fn delete_list(&mut self, list_id: Uuid) -> Result<ShoppingList> {
        let idx = self
            .lists
            .iter()
            .position(|l| l.id == list_id)
            .ok_or_else(|| AppError::not_found(format!("shopping list {}", list_id)))?;
        let removed = self.lists.remove(idx);
        if removed.is_active {
            if let Some(first) = self.lists.first_mut() {
                first.is_active = true;
            }
        }
        self.persist();
        Ok(removed)
    }

    pub fn add_item(&mut self, list_id: Uuid, new: NewShoppingItem) -> Result<ShoppingItem> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("item name is required"));
        }
        if !new.quantity.is_finite() || new.quantity < 0.0 {
            return Err(AppError::validation("quantity must be a non-negative number"));
        }
        let item = ShoppingItem {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: new.category,
            quantity: new.quantity,
            unit: new.unit,
            checked: false,
            estimated_price: new.estimated_price,
            recipe_id: new.recipe_id,
        };
        let list = self.list_mut(list_id)?;
        list.items.push(item.clone());
        debug!(list_id = %list_id, name = %item.name, "shopping add");
        self.persist();
        Ok(item)
    }

    /// Adds to the active list, creating a default list on first use.
    pub fn add_to_active(&mut self, new: NewShoppingItem) -> Result<ShoppingItem> {
        let list_id = match self.active_list() {
            Some(list) => list.id,
            None => match self.lists.first().map(|l| l.id) {
                Some(id) => {
                    self.set_active_list(id)?;
                    id
                }
                None => self.create_list(DEFAULT_LIST_NAME)?,
            },
        };
        self.add_item(list_id, new)
    }

    pub fn toggle_checked(&mut self, list_id: Uuid, item_id: Uuid) -> Result<bool> {
        let item = self.item_mut(list_id, item_id)?;
        item.checked = !item.checked;
        let checked = item.checked;
        self.persist();
        Ok(checked)
    }

    pub fn remove_item(&mut self, list_id: Uuid, item_id: Uuid) -> Result<ShoppingItem> {
        let list = self.list_mut(list_id)?;
        let idx = list
            .items
            .iter()
            .position(|i| i.id == item_id)
            .ok_or_else(|| AppError::not_found(format!("shopping item {}", item_id)))?;
        let removed = list.items.remove(idx);
        self.persist();
        Ok(removed)
    }

    /// Checks off the first unchecked item on the active list that loosely matches `name`.
    ///
    /// Lenient on purpose: a wrongly checked item costs one tap to undo. Returns the
    /// id of the item that was checked, or `None` when nothing matched.
    pub fn check_item_if_exists(&mut self, name: &str) -> Option<Uuid> {
        let list = self.lists.iter_mut().find(|l| l.is_active)?;
        let item = list
            .items
            .iter_mut()
            .filter(|i| !i.checked)
            .find(|i| matching::loose_match(&i.name, name))?;
        item.checked = true;
        let id = item.id;
        info!(item = %item.name, bought = %name, "shopping item reconciled");
        self.persist();
        Some(id)
    }

    pub fn clear_checked_items(&mut self, list_id: Uuid) -> Result<usize> {
        let list = self.list_mut(list_id)?;
        let before = list.items.len();
        list.items.retain(|i| !i.checked);
        let removed = before - list.items.len();
        self.persist();
        Ok(removed)
    }

    pub fn clear_all_items(&mut self, list_id: Uuid) -> Result<usize> {
        let list = self.list_mut(list_id)?;
        let removed = list.items.len();
        list.items.clear();
        self.persist();
        Ok(removed)
    }

    pub fn replace_from_remote(&mut self, lists: Vec<ShoppingList>) {
        self.lists = lists;
        self.enforce_single_active();
    }

    fn enforce_single_active(&mut self) {
        let mut seen = false;
        for list in &mut self.lists {
            if list.is_active {
                if seen {
                    list.is_active = false;
                }
                seen = true;
            }
        }
    }

    fn list_mut(&mut self, list_id: Uuid) -> Result<&mut ShoppingList> {
        self.lists
            .iter_mut()
            .find(|l| l.id == list_id)
            .ok_or_else(|| AppError::not_found(format!("shopping list {}", list_id)))
    }

    fn item_mut(&mut self, list_id: Uuid, item_id: Uuid) -> Result<&mut ShoppingItem> {
        self.list_mut(list_id)?
            .items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| AppError::not_found(format!("shopping item {}", item_id)))
    }

    fn persist(&self) {
        if let Some(sync) = &self.sync {
            sync.save_local(Namespace::Shopping, &self.lists);
            sync.sync_shopping_lists(&self.lists);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ShoppingCategory;

    fn store_with(items: &[&str]) -> (ShoppingStore, Uuid) {
        let mut store = ShoppingStore::default();
        let list = store.create_list("Weekly").unwrap();
        for name in items {
            store.add_item(list, NewShoppingItem::named(*name)).unwrap();
        }
        (store, list)
    }

    #[test]
    fn first_list_is_active_and_only_one_stays_active() {
        let mut store = ShoppingStore::default();
        let a = store.create_list("A").unwrap();
        let b = store.create_list("B").unwrap();
        assert_eq!(store.active_list().unwrap().id, a);
        store.set_active_list(b).unwrap();
        assert_eq!(store.lists().iter().filter(|l| l.is_active).count(), 1);
        assert_eq!(store.active_list().unwrap().id, b);
        assert!(matches!(
            store.set_active_list(Uuid::new_v4()),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn add_to_active_creates_default_list() {
        let mut store = ShoppingStore::default();
        let item = store
            .add_to_active(NewShoppingItem::named("Bread").with_category(ShoppingCategory::Bakery))
            .unwrap();
        let active = store.active_list().unwrap();
        assert_eq!(active.name, DEFAULT_LIST_NAME);
        assert_eq!(active.items[0].id, item.id);
        assert!(!item.checked);
    }

    #[test]
    fn check_item_if_exists_matches_loosely_on_active_list() {
        let (mut store, list) = store_with(&["Milk", "Eggs"]);
        let checked = store.check_item_if_exists("milk, 2%").unwrap();
        let items = &store.list(list).unwrap().items;
        assert_eq!(items[0].id, checked);
        assert!(items[0].checked);
        assert!(!items[1].checked);
    }

    #[test]
    fn check_item_if_exists_skips_checked_and_picks_first() {
        let (mut store, list) = store_with(&["Red Onion", "Onion"]);
        let first = store.check_item_if_exists("onion").unwrap();
        let second = store.check_item_if_exists("onion").unwrap();
        let items = &store.list(list).unwrap().items;
        assert_eq!(first, items[0].id);
        assert_eq!(second, items[1].id);
        assert_eq!(store.check_item_if_exists("onion"), None);
    }

    #[test]
    fn check_item_if_exists_ignores_inactive_lists_and_blank_names() {
        let (mut store, _) = store_with(&["Milk"]);
        assert_eq!(store.check_item_if_exists(""), None);
        let other = store.create_list("Party").unwrap();
        store.set_active_list(other).unwrap();
        assert_eq!(store.check_item_if_exists("milk"), None);
    }

    #[test]
    fn toggle_remove_and_clear() {
        let (mut store, list) = store_with(&["Apples", "Flour", "Soap"]);
        let ids: Vec<_> = store.list(list).unwrap().items.iter().map(|i| i.id).collect();
        assert!(store.toggle_checked(list, ids[0]).unwrap());
        assert!(store.toggle_checked(list, ids[1]).unwrap());
        assert!(!store.toggle_checked(list, ids[1]).unwrap());
        assert_eq!(store.clear_checked_items(list).unwrap(), 1);
        store.remove_item(list, ids[2]).unwrap();
        assert_eq!(store.clear_all_items(list).unwrap(), 1);
        assert!(store.list(list).unwrap().items.is_empty());
    }

    #[test]
    fn deleting_active_list_promotes_next() {
        let mut store = ShoppingStore::default();
        let a = store.create_list("A").unwrap();
        let b = store.create_list("B").unwrap();
        store.delete_list(a).unwrap();
        assert_eq!(store.active_list().unwrap().id, b);
    }
}
