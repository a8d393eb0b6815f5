mod repo_types;
mod services;

pub use repo_types::{NewShoppingItem, ShoppingItem, ShoppingList};
pub use services::{ShoppingStore, DEFAULT_LIST_NAME};
