mod repo_types;
mod services;

pub use repo_types::{MealPlanEntry, MealType};
pub use services::MealPlanStore;
