//! Pure name heuristics shared by every ingestion path: category, unit and shelf life.

mod category;
pub mod expiry;
mod units;

pub use category::{classify, Category, ShoppingCategory};
pub use units::{suggest_unit, units_for_category};
