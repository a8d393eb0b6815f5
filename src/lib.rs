pub mod ai;
pub mod chat;
pub mod classify;
pub mod config;
pub mod coordinator;
pub mod dates;
pub mod error;
pub mod household;
pub mod ingest;
pub mod local;
pub mod matching;
pub mod meal_plans;
pub mod pantry;
pub mod recipes;
pub mod settings;
pub mod shopping;
pub mod state;
pub mod sync;

pub use error::{AppError, Result};
pub use state::{AppState, HydrationReport, Stores};
