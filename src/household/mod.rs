mod repo_types;
mod services;

pub use repo_types::Household;
pub use services::{
    HouseholdDirectory, InMemoryHouseholdDirectory, INVITE_ALPHABET, INVITE_CODE_LEN,
};
