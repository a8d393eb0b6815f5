use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use time::OffsetDateTime;
use tracing::{debug, info};
use uuid::Uuid;

use super::repo_types::Household;
use crate::error::{AppError, Result};

pub const INVITE_CODE_LEN: usize = 6;
/// No 0/O or 1/I, so codes survive being read out loud.
pub const INVITE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Household membership. A user belongs to at most one household.
#[async_trait]
pub trait HouseholdDirectory: Send + Sync {
    async fn create_household(&self, owner_id: Uuid, name: &str) -> Result<Household>;
    /// `NotFound` for an unknown code, `Conflict` when already in a household.
    async fn join_household(&self, user_id: Uuid, invite_code: &str) -> Result<Household>;
    async fn leave_household(&self, user_id: Uuid) -> Result<()>;
    async fn get_household(&self, household_id: Uuid) -> Result<Option<Household>>;
    async fn get_user_household_id(&self, user_id: Uuid) -> Result<Option<Uuid>>;
    /// Owner only.
    async fn regenerate_invite_code(&self, user_id: Uuid, household_id: Uuid) -> Result<String>;
}

#[derive(Default)]
pub struct InMemoryHouseholdDirectory {
    households: Mutex<HashMap<Uuid, Household>>,
    offline: AtomicBool,
}

fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..INVITE_CODE_LEN)
        .map(|_| INVITE_ALPHABET[rng.gen_range(0..INVITE_ALPHABET.len())] as char)
        .collect()
}

fn unique_code(households: &HashMap<Uuid, Household>) -> String {
    loop {
        let code = generate_code();
        if !households.values().any(|h| h.invite_code == code) {
            return code;
        }
    }
}

fn membership(households: &HashMap<Uuid, Household>, user_id: Uuid) -> Option<Uuid> {
    households
        .values()
        .find(|h| h.is_member(user_id))
        .map(|h| h.id)
}

impl InMemoryHouseholdDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with `RemoteUnavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::RemoteUnavailable("household directory offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl HouseholdDirectory for InMemoryHouseholdDirectory {
    async fn create_household(&self, owner_id: Uuid, name: &str) -> Result<Household> {
        self.check_online()?;
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::validation("household name is required"));
        }
        let mut households = self.households.lock();
        if let Some(existing) = membership(&households, owner_id) {
            return Err(AppError::Conflict(format!(
                "user {} already belongs to household {}",
                owner_id, existing
            )));
        }
        let household = Household {
            id: Uuid::new_v4(),
            name: name.to_string(),
            owner_id,
            member_ids: vec![owner_id],
            invite_code: unique_code(&households),
            created_at: OffsetDateTime::now_utc(),
        };
        households.insert(household.id, household.clone());
        info!(household_id = %household.id, %owner_id, "household created");
        Ok(household)
    }

    async fn join_household(&self, user_id: Uuid, invite_code: &str) -> Result<Household> {
        self.check_online()?;
        let code = invite_code.trim().to_uppercase();
        let mut households = self.households.lock();
        let target = households
            .values()
            .find(|h| h.invite_code == code)
            .map(|h| h.id)
            .ok_or_else(|| AppError::not_found(format!("household with invite code {}", code)))?;
        if let Some(existing) = membership(&households, user_id) {
            return Err(AppError::Conflict(format!(
                "user {} already belongs to household {}",
                user_id, existing
            )));
        }
        let household = households
            .get_mut(&target)
            .ok_or_else(|| AppError::not_found(format!("household {}", target)))?;
        household.member_ids.push(user_id);
        info!(household_id = %household.id, %user_id, "joined household");
        Ok(household.clone())
    }

    async fn leave_household(&self, user_id: Uuid) -> Result<()> {
        self.check_online()?;
        let mut households = self.households.lock();
        let id = membership(&households, user_id)
            .ok_or_else(|| AppError::not_found(format!("household membership of {}", user_id)))?;
        let Some(household) = households.get_mut(&id) else {
            return Err(AppError::not_found(format!("household {}", id)));
        };
        household.member_ids.retain(|m| *m != user_id);
        if household.member_ids.is_empty() {
            households.remove(&id);
            info!(household_id = %id, "last member left; household removed");
            return Ok(());
        }
        if household.owner_id == user_id {
            household.owner_id = household.member_ids[0];
            debug!(household_id = %id, new_owner = %household.owner_id, "ownership handed over");
        }
        info!(household_id = %id, %user_id, "left household");
        Ok(())
    }

    async fn get_household(&self, household_id: Uuid) -> Result<Option<Household>> {
        self.check_online()?;
        Ok(self.households.lock().get(&household_id).cloned())
    }

    async fn get_user_household_id(&self, user_id: Uuid) -> Result<Option<Uuid>> {
        self.check_online()?;
        Ok(membership(&self.households.lock(), user_id))
    }

    async fn regenerate_invite_code(&self, user_id: Uuid, household_id: Uuid) -> Result<String> {
        self.check_online()?;
        let mut households = self.households.lock();
        let code = unique_code(&households);
        let household = households
            .get_mut(&household_id)
            .ok_or_else(|| AppError::not_found(format!("household {}", household_id)))?;
        if household.owner_id != user_id {
            return Err(AppError::Forbidden(
                "only the household owner can regenerate the invite code".into(),
            ));
        }
        household.invite_code = code.clone();
        debug!(%household_id, "invite code regenerated");
        Ok(code)
    }
}
