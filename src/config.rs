use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use uuid::Uuid;

const MIN_DEBOUNCE_MS: u64 = 500;
const MAX_DEBOUNCE_MS: u64 = 2000;

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    pub debounce_ms: u64,
}

impl SyncConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub sync: SyncConfig,
    pub local_state_dir: PathBuf,
    pub receipt_max_items: usize,
    pub chat_history_limit: usize,
    pub device_user_id: Option<Uuid>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sync: SyncConfig { debounce_ms: 1000 },
            local_state_dir: PathBuf::from(".pantrysync"),
            receipt_max_items: 20,
            chat_history_limit: 100,
            device_user_id: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let debounce_ms = std::env::var("SYNC_DEBOUNCE_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults.sync.debounce_ms)
            .clamp(MIN_DEBOUNCE_MS, MAX_DEBOUNCE_MS);
        let local_state_dir = std::env::var("LOCAL_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.local_state_dir);
        let receipt_max_items = std::env::var("RECEIPT_MAX_ITEMS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.receipt_max_items);
        let chat_history_limit = std::env::var("CHAT_HISTORY_LIMIT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults.chat_history_limit);
        let device_user_id = match std::env::var("DEVICE_USER_ID") {
            Ok(v) => Some(v.parse::<Uuid>()?),
            Err(_) => None,
        };
        Ok(Self {
            sync: SyncConfig { debounce_ms },
            local_state_dir,
            receipt_max_items,
            chat_history_limit,
            device_user_id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_sit_inside_debounce_window() {
        let cfg = AppConfig::default();
        assert!((MIN_DEBOUNCE_MS..=MAX_DEBOUNCE_MS).contains(&cfg.sync.debounce_ms));
        assert_eq!(cfg.sync.debounce(), Duration::from_secs(1));
        assert_eq!(cfg.receipt_max_items, 20);
    }
}
