use serde::{Deserialize, Serialize};

use crate::local::Namespace;
use crate::sync::SyncHandle;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPrefs {
    pub enabled: bool,
    pub expiry_alerts: bool,
    /// Items at or under this many days left are flagged.
    pub expiry_horizon_days: i64,
    pub meal_reminders: bool,
    /// Local wall-clock time, `HH:MM`.
    pub reminder_time: String,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            enabled: false,
            expiry_alerts: true,
            expiry_horizon_days: 2,
            meal_reminders: false,
            reminder_time: "17:00".into(),
        }
    }
}

#[derive(Default)]
pub struct SettingsStore {
    prefs: NotificationPrefs,
    sync: Option<SyncHandle>,
}

impl SettingsStore {
    pub fn new(sync: Option<SyncHandle>) -> Self {
        Self {
            prefs: NotificationPrefs::default(),
            sync,
        }
    }

    pub fn prefs(&self) -> &NotificationPrefs {
        &self.prefs
    }

    pub fn update<F: FnOnce(&mut NotificationPrefs)>(&mut self, edit: F) -> NotificationPrefs {
        edit(&mut self.prefs);
        self.prefs.expiry_horizon_days = self.prefs.expiry_horizon_days.clamp(0, 30);
        self.persist();
        self.prefs.clone()
    }

    pub fn replace_from_remote(&mut self, prefs: NotificationPrefs) {
        self.prefs = prefs;
    }

    fn persist(&self) {
        if let Some(sync) = &self.sync {
            sync.save_local(Namespace::NotificationPrefs, &self.prefs);
            sync.sync_settings(&self.prefs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_clamps_horizon() {
        let mut store = SettingsStore::default();
        let prefs = store.update(|p| {
            p.enabled = true;
            p.expiry_horizon_days = 400;
        });
        assert!(prefs.enabled);
        assert_eq!(prefs.expiry_horizon_days, 30);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let prefs: NotificationPrefs = serde_json::from_str(r#"{"enabled":true}"#).unwrap();
        assert!(prefs.enabled);
        assert_eq!(prefs.reminder_time, "17:00");
    }
}
