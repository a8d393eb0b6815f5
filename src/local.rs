//! On-device snapshots, one independently namespaced value per collection.
//! They are restored at startup before any remote hydration.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use parking_lot::Mutex;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Pantry,
    Shopping,
    Recipes,
    MealPlans,
    Chat,
    NotificationPrefs,
}

impl Namespace {
    pub const ALL: [Namespace; 6] = [
        Namespace::Pantry,
        Namespace::Shopping,
        Namespace::Recipes,
        Namespace::MealPlans,
        Namespace::Chat,
        Namespace::NotificationPrefs,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Namespace::Pantry => "pantry-storage",
            Namespace::Shopping => "shopping-storage",
            Namespace::Recipes => "recipe-storage",
            Namespace::MealPlans => "meal-plan-storage",
            Namespace::Chat => "chat-storage",
            Namespace::NotificationPrefs => "notification-storage",
        }
    }
}

pub trait LocalSnapshotStore: Send + Sync {
    fn load(&self, ns: Namespace) -> anyhow::Result<Option<Value>>;
    fn save(&self, ns: Namespace, value: &Value) -> anyhow::Result<()>;
}

/// `<dir>/<namespace>.json` files.
pub struct FileSnapshotStore {
    dir: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl AsRef<Path>) -> anyhow::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        Ok(Self { dir })
    }

    fn path(&self, ns: Namespace) -> PathBuf {
        self.dir.join(format!("{}.json", ns.key()))
    }
}

impl LocalSnapshotStore for FileSnapshotStore {
    fn load(&self, ns: Namespace) -> anyhow::Result<Option<Value>> {
        let path = self.path(ns);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        let value =
            serde_json::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
        Ok(Some(value))
    }

    fn save(&self, ns: Namespace, value: &Value) -> anyhow::Result<()> {
        let path = self.path(ns);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(value)?)
            .with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &path).with_context(|| format!("rename to {}", path.display()))?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemorySnapshotStore {
    slots: Mutex<HashMap<Namespace, Value>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalSnapshotStore for MemorySnapshotStore {
    fn load(&self, ns: Namespace) -> anyhow::Result<Option<Value>> {
        Ok(self.slots.lock().get(&ns).cloned())
    }

    fn save(&self, ns: Namespace, value: &Value) -> anyhow::Result<()> {
        self.slots.lock().insert(ns, value.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn file_store_round_trips_per_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path()).unwrap();
        assert!(store.load(Namespace::Pantry).unwrap().is_none());

        store.save(Namespace::Pantry, &json!([{"name": "rice"}])).unwrap();
        store.save(Namespace::Chat, &json!([])).unwrap();
        assert_eq!(
            store.load(Namespace::Pantry).unwrap(),
            Some(json!([{"name": "rice"}]))
        );
        assert!(dir.path().join("pantry-storage.json").exists());
        assert_eq!(store.load(Namespace::Chat).unwrap(), Some(json!([])));
    }

    #[test]
    fn corrupt_file_is_an_error_not_a_panic() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("recipe-storage.json"), "{not json").unwrap();
        let store = FileSnapshotStore::new(dir.path()).unwrap();
        assert!(store.load(Namespace::Recipes).is_err());
    }
}
