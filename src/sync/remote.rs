use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::debug;

use super::document::{DocKey, SyncedDocument};

/// Shared document store: read, field-level merge write, and live snapshots.
///
/// Dropping the receiver returned by [`RemoteStore::subscribe`] unsubscribes.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn get(&self, key: &DocKey) -> anyhow::Result<Option<SyncedDocument>>;
    async fn set(&self, key: &DocKey, patch: SyncedDocument) -> anyhow::Result<()>;
    async fn subscribe(&self, key: &DocKey) -> anyhow::Result<broadcast::Receiver<SyncedDocument>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct WriteRecord {
    pub key: DocKey,
    pub patch: SyncedDocument,
}

/// Process-local store with a write log and switchable failures.
pub struct InMemoryRemoteStore {
    docs: Mutex<HashMap<DocKey, SyncedDocument>>,
    channels: Mutex<HashMap<DocKey, broadcast::Sender<SyncedDocument>>>,
    writes: Mutex<Vec<WriteRecord>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    capacity: usize,
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self::new(64)
    }
}

impl InMemoryRemoteStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            docs: Mutex::new(HashMap::new()),
            channels: Mutex::new(HashMap::new()),
            writes: Mutex::new(Vec::new()),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            capacity: capacity.max(1),
        }
    }

    /// Puts a document in place without logging a write or notifying subscribers.
    pub fn seed(&self, key: DocKey, doc: SyncedDocument) {
        self.docs.lock().insert(key, doc);
    }

    pub fn document(&self, key: &DocKey) -> Option<SyncedDocument> {
        self.docs.lock().get(key).cloned()
    }

    pub fn writes(&self) -> Vec<WriteRecord> {
        self.writes.lock().clone()
    }

    pub fn writes_to(&self, key: &DocKey) -> Vec<WriteRecord> {
        self.writes
            .lock()
            .iter()
            .filter(|w| &w.key == key)
            .cloned()
            .collect()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn sender(&self, key: &DocKey) -> broadcast::Sender<SyncedDocument> {
        self.channels
            .lock()
            .entry(*key)
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn get(&self, key: &DocKey) -> anyhow::Result<Option<SyncedDocument>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            anyhow::bail!("read {}: store offline", key);
        }
        Ok(self.document(key))
    }

    async fn set(&self, key: &DocKey, patch: SyncedDocument) -> anyhow::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            anyhow::bail!("write {}: store offline", key);
        }
        self.writes.lock().push(WriteRecord {
            key: *key,
            patch: patch.clone(),
        });
        let snapshot = {
            let mut docs = self.docs.lock();
            let doc = docs.entry(*key).or_default();
            doc.merge(patch);
            doc.clone()
        };
        // No receivers is fine.
        let delivered = self.sender(key).send(snapshot).unwrap_or(0);
        debug!(%key, delivered, "remote set");
        Ok(())
    }

    async fn subscribe(&self, key: &DocKey) -> anyhow::Result<broadcast::Receiver<SyncedDocument>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            anyhow::bail!("subscribe {}: store offline", key);
        }
        Ok(self.sender(key).subscribe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn set_merges_and_notifies_subscribers() {
        let store = InMemoryRemoteStore::default();
        let key = DocKey::User(Uuid::new_v4());
        let mut rx = store.subscribe(&key).await.unwrap();

        store
            .set(&key, SyncedDocument { favorites: Some(vec!["a".into()]), ..Default::default() })
            .await
            .unwrap();
        store
            .set(&key, SyncedDocument { pantry: Some(vec![]), ..Default::default() })
            .await
            .unwrap();

        let _first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(second.favorites, Some(vec!["a".to_string()]));
        assert_eq!(second.pantry, Some(vec![]));
        assert_eq!(store.writes_to(&key).len(), 2);
    }

    #[tokio::test]
    async fn failures_are_reported() {
        let store = InMemoryRemoteStore::default();
        let key = DocKey::Household(Uuid::new_v4());
        store.set_fail_writes(true);
        assert!(store.set(&key, SyncedDocument::default()).await.is_err());
        assert!(store.writes().is_empty());
        store.set_fail_reads(true);
        assert!(store.get(&key).await.is_err());
    }
}
