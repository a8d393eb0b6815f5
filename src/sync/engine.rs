use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use super::debounce::Debouncer;
use super::document::{DocKey, SyncField, SyncedDocument};
use super::remote::RemoteStore;
use super::routing::SessionContext;
use crate::config::SyncConfig;
use crate::error::{AppError, Result};
use crate::household::HouseholdDirectory;
use crate::local::{LocalSnapshotStore, Namespace};
use crate::meal_plans::MealPlanEntry;
use crate::pantry::Ingredient;
use crate::recipes::Recipe;
use crate::settings::NotificationPrefs;
use crate::shopping::ShoppingList;

/// Receives remote snapshots written by someone other than this session.
pub type SnapshotHandler = Arc<dyn Fn(SyncedDocument) + Send + Sync>;

/// Debounced write-through from the collections to the routed remote document,
/// plus local snapshot persistence and the live subscription.
pub struct SyncEngine {
    weak_self: Weak<SyncEngine>,
    remote: Arc<dyn RemoteStore>,
    households: Arc<dyn HouseholdDirectory>,
    local: Arc<dyn LocalSnapshotStore>,
    context: Arc<SessionContext>,
    debouncer: Debouncer<SyncField>,
    subscription: Mutex<Option<JoinHandle<()>>>,
    /// Last value seen in the routed document per field, read or written.
    known: Mutex<HashMap<SyncField, Value>>,
    /// Own writes sent while subscribed whose echo has not come back yet, oldest first.
    unechoed: Mutex<VecDeque<(u64, Vec<SyncField>)>>,
    next_write: AtomicU64,
}

impl SyncEngine {
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        households: Arc<dyn HouseholdDirectory>,
        local: Arc<dyn LocalSnapshotStore>,
        context: Arc<SessionContext>,
        config: &SyncConfig,
    ) -> Arc<Self> {
        let window = config.debounce();
        Arc::new_cyclic(|weak_self| Self {
            weak_self: weak_self.clone(),
            remote,
            households,
            local,
            context,
            debouncer: Debouncer::new(window),
            subscription: Mutex::new(None),
            known: Mutex::new(HashMap::new()),
            unechoed: Mutex::new(VecDeque::new()),
            next_write: AtomicU64::new(0),
        })
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    pub fn local(&self) -> &Arc<dyn LocalSnapshotStore> {
        &self.local
    }

    /// Writes a collection's local snapshot. Failures are logged; the in-memory state stands.
    pub fn save_local<T: Serialize + ?Sized>(&self, ns: Namespace, value: &T) {
        let value = match serde_json::to_value(value) {
            Ok(v) => v,
            Err(e) => {
                warn!(namespace = ns.key(), error = %e, "local snapshot not serializable");
                return;
            }
        };
        if let Err(e) = self.local.save(ns, &value) {
            let err = AppError::LocalStore(format!("{:#}", e));
            warn!(namespace = ns.key(), error = %err, "local snapshot save failed");
        }
    }

    pub fn sync_pantry(&self, items: &[Ingredient]) {
        self.schedule(
            SyncField::Pantry,
            SyncedDocument {
                pantry: Some(items.to_vec()),
                ..Default::default()
            },
        );
    }

    pub fn sync_shopping_lists(&self, lists: &[ShoppingList]) {
        self.schedule(
            SyncField::ShoppingLists,
            SyncedDocument {
                shopping_lists: Some(lists.to_vec()),
                ..Default::default()
            },
        );
    }

    pub fn sync_meal_plans(&self, entries: &[MealPlanEntry]) {
        self.schedule(
            SyncField::MealPlans,
            SyncedDocument {
                meal_plans: Some(entries.to_vec()),
                ..Default::default()
            },
        );
    }

    pub fn sync_favorites(&self, ids: &[String]) {
        self.schedule(
            SyncField::Favorites,
            SyncedDocument {
                favorites: Some(ids.to_vec()),
                ..Default::default()
            },
        );
    }

    pub fn sync_recipes(&self, recipes: &[Recipe]) {
        self.schedule(
            SyncField::Recipes,
            SyncedDocument {
                recipes: Some(recipes.to_vec()),
                ..Default::default()
            },
        );
    }

    pub fn sync_settings(&self, prefs: &NotificationPrefs) {
        self.schedule(
            SyncField::Settings,
            SyncedDocument {
                settings: Some(prefs.clone()),
                ..Default::default()
            },
        );
    }

    pub fn is_pending(&self, field: SyncField) -> bool {
        self.debouncer.is_pending(&field)
    }

    pub fn cancel_pending(&self, field: SyncField) -> bool {
        self.debouncer.cancel(&field)
    }

    fn schedule(&self, field: SyncField, patch: SyncedDocument) {
        if self.context.user_id().is_none() {
            trace!(?field, "guest session; remote sync skipped");
            return;
        }
        let engine = self.weak_self.clone();
        self.debouncer.schedule(field, async move {
            if let Some(engine) = engine.upgrade() {
                engine.write_logged(field, patch).await;
            }
        });
    }

    async fn write_logged(&self, field: SyncField, patch: SyncedDocument) {
        match self.write(patch).await {
            Ok(Some(key)) => debug!(?field, %key, "debounced write flushed"),
            Ok(None) => trace!(?field, "signed out before flush; write dropped"),
            Err(e) => warn!(?field, error = %e, "remote write failed; keeping local state"),
        }
    }

    /// Resolves the target now and merges `patch` into it.
    async fn write(&self, mut patch: SyncedDocument) -> Result<Option<DocKey>> {
        let Some(key) = self.context.resolve(self.households.as_ref()).await? else {
            return Ok(None);
        };
        patch.last_synced = Some(OffsetDateTime::now_utc());
        patch.last_writer = Some(self.context.session_id());
        let fields = patch.fields();
        let write_id = self.next_write.fetch_add(1, Ordering::Relaxed);
        if self.subscription.lock().is_some() {
            self.unechoed.lock().push_back((write_id, fields.clone()));
        }
        if let Err(e) = self.remote.set(&key, patch.clone()).await {
            self.unechoed.lock().retain(|(id, _)| *id != write_id);
            return Err(AppError::remote(e.context(format!("set {}", key))));
        }
        self.remember(&patch);
        trace!(%key, ?fields, "remote set");
        Ok(Some(key))
    }

    /// Immediate write, superseding any debounced write waiting for the same fields.
    pub async fn save_now(&self, patch: SyncedDocument) -> Result<Option<DocKey>> {
        for field in patch.fields() {
            self.debouncer.cancel(&field);
        }
        self.write(patch).await
    }

    /// One full read of the routed document. A document that does not exist yet reads
    /// as empty. Waiting writes for the fields it holds are dropped since its values win.
    pub async fn hydrate(&self) -> Result<Option<(DocKey, SyncedDocument)>> {
        let Some(key) = self.context.resolve(self.households.as_ref()).await? else {
            return Ok(None);
        };
        let doc = self
            .remote
            .get(&key)
            .await
            .map_err(|e| AppError::remote(e.context(format!("get {}", key))))?
            .unwrap_or_default();
        for field in doc.fields() {
            self.debouncer.cancel(&field);
        }
        self.known.lock().clear();
        self.remember(&doc);
        info!(%key, fields = ?doc.fields(), "hydrated from remote");
        Ok(Some((key, doc)))
    }

    /// Records what the routed document now holds for each field present in `doc`.
    fn remember(&self, doc: &SyncedDocument) {
        let mut known = self.known.lock();
        for field in doc.fields() {
            if let Some(value) = doc.field_value(field) {
                known.insert(field, value);
            }
        }
    }

    /// Drops the fields whose value is the one this session last saw remotely, and the
    /// fields an own write still on its way will overwrite.
    fn changed_only(&self, mut doc: SyncedDocument) -> SyncedDocument {
        let unechoed = self.unechoed.lock();
        let mut known = self.known.lock();
        for field in doc.fields() {
            if unechoed.iter().any(|(_, fields)| fields.contains(&field)) {
                doc.clear(field);
                continue;
            }
            match doc.field_value(field) {
                Some(value) if known.get(&field) == Some(&value) => doc.clear(field),
                Some(value) => {
                    known.insert(field, value);
                }
                None => {}
            }
        }
        doc
    }

    /// Hands the changed fields of a snapshot to `on_snapshot`. Waiting writes are
    /// dropped only for those fields; the rest still fire.
    fn deliver(&self, key: DocKey, doc: SyncedDocument, on_snapshot: &SnapshotHandler) {
        let changes = self.changed_only(doc);
        let fields = changes.fields();
        if fields.is_empty() {
            trace!(%key, "snapshot holds nothing new");
            return;
        }
        for field in &fields {
            self.debouncer.cancel(field);
        }
        debug!(%key, ?fields, "remote snapshot applied");
        on_snapshot(changes);
    }

    /// Re-reads the document and delivers whatever moved since it was last seen.
    async fn catch_up(&self, key: DocKey, on_snapshot: &SnapshotHandler) {
        match self.remote.get(&key).await {
            Ok(Some(doc)) => self.deliver(key, doc, on_snapshot),
            Ok(None) => {}
            Err(e) => {
                let err = AppError::remote(e.context(format!("get {}", key)));
                warn!(error = %err, "catch-up read failed; waiting for next snapshot");
            }
        }
    }

    /// Opens the live subscription on the routed document, replacing any previous one.
    /// Changes written between the last read and the subscription opening are picked
    /// up by one read made once the receiver exists.
    pub async fn subscribe(&self, on_snapshot: SnapshotHandler) -> Result<Option<DocKey>> {
        self.unsubscribe();
        let Some(key) = self.context.resolve(self.households.as_ref()).await? else {
            return Ok(None);
        };
        let mut rx = self
            .remote
            .subscribe(&key)
            .await
            .map_err(|e| AppError::remote(e.context(format!("subscribe {}", key))))?;
        self.catch_up(key, &on_snapshot).await;

        let session = self.context.session_id();
        let engine = self.weak_self.clone();
        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(doc) if doc.last_writer == Some(session) => {
                        let Some(engine) = engine.upgrade() else {
                            break;
                        };
                        engine.unechoed.lock().pop_front();
                        trace!(%key, "own echo ignored");
                    }
                    Ok(doc) => {
                        let Some(engine) = engine.upgrade() else {
                            break;
                        };
                        engine.deliver(key, doc, &on_snapshot);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(%key, skipped, "subscription lagged; re-reading document");
                        let Some(engine) = engine.upgrade() else {
                            break;
                        };
                        engine.unechoed.lock().clear();
                        engine.catch_up(key, &on_snapshot).await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        *self.subscription.lock() = Some(handle);
        info!(%key, "subscribed");
        Ok(Some(key))
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription
            .lock()
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    pub fn unsubscribe(&self) {
        if let Some(handle) = self.subscription.lock().take() {
            handle.abort();
            self.unechoed.lock().clear();
            debug!("subscription closed");
        }
    }

    /// Stops everything tied to the current target: the subscription, any waiting
    /// writes and the record of what the target held.
    pub fn teardown(&self) {
        self.unsubscribe();
        self.debouncer.cancel_all();
        self.known.lock().clear();
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        if let Some(handle) = self.subscription.get_mut().take() {
            handle.abort();
        }
    }
}
