use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use serde::de::DeserializeOwned;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::chat::{ChatHistory, ChatMessage};
use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::household::{Household, HouseholdDirectory, InMemoryHouseholdDirectory};
use crate::local::{FileSnapshotStore, LocalSnapshotStore, MemorySnapshotStore, Namespace};
use crate::meal_plans::{MealPlanEntry, MealPlanStore};
use crate::pantry::{Ingredient, PantryStore};
use crate::recipes::{
    fetch_from_catalog, CatalogQuery, RecipeCatalog, RecipeStore, RecipesSnapshot,
};
use crate::settings::{NotificationPrefs, SettingsStore};
use crate::shopping::{ShoppingList, ShoppingStore};
use crate::sync::{
    DocKey, InMemoryRemoteStore, RemoteStore, SessionContext, SnapshotHandler, SyncEngine,
    SyncField, SyncHandle, SyncedDocument,
};

/// Every client-side collection, mutated together under one lock.
pub struct Stores {
    pub pantry: PantryStore,
    pub shopping: ShoppingStore,
    pub recipes: RecipeStore,
    pub meal_plans: MealPlanStore,
    pub settings: SettingsStore,
    pub chat: ChatHistory,
    sync: Option<SyncHandle>,
}

impl Default for Stores {
    fn default() -> Self {
        Self::new(None, AppConfig::default().chat_history_limit)
    }
}

fn decode_snapshot<T: DeserializeOwned>(
    local: &dyn LocalSnapshotStore,
    ns: Namespace,
) -> Option<T> {
    match local.load(ns) {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(namespace = ns.key(), error = %e, "local snapshot unreadable; skipped");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            let err = AppError::LocalStore(format!("{:#}", e));
            warn!(namespace = ns.key(), error = %err, "local snapshot load failed; skipped");
            None
        }
    }
}

impl Stores {
    pub fn new(sync: Option<SyncHandle>, chat_limit: usize) -> Self {
        Self {
            pantry: PantryStore::new(sync.clone()),
            shopping: ShoppingStore::new(sync.clone()),
            recipes: RecipeStore::new(sync.clone()),
            meal_plans: MealPlanStore::new(sync.clone()),
            settings: SettingsStore::new(sync.clone()),
            chat: ChatHistory::new(chat_limit, sync.clone()),
            sync,
        }
    }

    /// Restores each namespace from the device. Unreadable snapshots are skipped.
    pub fn restore_local(&mut self, local: &dyn LocalSnapshotStore) -> Vec<Namespace> {
        let mut restored = Vec::new();
        for ns in Namespace::ALL {
            let applied = match ns {
                Namespace::Pantry => decode_snapshot::<Vec<Ingredient>>(local, ns)
                    .map(|items| self.pantry.replace_from_remote(items)),
                Namespace::Shopping => decode_snapshot::<Vec<ShoppingList>>(local, ns)
                    .map(|lists| self.shopping.replace_from_remote(lists)),
                Namespace::Recipes => decode_snapshot::<RecipesSnapshot>(local, ns).map(|snap| {
                    self.recipes.replace_recipes_from_remote(snap.recipes);
                    self.recipes.replace_favorites_from_remote(snap.favorites);
                }),
                Namespace::MealPlans => decode_snapshot::<Vec<MealPlanEntry>>(local, ns)
                    .map(|entries| self.meal_plans.replace_from_remote(entries)),
                Namespace::Chat => decode_snapshot::<Vec<ChatMessage>>(local, ns)
                    .map(|messages| self.chat.restore(messages)),
                Namespace::NotificationPrefs => decode_snapshot::<NotificationPrefs>(local, ns)
                    .map(|prefs| self.settings.replace_from_remote(prefs)),
            };
            if applied.is_some() {
                restored.push(ns);
            }
        }
        restored
    }

    /// Overwrites every collection the snapshot holds; returns which ones.
    pub fn apply_remote(&mut self, doc: SyncedDocument) -> Vec<SyncField> {
        let fields = doc.fields();
        if let Some(items) = doc.pantry {
            self.pantry.replace_from_remote(items);
        }
        if let Some(lists) = doc.shopping_lists {
            self.shopping.replace_from_remote(lists);
        }
        if let Some(recipes) = doc.recipes {
            self.recipes.replace_recipes_from_remote(recipes);
        }
        if let Some(favorites) = doc.favorites {
            self.recipes.replace_favorites_from_remote(favorites);
        }
        if let Some(entries) = doc.meal_plans {
            self.meal_plans.replace_from_remote(entries);
        }
        if let Some(prefs) = doc.settings {
            self.settings.replace_from_remote(prefs);
        }
        self.save_local(&fields);
        fields
    }

    /// Login/join reconciliation: remote wins for fields it holds, and local collections
    /// it lacks are returned so they can be written up.
    pub fn merge_on_login(&mut self, doc: SyncedDocument) -> (Vec<SyncField>, Vec<SyncField>) {
        let reseed: Vec<SyncField> = SyncField::ALL
            .into_iter()
            .filter(|f| !doc.has(*f) && self.has_local(*f))
            .collect();
        let applied = self.apply_remote(doc);
        (applied, reseed)
    }

    fn has_local(&self, field: SyncField) -> bool {
        match field {
            SyncField::Pantry => !self.pantry.is_empty(),
            SyncField::ShoppingLists => !self.shopping.lists().is_empty(),
            SyncField::MealPlans => !self.meal_plans.entries().is_empty(),
            SyncField::Favorites => !self.recipes.favorite_ids().is_empty(),
            SyncField::Recipes => !self.recipes.recipes().is_empty(),
            SyncField::Settings => *self.settings.prefs() != NotificationPrefs::default(),
        }
    }

    /// Patch holding the current value of each of `fields`.
    pub fn document_for(&self, fields: &[SyncField]) -> SyncedDocument {
        let mut doc = SyncedDocument::default();
        for field in fields {
            match field {
                SyncField::Pantry => doc.pantry = Some(self.pantry.items().to_vec()),
                SyncField::ShoppingLists => {
                    doc.shopping_lists = Some(self.shopping.lists().to_vec())
                }
                SyncField::MealPlans => doc.meal_plans = Some(self.meal_plans.entries().to_vec()),
                SyncField::Favorites => doc.favorites = Some(self.recipes.favorite_ids().to_vec()),
                SyncField::Recipes => doc.recipes = Some(self.recipes.recipes().to_vec()),
                SyncField::Settings => doc.settings = Some(self.settings.prefs().clone()),
            }
        }
        doc
    }

    pub fn to_document(&self) -> SyncedDocument {
        self.document_for(&SyncField::ALL)
    }

    fn save_local(&self, fields: &[SyncField]) {
        let Some(sync) = &self.sync else {
            return;
        };
        for field in fields {
            match field {
                SyncField::Pantry => sync.save_local(Namespace::Pantry, self.pantry.items()),
                SyncField::ShoppingLists => {
                    sync.save_local(Namespace::Shopping, self.shopping.lists())
                }
                SyncField::MealPlans => {
                    sync.save_local(Namespace::MealPlans, self.meal_plans.entries())
                }
                SyncField::Favorites | SyncField::Recipes => {
                    sync.save_local(Namespace::Recipes, &self.recipes.snapshot())
                }
                SyncField::Settings => {
                    sync.save_local(Namespace::NotificationPrefs, self.settings.prefs())
                }
            }
        }
    }
}

/// Outcome of reading the routed document and reconciling it into the collections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HydrationReport {
    pub target: Option<DocKey>,
    pub applied: Vec<SyncField>,
    pub reseeded: Vec<SyncField>,
    /// The read failed; local state was kept as is.
    pub remote_unavailable: bool,
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub remote: Arc<dyn RemoteStore>,
    pub households: Arc<dyn HouseholdDirectory>,
    pub local: Arc<dyn LocalSnapshotStore>,
    pub context: Arc<SessionContext>,
    pub sync: SyncHandle,
    stores: Arc<Mutex<Stores>>,
}

impl AppState {
    /// Device-backed local snapshots; remote store and directory are process-local.
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let files = FileSnapshotStore::new(&config.local_state_dir)?;
        let local = Arc::new(files) as Arc<dyn LocalSnapshotStore>;
        let remote = Arc::new(InMemoryRemoteStore::default()) as Arc<dyn RemoteStore>;
        let households = Arc::new(InMemoryHouseholdDirectory::new()) as Arc<dyn HouseholdDirectory>;

        let state = Self::from_parts(config, remote, households, local);
        let restored = state.rehydrate_local();
        info!(restored = restored.len(), "local state restored");
        Ok(state)
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        remote: Arc<dyn RemoteStore>,
        households: Arc<dyn HouseholdDirectory>,
        local: Arc<dyn LocalSnapshotStore>,
    ) -> Self {
        let context = Arc::new(SessionContext::new());
        let sync = SyncEngine::new(
            remote.clone(),
            households.clone(),
            local.clone(),
            context.clone(),
            &config.sync,
        );
        let stores = Stores::new(Some(sync.clone()), config.chat_history_limit);
        Self {
            config,
            remote,
            households,
            local,
            context,
            sync,
            stores: Arc::new(Mutex::new(stores)),
        }
    }

    pub fn fake() -> Self {
        Self::from_parts(
            Arc::new(AppConfig::default()),
            Arc::new(InMemoryRemoteStore::default()),
            Arc::new(InMemoryHouseholdDirectory::new()),
            Arc::new(MemorySnapshotStore::new()),
        )
    }

    /// Locks the collections. The guard must not be held across an `.await`.
    pub fn stores(&self) -> MutexGuard<'_, Stores> {
        self.stores.lock()
    }

    pub fn with_stores<R>(&self, f: impl FnOnce(&mut Stores) -> R) -> R {
        f(&mut self.stores.lock())
    }

    /// Startup restore from the device, before any remote hydration.
    pub fn rehydrate_local(&self) -> Vec<Namespace> {
        let local = self.local.clone();
        self.with_stores(|s| s.restore_local(local.as_ref()))
    }

    fn snapshot_handler(&self) -> SnapshotHandler {
        let stores = Arc::downgrade(&self.stores);
        Arc::new(move |doc: SyncedDocument| {
            if let Some(stores) = stores.upgrade() {
                stores.lock().apply_remote(doc);
            }
        })
    }

    /// Reads the routed document, merges it into the collections, writes up what the
    /// document lacks, then follows it live.
    async fn reconcile(&self) -> HydrationReport {
        self.sync.unsubscribe();
        let mut report = HydrationReport::default();
        match self.sync.hydrate().await {
            Ok(Some((target, doc))) => {
                report.target = Some(target);
                let (applied, reseed) = self.with_stores(|s| s.merge_on_login(doc));
                report.applied = applied;
                if !reseed.is_empty() {
                    let patch = self.with_stores(|s| s.document_for(&reseed));
                    match self.sync.save_now(patch).await {
                        Ok(_) => report.reseeded = reseed,
                        Err(e) => warn!(error = %e, ?reseed, "re-seeding local collections failed"),
                    }
                }
            }
            Ok(None) => return report,
            Err(e) => {
                warn!(error = %e, "hydration failed; continuing with local state");
                report.remote_unavailable = true;
            }
        }
        match self.sync.subscribe(self.snapshot_handler()).await {
            Ok(key) => report.target = report.target.or(key),
            Err(e) => warn!(error = %e, "live subscription unavailable"),
        }
        info!(
            target = ?report.target,
            applied = ?report.applied,
            reseeded = ?report.reseeded,
            "session reconciled"
        );
        report
    }

    fn require_user(&self) -> Result<Uuid> {
        self.context
            .user_id()
            .ok_or_else(|| AppError::Forbidden("sign in required".into()))
    }

    #[instrument(skip(self))]
    pub async fn start_session(&self, user_id: Uuid) -> HydrationReport {
        self.sync.teardown();
        self.context.begin(user_id);
        match self.households.get_user_household_id(user_id).await {
            Ok(household_id) => self.context.prime(household_id),
            Err(e) => warn!(error = %e, "household lookup failed; routing resolves on first write"),
        }
        self.reconcile().await
    }

    #[instrument(skip(self))]
    pub async fn create_household(&self, name: &str) -> Result<(Household, HydrationReport)> {
        let user_id = self.require_user()?;
        let household = self.households.create_household(user_id, name).await?;
        self.context.set_household(household.id);
        let report = self.reconcile().await;
        Ok((household, report))
    }

    /// Joins by invite code. The household document wins; collections it does not hold
    /// yet are seeded from this device. The personal document is left as it was.
    #[instrument(skip(self))]
    pub async fn join_household(&self, invite_code: &str) -> Result<(Household, HydrationReport)> {
        let user_id = self.require_user()?;
        let household = self.households.join_household(user_id, invite_code).await?;
        self.context.set_household(household.id);
        let report = self.reconcile().await;
        Ok((household, report))
    }

    #[instrument(skip(self))]
    pub async fn leave_household(&self) -> Result<HydrationReport> {
        let user_id = self.require_user()?;
        self.households.leave_household(user_id).await?;
        self.context.clear_household();
        Ok(self.reconcile().await)
    }

    #[instrument(skip(self))]
    pub async fn regenerate_invite_code(&self) -> Result<String> {
        let user_id = self.require_user()?;
        let household_id = match self.context.household_id() {
            Some(id) => id,
            None => self
                .households
                .get_user_household_id(user_id)
                .await?
                .ok_or_else(|| {
                    AppError::not_found(format!("household membership of {}", user_id))
                })?,
        };
        self.households.regenerate_invite_code(user_id, household_id).await
    }

    /// Drops the subscription and any unflushed writes; collections stay on the device.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        self.sync.teardown();
        self.context.reset();
        info!("signed out");
    }

    /// Writes every collection to the routed document immediately.
    pub async fn save_all_now(&self) -> Result<Option<DocKey>> {
        let patch = self.with_stores(|s| s.to_document());
        self.sync.save_now(patch).await
    }

    /// Stores catalog results; an unusable catalog response imports nothing.
    pub async fn import_from_catalog(
        &self,
        catalog: &dyn RecipeCatalog,
        query: &CatalogQuery,
    ) -> Result<usize> {
        let recipes = fetch_from_catalog(catalog, query).await;
        if recipes.is_empty() {
            return Ok(0);
        }
        self.with_stores(|s| s.recipes.upsert_many(recipes))
    }
}
