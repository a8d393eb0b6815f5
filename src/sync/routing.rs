use parking_lot::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use super::document::DocKey;
use crate::error::{AppError, Result};
use crate::household::HouseholdDirectory;

/// Cached answer to "which document do this user's writes go to".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    /// Never populated, or cleared; the next resolve does one directory lookup.
    Unresolved,
    Personal,
    Household(Uuid),
}

#[derive(Debug)]
struct Inner {
    user_id: Option<Uuid>,
    routing: Routing,
}

/// Session-scoped routing context shared by every sync call.
///
/// Single writer (session bootstrap and household join/leave/logout), many readers.
#[derive(Debug)]
pub struct SessionContext {
    session_id: Uuid,
    inner: RwLock<Inner>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            inner: RwLock::new(Inner {
                user_id: None,
                routing: Routing::Unresolved,
            }),
        }
    }

    /// Tag stamped on our writes so their echoes can be told apart from other writers.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.inner.read().user_id
    }

    pub fn routing(&self) -> Routing {
        self.inner.read().routing
    }

    pub fn household_id(&self) -> Option<Uuid> {
        match self.routing() {
            Routing::Household(id) => Some(id),
            _ => None,
        }
    }

    /// Starts a signed-in session; routing stays unresolved until primed or looked up.
    pub fn begin(&self, user_id: Uuid) {
        let mut inner = self.inner.write();
        inner.user_id = Some(user_id);
        inner.routing = Routing::Unresolved;
    }

    /// Populates the cache from the bootstrap lookup.
    pub fn prime(&self, household_id: Option<Uuid>) {
        self.inner.write().routing = match household_id {
            Some(id) => Routing::Household(id),
            None => Routing::Personal,
        };
    }

    pub fn set_household(&self, household_id: Uuid) {
        info!(%household_id, "routing to household document");
        self.inner.write().routing = Routing::Household(household_id);
    }

    pub fn clear_household(&self) {
        info!("routing to personal document");
        self.inner.write().routing = Routing::Personal;
    }

    /// Signs out: no user, nothing cached.
    pub fn reset(&self) {
        let mut inner = self.inner.write();
        inner.user_id = None;
        inner.routing = Routing::Unresolved;
    }

    /// Current target document, or `None` for a guest with no account.
    ///
    /// An unresolved cache costs one directory lookup, whose answer is cached unless a
    /// join/leave changed the routing while the lookup was in flight.
    pub async fn resolve(&self, households: &dyn HouseholdDirectory) -> Result<Option<DocKey>> {
        let (user_id, routing) = {
            let inner = self.inner.read();
            (inner.user_id, inner.routing)
        };
        let Some(user_id) = user_id else {
            return Ok(None);
        };
        let routing = match routing {
            Routing::Unresolved => {
                debug!(%user_id, "routing cache cold; looking up household");
                let household = households
                    .get_user_household_id(user_id)
                    .await
                    .map_err(|e| match e {
                        AppError::RemoteUnavailable(_) => e,
                        other => AppError::RemoteUnavailable(other.to_string()),
                    })?;
                let mut inner = self.inner.write();
                if inner.user_id == Some(user_id) && inner.routing == Routing::Unresolved {
                    inner.routing = match household {
                        Some(id) => Routing::Household(id),
                        None => Routing::Personal,
                    };
                }
                inner.routing
            }
            cached => cached,
        };
        Ok(Some(match routing {
            Routing::Household(id) => DocKey::Household(id),
            Routing::Personal | Routing::Unresolved => DocKey::User(user_id),
        }))
    }
}
