mod debounce;
mod document;
mod engine;
mod remote;
mod routing;

use std::sync::Arc;

pub use debounce::Debouncer;
pub use document::{DocKey, SyncField, SyncedDocument};
pub use engine::{SnapshotHandler, SyncEngine};
pub use remote::{InMemoryRemoteStore, RemoteStore, WriteRecord};
pub use routing::{Routing, SessionContext};

/// Shared by every collection store; cloning is cheap.
pub type SyncHandle = Arc<SyncEngine>;
