use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

struct Pending {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Trailing-edge scheduler: per key, only the most recent job runs, once the
/// window has passed with no newer job scheduled for that key.
pub struct Debouncer<K> {
    window: Duration,
    pending: Arc<Mutex<HashMap<K, Pending>>>,
    next_generation: AtomicU64,
}

impl<K> Debouncer<K>
where
    K: Copy + Eq + Hash + Send + std::fmt::Debug + 'static,
{
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Replaces any job already waiting for `key`. Returns false when there is no
    /// runtime to run it on.
    pub fn schedule<F>(&self, key: K, job: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            warn!(?key, "no async runtime; write dropped");
            return false;
        };
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let window = self.window;
        let pending = Arc::clone(&self.pending);

        let mut slots = self.pending.lock();
        let handle = runtime.spawn(async move {
            tokio::time::sleep(window).await;
            let claimed = {
                let mut slots = pending.lock();
                match slots.get(&key) {
                    Some(p) if p.generation == generation => {
                        slots.remove(&key);
                        true
                    }
                    _ => false,
                }
            };
            if claimed {
                trace!(?key, "debounce window elapsed");
                job.await;
            }
        });
        if let Some(previous) = slots.insert(key, Pending { generation, handle }) {
            previous.handle.abort();
        }
        true
    }

    /// Drops the waiting job for `key`, if any. Returns whether one was waiting.
    pub fn cancel(&self, key: &K) -> bool {
        match self.pending.lock().remove(key) {
            Some(p) => {
                p.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) {
        for (_, p) in self.pending.lock().drain() {
            p.handle.abort();
        }
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.lock().contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

impl<K> Drop for Debouncer<K> {
    fn drop(&mut self) {
        for (_, p) in self.pending.lock().drain() {
            p.handle.abort();
        }
    }
}
