use crate::errors::{EngineError, EngineResult};
use crate::models::Event;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use uuid::Uuid;

pub type ChangeCallback = Arc<dyn Fn() + Send + Sync>;

/// Upstream catalog boundary. `snapshot` is the only data path; change
/// notifications arrive through `subscribe` callbacks, delivered
/// synchronously on whatever thread observes the change.
pub trait CatalogProvider: Send + Sync {
    fn snapshot(&self) -> EngineResult<Vec<Event>>;
    fn subscribe(&self, on_change: ChangeCallback) -> Uuid;
    fn unsubscribe(&self, id: Uuid);
}

/// Engine-side holder for the current event snapshot. Concurrent fetches
/// are resolved last-write-wins through a monotonic generation counter;
/// a stale in-flight fetch has its result discarded, never applied.
#[derive(Debug, Default)]
pub struct CatalogStore {
    events: RwLock<Arc<Vec<Event>>>,
    issued_generation: AtomicU64,
    applied_generation: AtomicU64,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<Vec<Event>> {
        self.events.read().expect("catalog store read lock").clone()
    }

    pub fn begin_fetch(&self) -> u64 {
        self.issued_generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Applies a completed fetch unless a newer one already landed.
    /// Returns whether the snapshot was replaced.
    pub fn complete_fetch(&self, generation: u64, events: Vec<Event>) -> bool {
        let mut guard = self.events.write().expect("catalog store write lock");
        if generation <= self.applied_generation.load(Ordering::Acquire) {
            tracing::debug!(generation, "discarding stale catalog fetch result");
            return false;
        }
        self.applied_generation.store(generation, Ordering::Release);
        *guard = Arc::new(events);
        true
    }
}

/// Catalog provider backed by an in-memory list, for embeddings that
/// already hold the records and for tests. `set_available(false)`
/// simulates an upstream outage.
#[derive(Default)]
pub struct InMemoryCatalog {
    events: RwLock<Vec<Event>>,
    subscribers: RwLock<HashMap<Uuid, ChangeCallback>>,
    unavailable: AtomicBool,
}

impl InMemoryCatalog {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events: RwLock::new(events),
            subscribers: RwLock::new(HashMap::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn set_events(&self, events: Vec<Event>) {
        {
            let mut guard = self.events.write().expect("catalog events write lock");
            *guard = events;
        }
        self.notify_changed();
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::Release);
    }

    fn notify_changed(&self) {
        let callbacks: Vec<ChangeCallback> = {
            let subscribers = self.subscribers.read().expect("subscriber read lock");
            subscribers.values().cloned().collect()
        };
        for callback in callbacks {
            callback();
        }
    }
}

impl CatalogProvider for InMemoryCatalog {
    fn snapshot(&self) -> EngineResult<Vec<Event>> {
        if self.unavailable.load(Ordering::Acquire) {
            return Err(EngineError::CatalogUnavailable(
                "upstream catalog fetch failed".to_string(),
            ));
        }
        Ok(self.events.read().expect("catalog events read lock").clone())
    }

    fn subscribe(&self, on_change: ChangeCallback) -> Uuid {
        let id = Uuid::new_v4();
        let mut subscribers = self.subscribers.write().expect("subscriber write lock");
        subscribers.insert(id, on_change);
        id
    }

    fn unsubscribe(&self, id: Uuid) {
        let mut subscribers = self.subscribers.write().expect("subscriber write lock");
        subscribers.remove(&id);
    }
}
