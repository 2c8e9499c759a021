use crate::cache::ResultCache;
use crate::catalog::{CatalogProvider, CatalogStore};
use crate::errors::EngineResult;
use crate::models::{
    DimensionKey, EngineSettings, Event, FilterSet, QueryRequest, QueryResponse, SortMode,
};
use crate::{predicate, rank, shuffle};
use chrono::{Local, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Public entry point combining predicate evaluation, ranking, and the
/// result cache. Cheap to clone; all state is shared.
#[derive(Clone)]
pub struct QueryEngine {
    provider: Arc<dyn CatalogProvider>,
    store: Arc<CatalogStore>,
    cache: Arc<ResultCache>,
    settings: EngineSettings,
}

impl QueryEngine {
    pub fn new(provider: Arc<dyn CatalogProvider>, settings: EngineSettings) -> Self {
        Self {
            provider,
            store: Arc::new(CatalogStore::new()),
            cache: Arc::new(ResultCache::new()),
            settings,
        }
    }

    /// Shared cache handle, e.g. for wiring up the midnight scheduler.
    pub fn cache(&self) -> Arc<ResultCache> {
        self.cache.clone()
    }

    /// Subscribes to catalog change notifications: each one re-fetches
    /// the snapshot and invalidates the cache, synchronously on the
    /// delivering thread. Returns the subscription id for teardown.
    pub fn connect(&self) -> Uuid {
        let cache = Arc::downgrade(&self.cache);
        let store = Arc::downgrade(&self.store);
        let provider = Arc::downgrade(&self.provider);
        self.provider.subscribe(Arc::new(move || {
            let (Some(cache), Some(store), Some(provider)) =
                (cache.upgrade(), store.upgrade(), provider.upgrade())
            else {
                return;
            };
            // refresh_catalog logs the failure; a change notification has
            // no caller to surface it to.
            let _ = refresh_catalog(&cache, &store, provider.as_ref());
        }))
    }

    pub fn disconnect(&self, subscription: Uuid) {
        self.provider.unsubscribe(subscription);
    }

    /// Fetches a fresh snapshot from the provider. On failure the last
    /// good snapshot keeps serving (stale-while-error) and the condition
    /// is surfaced for the caller to retry explicitly.
    pub fn refresh(&self) -> EngineResult<()> {
        refresh_catalog(&self.cache, &self.store, self.provider.as_ref())
    }

    pub fn query(&self, request: &QueryRequest) -> EngineResult<QueryResponse> {
        request.filters.window.validate()?;
        let today = request
            .today
            .unwrap_or_else(|| Local::now().date_naive());
        let snapshot = self.store.snapshot();
        let filters = &request.filters;
        let sort = request.sort;

        let (mut ordered, cache_hit) = if filters.search_term().is_some() {
            // Search results depend on free text, which is not part of
            // the dimension key; they bypass the cache entirely.
            (self.evaluate(&snapshot, filters, sort, today), false)
        } else {
            let key = DimensionKey::new(filters, sort);
            let epoch = self.cache.epoch();
            match self.cache.get(&key) {
                Some(ids) => (materialize(&snapshot, &ids), true),
                None => {
                    let ranked = self.evaluate(&snapshot, filters, sort, today);
                    let ids = ranked.iter().map(|event| event.id.clone()).collect();
                    self.cache.put(key, ids, epoch);
                    (ranked, false)
                }
            }
        };

        if let Some(day) = request.selected_day {
            ordered = bring_day_forward(ordered, day);
        }

        Ok(QueryResponse {
            events: ordered,
            cache_hit,
        })
    }

    fn evaluate(
        &self,
        snapshot: &[Event],
        filters: &FilterSet,
        sort: SortMode,
        today: NaiveDate,
    ) -> Vec<Event> {
        let matched: Vec<Event> = snapshot
            .iter()
            .filter(|event| predicate::matches(event, filters, today, &self.settings))
            .cloned()
            .collect();
        let seed = shuffle::window_seed(filters.window, &self.settings);
        let year_chronological =
            filters.window.is_year_scope() && sort == SortMode::Chronological;
        rank::rank(
            matched,
            sort,
            today,
            year_chronological,
            seed,
            Utc::now(),
            &self.settings,
        )
    }
}

/// Fetches through the generation counter and applies last-write-wins.
/// The cache epoch is bumped only after the new snapshot is in place:
/// a query racing the refetch caches its ordering under the old epoch,
/// which the bump then voids, so a changed catalog can never be pinned
/// behind a hit computed from the previous snapshot.
fn refresh_catalog(
    cache: &ResultCache,
    store: &CatalogStore,
    provider: &dyn CatalogProvider,
) -> EngineResult<()> {
    let generation = store.begin_fetch();
    match provider.snapshot() {
        Ok(events) => {
            if store.complete_fetch(generation, events) {
                cache.invalidate();
            }
            Ok(())
        }
        Err(err) => {
            tracing::warn!(error = %err, "catalog unavailable; serving last good snapshot");
            Err(err)
        }
    }
}

fn materialize(snapshot: &[Event], ids: &[String]) -> Vec<Event> {
    let by_id: HashMap<&str, &Event> = snapshot
        .iter()
        .map(|event| (event.id.as_str(), event))
        .collect();
    ids.iter()
        .filter_map(|id| by_id.get(id.as_str()).map(|event| (*event).clone()))
        .collect()
}

/// Stable bring-to-front: events occurring on the selected day come
/// first, with both groups keeping their ranked order. Computed fresh on
/// every call and never cached.
fn bring_day_forward(ordered: Vec<Event>, day: NaiveDate) -> Vec<Event> {
    let (mut matching, rest): (Vec<Event>, Vec<Event>) = ordered
        .into_iter()
        .partition(|event| predicate::occurs_on(event, day));
    matching.extend(rest);
    matching
}
