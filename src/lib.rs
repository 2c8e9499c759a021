mod cache;
mod catalog;
mod engine;
mod errors;
mod logging;
mod models;
mod predicate;
mod rank;
mod scheduler;
mod shuffle;

pub use cache::ResultCache;
pub use catalog::{CatalogProvider, CatalogStore, ChangeCallback, InMemoryCatalog};
pub use engine::QueryEngine;
pub use errors::{EngineError, EngineResult};
pub use logging::init_tracing;
pub use models::{
    CacheEntry, Category, CategoryFilter, DimensionKey, EngineSettings, Event, FilterSet,
    QueryRequest, QueryResponse, SortMode, Window,
};
pub use predicate::{matches, occurs_on};
pub use rank::rank;
pub use scheduler::{duration_until_next_midnight, MidnightScheduler};
pub use shuffle::{fisher_yates, shuffle_ids, window_seed, SeededRng};
