//! Search orchestration: normalization, cache lookup, spatial fan-out,
//! enrichment, and dynamic-TTL cache writes.

pub mod enrichment;
pub mod error;
pub mod orchestrator;
pub mod store;

pub use enrichment::ResultEnricher;
pub use error::{SearchError, SearchResult};
pub use orchestrator::{CachedPage, SearchOrchestrator, SearchResultItem, SearchResultPage};
pub use store::{InMemorySpatialStore, SpatialStore};
