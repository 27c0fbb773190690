//! Geospatial search & ranking engine for a location-aware business directory.
//!
//! The crate provides three cooperating cores:
//!
//! - **Search orchestration**: [`search::SearchOrchestrator`] turns a raw
//!   location query into a validated, cached, enriched, paginated result page
//!   backed by a [`search::SpatialStore`].
//! - **Caching**: [`cache::CacheKeyPolicy`] quantizes coordinates into stable
//!   cache keys, and [`cache::InvalidationCoordinator`] drops affected entries
//!   when a business moves or changes category.
//! - **Suggestions**: [`suggest::SuggestionAggregator`] fans out to pluggable
//!   sources and [`suggest::RankingEngine`] produces one deterministic,
//!   ordered autocomplete list.
//!
//! Persistence, authentication, payments, and HTTP wiring are collaborator
//! concerns; the engine only defines the store traits it consumes.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod geo;
pub mod models;
pub mod query;
pub mod search;
pub mod suggest;

pub use clock::{Clock, SystemClock};
pub use config::EngineConfig;
pub use error::{EngineError, Result};
pub use geo::Coordinates;
pub use models::Business;
pub use query::{LocationQuery, QueryNormalizer, RawLocationQuery};
pub use search::{SearchOrchestrator, SearchResultPage, SpatialStore};
pub use suggest::{RankedSuggestion, SuggestionAggregator, SuggestionCandidate};
