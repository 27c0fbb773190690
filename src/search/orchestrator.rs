//! Search façade: normalize, consult the cache, fan out to the spatial
//! store, enrich, and write back with a density-derived TTL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::cache::invalidation::GridKeyIndex;
use crate::cache::key::CacheKeyPolicy;
use crate::cache::store::CacheStore;
use crate::clock::{Clock, SystemClock};
use crate::config::{CacheConfig, EngineConfig};
use crate::error::EngineError;
use crate::geo::Coordinates;
use crate::models::Business;
use crate::query::{LocationQuery, QueryClamps, QueryNormalizer, RawLocationQuery};
use crate::search::enrichment::ResultEnricher;
use crate::search::error::{SearchError, SearchResult};
use crate::search::store::SpatialStore;

/// A stored entity plus the engine-derived fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultItem {
    pub business: Business,

    /// Great-circle distance from the query center
    pub distance_km: f64,

    /// Forward azimuth from the query center, 0 = due north
    pub bearing_degrees: f64,

    /// Open at request time, evaluated in the business's timezone;
    /// `None` when hours are undeclared
    pub is_open_now: Option<bool>,

    /// Straight-line travel estimate at the configured average speed
    pub estimated_travel_minutes: u32,
}

/// One page of ranked search results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResultPage {
    pub items: Vec<SearchResultItem>,

    /// Matches before pagination
    pub total_count: u64,

    pub radius_km: f64,
    pub center: Coordinates,
    pub page: u32,
    pub page_size: u32,

    /// Whether this page was served from cache
    pub cache_hit: bool,

    /// Elapsed wall time for this call
    pub took_ms: u64,

    /// Count per category over the returned items
    pub category_breakdown: HashMap<String, u32>,

    /// Fields silently clamped during normalization
    pub clamps: QueryClamps,
}

/// Cache payload: a result page minus the per-call timing fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedPage {
    pub items: Vec<SearchResultItem>,
    pub total_count: u64,
    pub radius_km: f64,
    pub center: Coordinates,
    pub page: u32,
    pub page_size: u32,
    pub category_breakdown: HashMap<String, u32>,
    pub written_at: DateTime<Utc>,
}

impl CachedPage {
    fn from_page(page: &SearchResultPage, written_at: DateTime<Utc>) -> Self {
        Self {
            items: page.items.clone(),
            total_count: page.total_count,
            radius_km: page.radius_km,
            center: page.center,
            page: page.page,
            page_size: page.page_size,
            category_breakdown: page.category_breakdown.clone(),
            written_at,
        }
    }

    fn into_page(self, took_ms: u64, clamps: QueryClamps) -> SearchResultPage {
        SearchResultPage {
            items: self.items,
            total_count: self.total_count,
            radius_km: self.radius_km,
            center: self.center,
            page: self.page,
            page_size: self.page_size,
            cache_hit: true,
            took_ms,
            category_breakdown: self.category_breakdown,
            clamps,
        }
    }
}

/// Per-cell activity record, written alongside search entries for cache
/// warming and telemetry. Not correctness-bearing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridActivityRecord {
    pub last_search_at: DateTime<Utc>,
    pub result_count: u32,
    pub total_count: u64,
}

/// The search façade
pub struct SearchOrchestrator {
    spatial: Arc<dyn SpatialStore>,
    cache: Arc<dyn CacheStore>,
    keys: CacheKeyPolicy,
    grid_index: Arc<GridKeyIndex>,
    normalizer: QueryNormalizer,
    enricher: ResultEnricher,
    cache_config: CacheConfig,
    clock: Arc<dyn Clock>,
}

impl SearchOrchestrator {
    pub fn new(
        spatial: Arc<dyn SpatialStore>,
        cache: Arc<dyn CacheStore>,
        config: &EngineConfig,
    ) -> Self {
        Self::with_clock(spatial, cache, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        spatial: Arc<dyn SpatialStore>,
        cache: Arc<dyn CacheStore>,
        config: &EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            spatial,
            cache,
            keys: CacheKeyPolicy::new(&config.cache),
            grid_index: Arc::new(GridKeyIndex::new(
                config.cache.index_keys_per_cell,
                config.cache.index_max_cells,
            )),
            normalizer: QueryNormalizer::new(config.search.clone()),
            enricher: ResultEnricher::new(config.search.average_speed_kmh, clock.clone()),
            cache_config: config.cache.clone(),
            clock,
        }
    }

    /// The grid index shared with the invalidation coordinator
    pub fn grid_index(&self) -> Arc<GridKeyIndex> {
        self.grid_index.clone()
    }

    /// The key policy in effect, for wiring an invalidation coordinator
    pub fn key_policy(&self) -> CacheKeyPolicy {
        self.keys.clone()
    }

    /// Run a search with no caller deadline
    pub async fn search(&self, raw: &RawLocationQuery) -> SearchResult<SearchResultPage> {
        self.search_with_deadline(raw, None).await
    }

    /// Run a search, honoring the caller's deadline over the store fan-out
    /// and enrichment. On expiry the in-flight sub-calls are abandoned and no
    /// cache write occurs.
    pub async fn search_with_deadline(
        &self,
        raw: &RawLocationQuery,
        deadline: Option<Duration>,
    ) -> SearchResult<SearchResultPage> {
        let started = Instant::now();

        let (query, clamps) = self.normalizer.normalize(raw).map_err(|e| match e {
            EngineError::Validation(msg) => SearchError::InvalidQuery(msg),
            other => SearchError::InvalidQuery(other.to_string()),
        })?;

        let key = self.keys.search_key(&query);
        if let Some(cached) = self.cache_lookup(&key).await {
            tracing::debug!(key = %key, "Search cache hit");
            return Ok(cached.into_page(elapsed_ms(started), clamps));
        }

        let fetch = async {
            let (found, counted) = tokio::join!(
                self.spatial.find_within_radius(&query),
                self.spatial.count_within_radius(&query)
            );
            let businesses = found?;
            let total_count = counted?;

            let items: Vec<SearchResultItem> = businesses
                .into_iter()
                .map(|b| self.enricher.enrich(query.center, b))
                .collect();

            Ok::<_, SearchError>((items, total_count))
        };

        let (items, total_count) = match deadline {
            Some(limit) => tokio::time::timeout(limit, fetch)
                .await
                .map_err(|_| SearchError::Timeout(format!("deadline of {:?} exceeded", limit)))??,
            None => fetch.await?,
        };

        let category_breakdown = category_breakdown(&items);
        let page = SearchResultPage {
            items,
            total_count,
            radius_km: query.radius_km,
            center: query.center,
            page: query.page,
            page_size: query.page_size,
            cache_hit: false,
            took_ms: elapsed_ms(started),
            category_breakdown,
            clamps,
        };

        let ttl = self.ttl_for_density(page.items.len(), total_count);
        self.write_cache(&key, &query, &page, ttl).await;

        tracing::debug!(
            key = %key,
            results = page.items.len(),
            total = total_count,
            ttl_secs = ttl.as_secs(),
            took_ms = page.took_ms,
            "Search cache miss served from store"
        );

        Ok(page)
    }

    async fn cache_lookup(&self, key: &str) -> Option<CachedPage> {
        match self.cache.get(key).await {
            Ok(Some(bytes)) => match bincode::deserialize::<CachedPage>(&bytes) {
                Ok(cached) => Some(cached),
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Cache payload decode failed; treating as miss");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache read failed; treating as miss");
                None
            }
        }
    }

    /// Dense, slow-changing areas tolerate longer staleness; sparse results
    /// (likely near the edge of data coverage) refresh sooner because a
    /// single new listing changes the result set materially.
    fn ttl_for_density(&self, returned: usize, total: u64) -> Duration {
        let density = returned as f64 / total.max(1) as f64;

        let secs = if density > self.cache_config.dense_density {
            self.cache_config.dense_ttl_secs
        } else if density > self.cache_config.moderate_density {
            self.cache_config.moderate_ttl_secs
        } else {
            self.cache_config.sparse_ttl_secs
        };

        Duration::from_secs(secs)
    }

    /// Best-effort cache write; failures are logged, never surfaced
    async fn write_cache(
        &self,
        key: &str,
        query: &LocationQuery,
        page: &SearchResultPage,
        ttl: Duration,
    ) {
        let cached = CachedPage::from_page(page, self.clock.now());
        let bytes = match bincode::serialize(&cached) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache payload encode failed; skipping write");
                return;
            }
        };

        if let Err(e) = self.cache.set(key, &bytes, ttl).await {
            tracing::warn!(key = %key, error = %e, "Cache write failed");
            return;
        }

        // Index under the center cell and its immediate neighbors so a
        // business update can delete exactly; wider overlaps age out via TTL.
        for cell in self.keys.neighboring_grid_keys_of(query.center) {
            self.grid_index.record(&cell, key);
        }

        let grid = self.keys.grid_key(query.center.lat, query.center.lng);
        let record = GridActivityRecord {
            last_search_at: self.clock.now(),
            result_count: page.items.len() as u32,
            total_count: page.total_count,
        };
        if let Ok(bytes) = bincode::serialize(&record) {
            let record_ttl = Duration::from_secs(self.cache_config.grid_record_ttl_secs);
            if let Err(e) = self
                .cache
                .set(&self.keys.grid_record_key(&grid), &bytes, record_ttl)
                .await
            {
                tracing::debug!(grid = %grid, error = %e, "Grid record write failed");
            }
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}

fn category_breakdown(items: &[SearchResultItem]) -> HashMap<String, u32> {
    let mut breakdown = HashMap::new();
    for item in items {
        for category in &item.business.categories {
            *breakdown.entry(category.clone()).or_insert(0) += 1;
        }
    }
    breakdown
}
