use serde::{Deserialize, Serialize};

use crate::suggest::ranking::RankingWeights;

/// Main engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Search orchestration configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Cache keying, TTL, and invalidation configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Suggestion aggregation and ranking configuration
    #[serde(default)]
    pub suggest: SuggestConfig,
}

impl EngineConfig {
    /// Load configuration from the embedded defaults, an optional file
    /// (`CONFIG_PATH`), and environment variables (prefix: GEO_SEARCH)
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .add_source(config::File::with_name(&config_path).required(false))
            .add_source(
                config::Environment::with_prefix("GEO_SEARCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

/// Query limits and enrichment tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Smallest accepted search radius; smaller values are clamped up
    #[serde(default = "default_min_radius_km")]
    pub min_radius_km: f64,

    /// Largest accepted search radius; larger values are clamped down
    #[serde(default = "default_max_radius_km")]
    pub max_radius_km: f64,

    /// Radius applied when the caller does not provide one
    #[serde(default = "default_radius_km")]
    pub default_radius_km: f64,

    /// Page size cap
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    /// Page size applied when the caller does not provide one
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    /// Average speed used for the straight-line travel-time estimate (km/h)
    #[serde(default = "default_average_speed_kmh")]
    pub average_speed_kmh: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_radius_km: default_min_radius_km(),
            max_radius_km: default_max_radius_km(),
            default_radius_km: default_radius_km(),
            max_page_size: default_max_page_size(),
            default_page_size: default_page_size(),
            average_speed_kmh: default_average_speed_kmh(),
        }
    }
}

/// Cache key policy, dynamic TTL bands, and invalidation index bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Prefix for every key the engine writes
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Decimal places coordinates are quantized to in search keys (~11 m at 4)
    #[serde(default = "default_coordinate_precision")]
    pub coordinate_precision: usize,

    /// Grid cell edge in degrees used for invalidation scoping (~1.1 km at 0.01)
    #[serde(default = "default_grid_cell_degrees")]
    pub grid_cell_degrees: f64,

    /// Edge length of the N x N block of cells invalidated around a point
    #[serde(default = "default_neighbor_block_size")]
    pub neighbor_block_size: u32,

    /// Max length of the normalized text fragment folded into search keys
    #[serde(default = "default_text_fragment_len")]
    pub text_fragment_len: usize,

    /// TTL for pages from dense areas (density above `dense_density`)
    #[serde(default = "default_dense_ttl_secs")]
    pub dense_ttl_secs: u64,

    /// TTL for pages from moderately dense areas
    #[serde(default = "default_moderate_ttl_secs")]
    pub moderate_ttl_secs: u64,

    /// TTL for sparse pages, likely near the edge of data coverage
    #[serde(default = "default_sparse_ttl_secs")]
    pub sparse_ttl_secs: u64,

    /// Density threshold above which `dense_ttl_secs` applies
    #[serde(default = "default_dense_density")]
    pub dense_density: f64,

    /// Density threshold above which `moderate_ttl_secs` applies
    #[serde(default = "default_moderate_density")]
    pub moderate_density: f64,

    /// TTL of the per-cell activity record used for warming/telemetry
    #[serde(default = "default_grid_record_ttl_secs")]
    pub grid_record_ttl_secs: u64,

    /// Outstanding search keys remembered per grid cell
    #[serde(default = "default_index_keys_per_cell")]
    pub index_keys_per_cell: usize,

    /// Grid cells tracked before the oldest cell is evicted
    #[serde(default = "default_index_max_cells")]
    pub index_max_cells: usize,

    /// Redis connection string for the redis-backed cache store
    pub redis_url: Option<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key_prefix: default_key_prefix(),
            coordinate_precision: default_coordinate_precision(),
            grid_cell_degrees: default_grid_cell_degrees(),
            neighbor_block_size: default_neighbor_block_size(),
            text_fragment_len: default_text_fragment_len(),
            dense_ttl_secs: default_dense_ttl_secs(),
            moderate_ttl_secs: default_moderate_ttl_secs(),
            sparse_ttl_secs: default_sparse_ttl_secs(),
            dense_density: default_dense_density(),
            moderate_density: default_moderate_density(),
            grid_record_ttl_secs: default_grid_record_ttl_secs(),
            index_keys_per_cell: default_index_keys_per_cell(),
            index_max_cells: default_index_max_cells(),
            redis_url: None,
        }
    }
}

/// Suggestion fan-out and ranking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestConfig {
    /// Max candidates requested from each source
    #[serde(default = "default_source_limit")]
    pub source_limit: usize,

    /// Result list length when the caller does not specify one
    #[serde(default = "default_suggest_limit")]
    pub default_limit: usize,

    /// Candidates scoring below this are dropped
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// TTL of the in-process memo cache for repeated autocomplete calls
    #[serde(default = "default_memo_ttl_secs")]
    pub memo_ttl_secs: u64,

    /// Capacity of the memo cache
    #[serde(default = "default_memo_capacity")]
    pub memo_capacity: u64,

    /// Radius the business-name source searches around the caller's location
    #[serde(default = "default_name_search_radius_km")]
    pub name_search_radius_km: f64,

    /// Per-source ranking weight table
    #[serde(default)]
    pub weights: RankingWeights,
}

impl Default for SuggestConfig {
    fn default() -> Self {
        Self {
            source_limit: default_source_limit(),
            default_limit: default_suggest_limit(),
            min_confidence: default_min_confidence(),
            memo_ttl_secs: default_memo_ttl_secs(),
            memo_capacity: default_memo_capacity(),
            name_search_radius_km: default_name_search_radius_km(),
            weights: RankingWeights::default(),
        }
    }
}

fn default_min_radius_km() -> f64 {
    0.1
}

fn default_max_radius_km() -> f64 {
    100.0
}

fn default_radius_km() -> f64 {
    5.0
}

fn default_max_page_size() -> u32 {
    50
}

fn default_page_size() -> u32 {
    20
}

fn default_average_speed_kmh() -> f64 {
    30.0
}

fn default_key_prefix() -> String {
    "geo-search".to_string()
}

fn default_coordinate_precision() -> usize {
    4
}

fn default_grid_cell_degrees() -> f64 {
    0.01
}

fn default_neighbor_block_size() -> u32 {
    3
}

fn default_text_fragment_len() -> usize {
    64
}

fn default_dense_ttl_secs() -> u64 {
    600
}

fn default_moderate_ttl_secs() -> u64 {
    300
}

fn default_sparse_ttl_secs() -> u64 {
    120
}

fn default_dense_density() -> f64 {
    0.5
}

fn default_moderate_density() -> f64 {
    0.2
}

fn default_grid_record_ttl_secs() -> u64 {
    600
}

fn default_index_keys_per_cell() -> usize {
    64
}

fn default_index_max_cells() -> usize {
    4096
}

fn default_source_limit() -> usize {
    5
}

fn default_suggest_limit() -> usize {
    10
}

fn default_min_confidence() -> f64 {
    0.1
}

fn default_memo_ttl_secs() -> u64 {
    60
}

fn default_memo_capacity() -> u64 {
    10_000
}

fn default_name_search_radius_km() -> f64 {
    25.0
}
