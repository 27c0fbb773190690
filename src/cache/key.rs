//! Cache key derivation.
//!
//! Search keys quantize coordinates to a configurable precision (default 4
//! decimal places, ~11 m) so nearby queries collide into the same cache entry
//! — the lever that turns a continuous coordinate space into a cache-friendly
//! discrete one. Grid keys quantize much coarser (default 0.01°, ~1.1 km) and
//! exist only to scope invalidation.

use sha2::{Digest, Sha256};

use crate::config::CacheConfig;
use crate::geo::{self, Coordinates};
use crate::query::LocationQuery;

/// Derives stable cache keys and invalidation grid cells from queries
#[derive(Debug, Clone)]
pub struct CacheKeyPolicy {
    prefix: String,
    coordinate_precision: usize,
    grid_cell_degrees: f64,
    neighbor_block_size: u32,
    text_fragment_len: usize,
}

impl CacheKeyPolicy {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            prefix: config.key_prefix.clone(),
            coordinate_precision: config.coordinate_precision,
            grid_cell_degrees: config.grid_cell_degrees,
            neighbor_block_size: config.neighbor_block_size,
            text_fragment_len: config.text_fragment_len,
        }
    }

    /// Stable key for a normalized query.
    ///
    /// Filter serialization is canonical (sorted, lowercased, deduplicated)
    /// so semantically identical queries always hash identically. The grid
    /// cell is embedded as a key segment so invalidation can delete by
    /// cell-scoped prefix.
    pub fn search_key(&self, query: &LocationQuery) -> String {
        let grid = self.grid_key(query.center.lat, query.center.lng);

        let canonical = format!(
            "lat={:.*}|lng={:.*}|r={:.1}|cat={}|amen={}|text={}|sort={}|page={}|size={}|open={}|price={}",
            self.coordinate_precision,
            query.center.lat,
            self.coordinate_precision,
            query.center.lng,
            query.radius_km,
            canonical_list(&query.categories),
            canonical_list(&query.amenities),
            self.normalize_text(query.text.as_deref()),
            query.sort_by,
            query.page,
            query.page_size,
            query.open_only,
            query
                .price_range
                .map(|p| format!("{}-{}", p.min, p.max))
                .unwrap_or_default(),
        );

        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let digest = format!("{:x}", hasher.finalize());

        format!("{}:search:{}:{}", self.prefix, grid, &digest[..32])
    }

    /// Coarse grid cell address for a point
    pub fn grid_key(&self, lat: f64, lng: f64) -> String {
        let (lat_idx, lng_idx) = geo::grid_cell_indices(lat, lng, self.grid_cell_degrees);
        Self::cell_token(lat_idx, lng_idx)
    }

    /// The N x N block of grid cells around a point (default 3 x 3), used when
    /// a business move must invalidate anything that might have included it
    pub fn neighboring_grid_keys(&self, lat: f64, lng: f64) -> Vec<String> {
        let (lat_idx, lng_idx) = geo::grid_cell_indices(lat, lng, self.grid_cell_degrees);
        let half = (self.neighbor_block_size / 2) as i64;

        let mut keys = Vec::with_capacity((self.neighbor_block_size * self.neighbor_block_size) as usize);
        for dlat in -half..=half {
            for dlng in -half..=half {
                keys.push(Self::cell_token(lat_idx + dlat, lng_idx + dlng));
            }
        }
        keys
    }

    /// Convenience over [`neighboring_grid_keys`](Self::neighboring_grid_keys)
    pub fn neighboring_grid_keys_of(&self, coords: Coordinates) -> Vec<String> {
        self.neighboring_grid_keys(coords.lat, coords.lng)
    }

    /// Key prefix matching every search entry in one grid cell
    pub fn search_prefix_for_cell(&self, grid_key: &str) -> String {
        format!("{}:search:{}:", self.prefix, grid_key)
    }

    /// Key of the per-cell activity record (warming/telemetry only)
    pub fn grid_record_key(&self, grid_key: &str) -> String {
        format!("{}:grid:{}", self.prefix, grid_key)
    }

    fn cell_token(lat_idx: i64, lng_idx: i64) -> String {
        format!("g{}x{}", lat_idx, lng_idx)
    }

    /// Lowercase, collapse whitespace, truncate
    fn normalize_text(&self, text: Option<&str>) -> String {
        let Some(text) = text else {
            return String::new();
        };
        let collapsed = text.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ");
        collapsed.chars().take(self.text_fragment_len).collect()
    }
}

/// Sorted, lowercased, deduplicated, comma-joined
fn canonical_list(values: &[String]) -> String {
    let mut lowered: Vec<String> = values.iter().map(|v| v.to_lowercase()).collect();
    lowered.sort();
    lowered.dedup();
    lowered.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::query::{LocationQuery, SortOrder};

    fn policy() -> CacheKeyPolicy {
        CacheKeyPolicy::new(&CacheConfig::default())
    }

    fn query(lat: f64, lng: f64) -> LocationQuery {
        LocationQuery {
            center: Coordinates::new(lat, lng),
            radius_km: 5.0,
            categories: vec![],
            text: None,
            page: 1,
            page_size: 20,
            sort_by: SortOrder::Distance,
            price_range: None,
            amenities: vec![],
            open_only: false,
        }
    }

    #[test]
    fn test_quantization_collapses_nearby_coordinates() {
        let p = policy();

        // Differ only beyond the 4th decimal place
        let a = p.search_key(&query(40.71281, -74.00601));
        let b = p.search_key(&query(40.71283, -74.00604));
        assert_eq!(a, b);

        // Differ at the 3rd decimal place
        let c = p.search_key(&query(40.714, -74.006));
        assert_ne!(a, c);
    }

    #[test]
    fn test_filter_order_is_canonical() {
        let p = policy();

        let mut q1 = query(40.7128, -74.0060);
        q1.categories = vec!["Pizza".to_string(), "sushi".to_string()];
        let mut q2 = query(40.7128, -74.0060);
        q2.categories = vec!["Sushi".to_string(), "pizza".to_string()];

        assert_eq!(p.search_key(&q1), p.search_key(&q2));
    }

    #[test]
    fn test_pagination_and_text_change_the_key() {
        let p = policy();

        let base = query(40.7128, -74.0060);
        let mut paged = base.clone();
        paged.page = 2;
        let mut texted = base.clone();
        texted.text = Some("pizza".to_string());

        assert_ne!(p.search_key(&base), p.search_key(&paged));
        assert_ne!(p.search_key(&base), p.search_key(&texted));
    }

    #[test]
    fn test_text_normalization_collapses_whitespace_and_case() {
        let p = policy();

        let mut q1 = query(40.7128, -74.0060);
        q1.text = Some("Best   PIZZA".to_string());
        let mut q2 = query(40.7128, -74.0060);
        q2.text = Some("best pizza".to_string());

        assert_eq!(p.search_key(&q1), p.search_key(&q2));
    }

    #[test]
    fn test_search_key_embeds_grid_cell() {
        let p = policy();
        let q = query(40.7128, -74.0060);

        let key = p.search_key(&q);
        let grid = p.grid_key(40.7128, -74.0060);
        assert!(key.starts_with(&p.search_prefix_for_cell(&grid)));
    }

    #[test]
    fn test_neighboring_grid_keys_form_a_block() {
        let p = policy();

        let neighbors = p.neighboring_grid_keys(40.7128, -74.0060);
        assert_eq!(neighbors.len(), 9);
        assert!(neighbors.contains(&p.grid_key(40.7128, -74.0060)));

        let distinct: std::collections::HashSet<_> = neighbors.iter().collect();
        assert_eq!(distinct.len(), 9);
    }

    #[test]
    fn test_grid_key_independent_of_filters() {
        let p = policy();
        assert_eq!(
            p.grid_key(40.7128, -74.0060),
            p.grid_key(40.7129, -74.0061)
        );
    }
}
