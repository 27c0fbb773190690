//! Grid-scoped cache invalidation.
//!
//! Search keys embed a fine-grained coordinate hash, so exact-key deletion on
//! a business update is only possible through the per-cell index maintained
//! here. Cells with no index entries fall back to a prefix scan bounded to the
//! affected cell; at worst a moved business is briefly visible at its old
//! location for up to one entry TTL.

use parking_lot::Mutex;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use uuid::Uuid;

use crate::cache::key::CacheKeyPolicy;
use crate::cache::store::CacheStore;
use crate::geo::Coordinates;

struct IndexInner {
    cells: HashMap<String, VecDeque<String>>,
    cell_order: VecDeque<String>,
}

/// Bounded, insertion-ordered index of outstanding search keys per grid cell.
///
/// Safe under concurrent record/drain from search and update paths. Both the
/// per-cell key list and the cell set are size-capped with oldest-first
/// eviction; no ordering guarantee is needed beyond "eventually bounded".
pub struct GridKeyIndex {
    inner: Mutex<IndexInner>,
    keys_per_cell: usize,
    max_cells: usize,
}

impl GridKeyIndex {
    pub fn new(keys_per_cell: usize, max_cells: usize) -> Self {
        Self {
            inner: Mutex::new(IndexInner {
                cells: HashMap::new(),
                cell_order: VecDeque::new(),
            }),
            keys_per_cell: keys_per_cell.max(1),
            max_cells: max_cells.max(1),
        }
    }

    /// Remember that `search_key` was written while overlapping `grid_key`
    pub fn record(&self, grid_key: &str, search_key: &str) {
        let mut inner = self.inner.lock();

        if !inner.cells.contains_key(grid_key) {
            while inner.cell_order.len() >= self.max_cells {
                if let Some(oldest) = inner.cell_order.pop_front() {
                    inner.cells.remove(&oldest);
                }
            }
            inner.cell_order.push_back(grid_key.to_string());
        }

        let keys = inner.cells.entry(grid_key.to_string()).or_default();
        if keys.iter().any(|k| k == search_key) {
            return;
        }
        if keys.len() >= self.keys_per_cell {
            keys.pop_front();
        }
        keys.push_back(search_key.to_string());
    }

    /// Remove and return every indexed key for a cell
    pub fn drain_cell(&self, grid_key: &str) -> Vec<String> {
        let mut inner = self.inner.lock();
        let keys = inner.cells.remove(grid_key);
        if keys.is_some() {
            inner.cell_order.retain(|c| c != grid_key);
        }
        keys.map(|k| k.into_iter().collect()).unwrap_or_default()
    }

    /// Number of cells currently tracked
    pub fn cell_count(&self) -> usize {
        self.inner.lock().cells.len()
    }

    /// Number of keys tracked for one cell
    pub fn keys_in_cell(&self, grid_key: &str) -> usize {
        self.inner
            .lock()
            .cells
            .get(grid_key)
            .map(|k| k.len())
            .unwrap_or(0)
    }
}

/// Deletes cached search entries affected by a business update.
///
/// Invoked by the business-mutation collaborator after any committed write
/// that changes coordinates, category set, or active flag. Category/active
/// changes pass the unchanged coordinates as both `old` and `new`.
pub struct InvalidationCoordinator {
    cache: Arc<dyn CacheStore>,
    keys: CacheKeyPolicy,
    index: Arc<GridKeyIndex>,
}

impl InvalidationCoordinator {
    pub fn new(cache: Arc<dyn CacheStore>, keys: CacheKeyPolicy, index: Arc<GridKeyIndex>) -> Self {
        Self { cache, keys, index }
    }

    /// Invalidate every cache entry whose grid cell neighborhood contains the
    /// old or new coordinates. Returns the number of entries deleted; cache
    /// errors are logged and never surfaced.
    pub async fn on_business_location_changed(
        &self,
        business_id: Uuid,
        old: Option<Coordinates>,
        new: Option<Coordinates>,
    ) -> u64 {
        let mut cells = BTreeSet::new();
        for coords in [old, new].into_iter().flatten() {
            cells.extend(self.keys.neighboring_grid_keys_of(coords));
        }

        // A search key is indexed under several cells; collect before
        // deleting so each entry is removed and counted once.
        let mut exact_keys = BTreeSet::new();
        let mut fallback_cells = Vec::new();
        for cell in &cells {
            let indexed = self.index.drain_cell(cell);
            if indexed.is_empty() {
                fallback_cells.push(cell.clone());
            } else {
                exact_keys.extend(indexed);
            }
        }

        let mut deleted: u64 = 0;
        for key in &exact_keys {
            match self.cache.delete(key).await {
                Ok(()) => deleted += 1,
                Err(e) => tracing::warn!(key = %key, error = %e, "Key invalidation failed"),
            }
        }

        for cell in &fallback_cells {
            match self
                .cache
                .delete_by_prefix(&self.keys.search_prefix_for_cell(cell))
                .await
            {
                Ok(count) => deleted += count,
                Err(e) => tracing::warn!(cell = %cell, error = %e, "Prefix invalidation failed"),
            }
        }

        for cell in &cells {
            if let Err(e) = self.cache.delete(&self.keys.grid_record_key(cell)).await {
                tracing::debug!(cell = %cell, error = %e, "Grid record deletion failed");
            }
        }

        tracing::info!(
            business_id = %business_id,
            cells = cells.len(),
            deleted,
            "Invalidated cached searches"
        );

        deleted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::store::InMemoryCacheStore;
    use crate::config::CacheConfig;
    use std::time::Duration;

    #[test]
    fn test_index_bounds_keys_per_cell() {
        let index = GridKeyIndex::new(3, 16);

        for i in 0..5 {
            index.record("g1x1", &format!("key-{}", i));
        }

        assert_eq!(index.keys_in_cell("g1x1"), 3);
        let keys = index.drain_cell("g1x1");
        // Oldest entries were evicted
        assert_eq!(keys, vec!["key-2", "key-3", "key-4"]);
    }

    #[test]
    fn test_index_bounds_cell_count() {
        let index = GridKeyIndex::new(8, 2);

        index.record("a", "k1");
        index.record("b", "k2");
        index.record("c", "k3");

        assert_eq!(index.cell_count(), 2);
        // Oldest cell evicted wholesale
        assert!(index.drain_cell("a").is_empty());
        assert_eq!(index.drain_cell("c"), vec!["k3"]);
    }

    #[test]
    fn test_index_deduplicates_keys() {
        let index = GridKeyIndex::new(8, 8);

        index.record("g", "same");
        index.record("g", "same");
        assert_eq!(index.keys_in_cell("g"), 1);
    }

    #[tokio::test]
    async fn test_indexed_keys_deleted_exactly() {
        let cache = Arc::new(InMemoryCacheStore::new());
        let policy = CacheKeyPolicy::new(&CacheConfig::default());
        let index = Arc::new(GridKeyIndex::new(8, 8));
        let ttl = Duration::from_secs(60);

        let cell = policy.grid_key(40.0, -74.0);
        let key = format!("{}entry", policy.search_prefix_for_cell(&cell));
        cache.set(&key, b"page", ttl).await.unwrap();
        index.record(&cell, &key);

        let other = "geo-search:search:g999x999:other".to_string();
        cache.set(&other, b"page", ttl).await.unwrap();

        let coordinator = InvalidationCoordinator::new(cache.clone(), policy, index);
        let deleted = coordinator
            .on_business_location_changed(Uuid::new_v4(), Some(Coordinates::new(40.0, -74.0)), None)
            .await;

        assert_eq!(deleted, 1);
        assert!(cache.get(&key).await.unwrap().is_none());
        assert!(cache.get(&other).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_prefix_fallback_when_index_empty() {
        let cache = Arc::new(InMemoryCacheStore::new());
        let policy = CacheKeyPolicy::new(&CacheConfig::default());
        let index = Arc::new(GridKeyIndex::new(8, 8));
        let ttl = Duration::from_secs(60);

        let cell = policy.grid_key(40.0, -74.0);
        let key = format!("{}unindexed", policy.search_prefix_for_cell(&cell));
        cache.set(&key, b"page", ttl).await.unwrap();

        let coordinator = InvalidationCoordinator::new(cache.clone(), policy, index);
        let deleted = coordinator
            .on_business_location_changed(Uuid::new_v4(), Some(Coordinates::new(40.0, -74.0)), None)
            .await;

        assert_eq!(deleted, 1);
        assert!(cache.get(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_old_and_new_neighborhoods_both_invalidated() {
        let cache = Arc::new(InMemoryCacheStore::new());
        let policy = CacheKeyPolicy::new(&CacheConfig::default());
        let index = Arc::new(GridKeyIndex::new(8, 64));
        let ttl = Duration::from_secs(60);

        let old_cell = policy.grid_key(40.0, -74.0);
        let new_cell = policy.grid_key(41.0, -75.0);
        let old_key = format!("{}a", policy.search_prefix_for_cell(&old_cell));
        let new_key = format!("{}b", policy.search_prefix_for_cell(&new_cell));
        cache.set(&old_key, b"1", ttl).await.unwrap();
        cache.set(&new_key, b"2", ttl).await.unwrap();
        index.record(&old_cell, &old_key);
        index.record(&new_cell, &new_key);

        let coordinator = InvalidationCoordinator::new(cache.clone(), policy, index);
        let deleted = coordinator
            .on_business_location_changed(
                Uuid::new_v4(),
                Some(Coordinates::new(40.0, -74.0)),
                Some(Coordinates::new(41.0, -75.0)),
            )
            .await;

        assert_eq!(deleted, 2);
        assert!(cache.get(&old_key).await.unwrap().is_none());
        assert!(cache.get(&new_key).await.unwrap().is_none());
    }
}
