//! End-to-end search orchestration: cache behavior, enrichment, and
//! failure semantics against the in-memory reference stores.

mod common;

use std::sync::Arc;
use std::time::Duration;

use geo_search_engine::cache::InMemoryCacheStore;
use geo_search_engine::config::EngineConfig;
use geo_search_engine::search::{InMemorySpatialStore, SearchError, SearchOrchestrator};

use common::{business, raw_query, FailingCacheStore, FailingSpatialStore, SlowSpatialStore};

fn orchestrator(
    spatial: Arc<InMemorySpatialStore>,
) -> (SearchOrchestrator, Arc<InMemoryCacheStore>) {
    let cache = Arc::new(InMemoryCacheStore::new());
    let orchestrator = SearchOrchestrator::new(spatial, cache.clone(), &EngineConfig::default());
    (orchestrator, cache)
}

#[tokio::test]
async fn test_single_entity_scenario() {
    // One business roughly 2 km north of the query center
    let spatial = Arc::new(InMemorySpatialStore::new());
    spatial.upsert(business("Corner Deli", "Deli", 40.7308, -74.0060));
    let (orchestrator, _) = orchestrator(spatial);

    let mut raw = raw_query(40.7128, -74.0060, 25.0);
    raw.page_size = Some(10);

    let first = orchestrator.search(&raw).await.unwrap();
    assert_eq!(first.total_count, 1);
    assert_eq!(first.items.len(), 1);
    assert!(!first.cache_hit);
    assert!(
        (first.items[0].distance_km - 2.0).abs() < 0.1,
        "distance was {}",
        first.items[0].distance_km
    );
    // Due north of the center
    assert!(first.items[0].bearing_degrees < 1.0 || first.items[0].bearing_degrees > 359.0);

    let second = orchestrator.search(&raw).await.unwrap();
    assert!(second.cache_hit);
    assert_eq!(second.total_count, first.total_count);
    assert_eq!(second.items.len(), first.items.len());
    assert_eq!(second.items[0].business.id, first.items[0].business.id);
}

#[tokio::test]
async fn test_coordinate_jitter_hits_same_cache_entry() {
    let spatial = Arc::new(InMemorySpatialStore::new());
    spatial.upsert(business("Corner Deli", "Deli", 40.7308, -74.0060));
    let (orchestrator, _) = orchestrator(spatial);

    let first = orchestrator
        .search(&raw_query(40.71281, -74.00601, 25.0))
        .await
        .unwrap();
    assert!(!first.cache_hit);

    // Differs only beyond the 4th decimal place (~1 m)
    let second = orchestrator
        .search(&raw_query(40.71282, -74.00603, 25.0))
        .await
        .unwrap();
    assert!(second.cache_hit);
}

#[tokio::test]
async fn test_different_filters_do_not_share_entries() {
    let spatial = Arc::new(InMemorySpatialStore::new());
    spatial.upsert(business("Corner Deli", "Deli", 40.7130, -74.0060));
    let (orchestrator, _) = orchestrator(spatial);

    let plain = raw_query(40.7128, -74.0060, 25.0);
    orchestrator.search(&plain).await.unwrap();

    let mut filtered = raw_query(40.7128, -74.0060, 25.0);
    filtered.categories = vec!["Deli".to_string()];
    let page = orchestrator.search(&filtered).await.unwrap();
    assert!(!page.cache_hit);
}

#[tokio::test]
async fn test_radius_clamp_reported_on_page() {
    let spatial = Arc::new(InMemorySpatialStore::new());
    let (orchestrator, _) = orchestrator(spatial);

    let page = orchestrator
        .search(&raw_query(40.7128, -74.0060, 500.0))
        .await
        .unwrap();
    assert_eq!(page.radius_km, 100.0);
    assert!(page.clamps.radius);
    assert!(page.clamps.any());
}

#[tokio::test]
async fn test_validation_error_for_bad_coordinates() {
    let spatial = Arc::new(InMemorySpatialStore::new());
    let (orchestrator, cache) = orchestrator(spatial);

    let result = orchestrator.search(&raw_query(120.0, -74.0, 5.0)).await;
    assert!(matches!(result, Err(SearchError::InvalidQuery(_))));
    // Nothing was cached on the failed call
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_spatial_store_failure_surfaces() {
    let cache = Arc::new(InMemoryCacheStore::new());
    let orchestrator = SearchOrchestrator::new(
        Arc::new(FailingSpatialStore),
        cache,
        &EngineConfig::default(),
    );

    let result = orchestrator.search(&raw_query(40.7128, -74.0060, 5.0)).await;
    match result {
        Err(SearchError::Unavailable(msg)) => assert!(msg.contains("connection refused")),
        other => panic!("expected Unavailable, got {:?}", other.map(|p| p.total_count)),
    }
}

#[tokio::test]
async fn test_cache_failure_never_fails_the_search() {
    let spatial = Arc::new(InMemorySpatialStore::new());
    spatial.upsert(business("Corner Deli", "Deli", 40.7130, -74.0060));
    let orchestrator = SearchOrchestrator::new(
        spatial,
        Arc::new(FailingCacheStore),
        &EngineConfig::default(),
    );

    let raw = raw_query(40.7128, -74.0060, 25.0);
    let first = orchestrator.search(&raw).await.unwrap();
    assert_eq!(first.total_count, 1);
    assert!(!first.cache_hit);

    // Every call degrades to a miss while the cache is down
    let second = orchestrator.search(&raw).await.unwrap();
    assert!(!second.cache_hit);
    assert_eq!(second.total_count, 1);
}

#[tokio::test]
async fn test_deadline_exceeded_returns_timeout() {
    let cache = Arc::new(InMemoryCacheStore::new());
    let orchestrator =
        SearchOrchestrator::new(Arc::new(SlowSpatialStore), cache.clone(), &EngineConfig::default());

    let result = orchestrator
        .search_with_deadline(&raw_query(40.7128, -74.0060, 5.0), Some(Duration::from_millis(20)))
        .await;

    assert!(matches!(result, Err(SearchError::Timeout(_))));
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_pagination_changes_the_entry() {
    let spatial = Arc::new(InMemorySpatialStore::new());
    for i in 0..5 {
        spatial.upsert(business(
            &format!("Spot {}", i),
            "Cafe",
            40.7128 + (i as f64) * 0.001,
            -74.0060,
        ));
    }
    let (orchestrator, _) = orchestrator(spatial);

    let mut page1 = raw_query(40.7128, -74.0060, 25.0);
    page1.page_size = Some(2);
    let first = orchestrator.search(&page1).await.unwrap();
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.total_count, 5);

    let mut page2 = page1.clone();
    page2.page = Some(2);
    let second = orchestrator.search(&page2).await.unwrap();
    assert!(!second.cache_hit);
    assert_eq!(second.items.len(), 2);
    assert_ne!(
        first.items[0].business.id,
        second.items[0].business.id
    );
}
