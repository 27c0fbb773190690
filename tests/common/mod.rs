//! Shared fixtures for the integration suites
#![allow(dead_code)]

use async_trait::async_trait;
use std::time::Duration;

use geo_search_engine::cache::{CacheError, CacheResult, CacheStore};
use geo_search_engine::geo::Coordinates;
use geo_search_engine::models::{Business, DayHours, WeeklyHours};
use geo_search_engine::query::{LocationQuery, RawLocationQuery};
use geo_search_engine::search::{SearchError, SearchResult, SpatialStore};

/// An active listing at the given point with a category and popularity
pub fn business(name: &str, category: &str, lat: f64, lng: f64) -> Business {
    let mut b = Business::new(
        name.to_string(),
        vec![category.to_string()],
        Coordinates::new(lat, lng),
        "America/New_York".to_string(),
    );
    b.popularity = 50.0;
    b.rating = Some(4.0);
    b
}

/// Same as [`business`] but open 9-17 local time every day
pub fn business_with_hours(name: &str, category: &str, lat: f64, lng: f64) -> Business {
    let mut b = business(name, category, lat, lng);
    b.hours = Some(WeeklyHours::every_day(DayHours::from_hm(9, 0, 17, 0)));
    b
}

pub fn raw_query(lat: f64, lng: f64, radius_km: f64) -> RawLocationQuery {
    RawLocationQuery {
        lat,
        lng,
        radius_km: Some(radius_km),
        ..Default::default()
    }
}

/// Spatial store that always fails, for surfacing tests
pub struct FailingSpatialStore;

#[async_trait]
impl SpatialStore for FailingSpatialStore {
    async fn find_within_radius(&self, _query: &LocationQuery) -> SearchResult<Vec<Business>> {
        Err(SearchError::Unavailable("connection refused".to_string()))
    }

    async fn count_within_radius(&self, _query: &LocationQuery) -> SearchResult<u64> {
        Err(SearchError::Unavailable("connection refused".to_string()))
    }
}

/// Spatial store that never answers within a test deadline
pub struct SlowSpatialStore;

#[async_trait]
impl SpatialStore for SlowSpatialStore {
    async fn find_within_radius(&self, _query: &LocationQuery) -> SearchResult<Vec<Business>> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(vec![])
    }

    async fn count_within_radius(&self, _query: &LocationQuery) -> SearchResult<u64> {
        tokio::time::sleep(Duration::from_secs(10)).await;
        Ok(0)
    }
}

/// Cache store where every operation fails; searches must still succeed
pub struct FailingCacheStore;

#[async_trait]
impl CacheStore for FailingCacheStore {
    async fn get(&self, _key: &str) -> CacheResult<Option<Vec<u8>>> {
        Err(CacheError::Backend("cache down".to_string()))
    }

    async fn set(&self, _key: &str, _value: &[u8], _ttl: Duration) -> CacheResult<()> {
        Err(CacheError::Backend("cache down".to_string()))
    }

    async fn delete(&self, _key: &str) -> CacheResult<()> {
        Err(CacheError::Backend("cache down".to_string()))
    }

    async fn delete_by_prefix(&self, _prefix: &str) -> CacheResult<u64> {
        Err(CacheError::Backend("cache down".to_string()))
    }
}
