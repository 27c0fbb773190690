//! Spatial store contract and the in-memory reference implementation

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::geo;
use crate::models::Business;
use crate::query::{LocationQuery, SortOrder};
use crate::search::error::SearchResult;

/// Geo-capable entity store the engine queries but does not implement.
///
/// Implementations must support category OR-matching, substring text
/// matching, the orderings in [`SortOrder`], and offset pagination. Ordering
/// is applied by the store; the engine never re-sorts a fetched page.
#[async_trait]
pub trait SpatialStore: Send + Sync {
    /// Businesses matching the query predicate, ordered and paginated
    async fn find_within_radius(&self, query: &LocationQuery) -> SearchResult<Vec<Business>>;

    /// Total number of businesses matching the same predicate
    async fn count_within_radius(&self, query: &LocationQuery) -> SearchResult<u64>;
}

/// In-memory spatial store (for MVP and testing)
#[derive(Clone)]
pub struct InMemorySpatialStore {
    businesses: Arc<DashMap<Uuid, Business>>,
    clock: Arc<dyn Clock>,
}

impl InMemorySpatialStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            businesses: Arc::new(DashMap::new()),
            clock,
        }
    }

    pub fn upsert(&self, business: Business) {
        self.businesses.insert(business.id, business);
    }

    pub fn remove(&self, id: &Uuid) -> Option<Business> {
        self.businesses.remove(id).map(|(_, b)| b)
    }

    pub fn get(&self, id: &Uuid) -> Option<Business> {
        self.businesses.get(id).map(|e| e.clone())
    }

    pub fn len(&self) -> usize {
        self.businesses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.businesses.is_empty()
    }

    /// All matches with their distance from the query center, unordered
    fn matching(&self, query: &LocationQuery) -> Vec<(f64, Business)> {
        let now = self.clock.now();

        self.businesses
            .iter()
            .filter_map(|entry| {
                let business = entry.value();

                if !business.active {
                    return None;
                }
                if !business.matches_categories(&query.categories) {
                    return None;
                }
                if !business.has_amenities(&query.amenities) {
                    return None;
                }
                if let Some(ref text) = query.text {
                    if !business.matches_text(text) {
                        return None;
                    }
                }
                if let Some(range) = query.price_range {
                    match business.price_level {
                        Some(level) if range.contains(level) => {}
                        _ => return None,
                    }
                }
                if query.open_only && business.is_open_at(now) != Some(true) {
                    return None;
                }

                let distance = geo::haversine_km(query.center, business.coordinates);
                if distance > query.radius_km {
                    return None;
                }

                Some((distance, business.clone()))
            })
            .collect()
    }
}

impl Default for InMemorySpatialStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpatialStore for InMemorySpatialStore {
    async fn find_within_radius(&self, query: &LocationQuery) -> SearchResult<Vec<Business>> {
        let mut matches = self.matching(query);

        match query.sort_by {
            SortOrder::Distance => {
                matches.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
            }
            SortOrder::Rating => {
                matches.sort_by(|a, b| {
                    let ra = a.1.rating.unwrap_or(-1.0);
                    let rb = b.1.rating.unwrap_or(-1.0);
                    rb.partial_cmp(&ra)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
                });
            }
            SortOrder::Popularity => {
                matches.sort_by(|a, b| {
                    b.1.popularity
                        .partial_cmp(&a.1.popularity)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
                });
            }
            SortOrder::Price => {
                matches.sort_by(|a, b| {
                    let pa = a.1.price_level.unwrap_or(u8::MAX);
                    let pb = b.1.price_level.unwrap_or(u8::MAX);
                    pa.cmp(&pb)
                        .then_with(|| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal))
                });
            }
        }

        Ok(matches
            .into_iter()
            .skip(query.offset() as usize)
            .take(query.page_size as usize)
            .map(|(_, business)| business)
            .collect())
    }

    async fn count_within_radius(&self, query: &LocationQuery) -> SearchResult<u64> {
        Ok(self.matching(query).len() as u64)
    }
}
