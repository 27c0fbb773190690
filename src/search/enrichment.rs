//! Derived per-result fields computed on every cache miss

use std::sync::Arc;

use crate::clock::Clock;
use crate::geo::{self, Coordinates};
use crate::models::Business;
use crate::search::orchestrator::SearchResultItem;

/// Computes the engine-owned derived fields for each returned entity:
/// distance, bearing, open-now, and a travel-time estimate.
pub struct ResultEnricher {
    average_speed_kmh: f64,
    clock: Arc<dyn Clock>,
}

impl ResultEnricher {
    pub fn new(average_speed_kmh: f64, clock: Arc<dyn Clock>) -> Self {
        Self {
            average_speed_kmh,
            clock,
        }
    }

    pub fn enrich(&self, center: Coordinates, business: Business) -> SearchResultItem {
        let distance_km = geo::haversine_km(center, business.coordinates);
        let bearing_degrees = geo::initial_bearing_deg(center, business.coordinates);
        let is_open_now = business.is_open_at(self.clock.now());
        let estimated_travel_minutes = self.travel_minutes(distance_km);

        SearchResultItem {
            business,
            distance_km,
            bearing_degrees,
            is_open_now,
            estimated_travel_minutes,
        }
    }

    /// Straight-line estimate at the configured average speed.
    /// An approximation, not a routing engine.
    pub fn travel_minutes(&self, distance_km: f64) -> u32 {
        (distance_km / self.average_speed_kmh * 60.0).ceil() as u32
    }
}
