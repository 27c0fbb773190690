//! Query validation and normalization.
//!
//! Loosely-typed caller input ([`RawLocationQuery`]) is validated and clamped
//! exactly once into an immutable [`LocationQuery`]; nothing downstream
//! re-parses raw parameters.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use validator::Validate;

use crate::config::SearchConfig;
use crate::error::{EngineError, Result};
use crate::geo::Coordinates;

/// Result ordering, applied by the spatial store (never re-sorted post-pagination)
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Distance,
    Rating,
    Popularity,
    Price,
}

/// Inclusive price tier filter, tiers 1 (budget) through 4 (luxury)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: u8,
    pub max: u8,
}

impl PriceRange {
    pub fn contains(&self, level: u8) -> bool {
        level >= self.min && level <= self.max
    }
}

/// Untrusted query input as received from the caller
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct RawLocationQuery {
    /// Search center latitude
    #[validate(range(min = -90.0, max = 90.0, message = "latitude out of range"))]
    pub lat: f64,

    /// Search center longitude
    #[validate(range(min = -180.0, max = 180.0, message = "longitude out of range"))]
    pub lng: f64,

    /// Search radius in kilometers; clamped, not rejected
    pub radius_km: Option<f64>,

    /// Category filters (OR-matched)
    #[serde(default)]
    pub categories: Vec<String>,

    /// Free-text filter
    pub text: Option<String>,

    /// 1-based page number
    pub page: Option<u32>,

    /// Page size
    pub page_size: Option<u32>,

    /// Result ordering
    pub sort_by: Option<SortOrder>,

    /// Price tier filter
    pub price_range: Option<PriceRange>,

    /// Amenity filters (all must be offered)
    #[serde(default)]
    pub amenities: Vec<String>,

    /// Only return businesses open right now
    pub open_only: Option<bool>,
}

/// A validated, clamped, canonical query. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationQuery {
    pub center: Coordinates,
    pub radius_km: f64,
    pub categories: Vec<String>,
    pub text: Option<String>,
    pub page: u32,
    pub page_size: u32,
    pub sort_by: SortOrder,
    pub price_range: Option<PriceRange>,
    pub amenities: Vec<String>,
    pub open_only: bool,
}

impl LocationQuery {
    /// Zero-based item offset of this page
    pub fn offset(&self) -> u32 {
        (self.page - 1) * self.page_size
    }
}

/// Which fields were silently clamped during normalization.
/// Reported to the caller as metadata on the result page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryClamps {
    pub radius: bool,
    pub page: bool,
    pub page_size: bool,
}

impl QueryClamps {
    pub fn any(&self) -> bool {
        self.radius || self.page || self.page_size
    }
}

/// Validates and clamps raw query input into a canonical [`LocationQuery`].
/// Pure; no side effects.
#[derive(Debug, Clone)]
pub struct QueryNormalizer {
    config: SearchConfig,
}

impl QueryNormalizer {
    pub fn new(config: SearchConfig) -> Self {
        Self { config }
    }

    /// Normalize a raw query.
    ///
    /// Non-finite or out-of-range coordinates are rejected. Radius, page, and
    /// page size are UX hints, not hard contract violations, so out-of-range
    /// values are clamped and the clamp reported via [`QueryClamps`].
    pub fn normalize(&self, raw: &RawLocationQuery) -> Result<(LocationQuery, QueryClamps)> {
        if !raw.lat.is_finite() || !raw.lng.is_finite() {
            return Err(EngineError::Validation(
                "coordinates must be finite numbers".to_string(),
            ));
        }
        raw.validate()?;

        let mut clamps = QueryClamps::default();

        let radius_km = match raw.radius_km {
            None => self.config.default_radius_km,
            Some(r) if !r.is_finite() => {
                clamps.radius = true;
                self.config.default_radius_km
            }
            Some(r) => {
                let clamped = r.clamp(self.config.min_radius_km, self.config.max_radius_km);
                if clamped != r {
                    clamps.radius = true;
                }
                clamped
            }
        };

        let page = match raw.page {
            None => 1,
            Some(0) => {
                clamps.page = true;
                1
            }
            Some(p) => p,
        };

        let page_size = match raw.page_size {
            None => self.config.default_page_size,
            Some(s) => {
                let clamped = s.clamp(1, self.config.max_page_size);
                if clamped != s {
                    clamps.page_size = true;
                }
                clamped
            }
        };

        if let Some(range) = raw.price_range {
            if range.min == 0 || range.max > 4 || range.min > range.max {
                return Err(EngineError::Validation(format!(
                    "price range {}..{} outside tiers 1..4",
                    range.min, range.max
                )));
            }
        }

        let text = raw
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Ok((
            LocationQuery {
                center: Coordinates::new(raw.lat, raw.lng),
                radius_km,
                categories: trim_dedup(&raw.categories),
                text,
                page,
                page_size,
                sort_by: raw.sort_by.unwrap_or_default(),
                price_range: raw.price_range,
                amenities: trim_dedup(&raw.amenities),
                open_only: raw.open_only.unwrap_or(false),
            },
            clamps,
        ))
    }
}

/// Trim entries, drop empties, and deduplicate case-insensitively while
/// preserving the first occurrence's casing and order.
fn trim_dedup(values: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();

    for value in values {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_lowercase()) {
            out.push(trimmed.to_string());
        }
    }

    out
}
