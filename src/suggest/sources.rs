//! Suggestion source contract and the store-backed reference sources.
//!
//! Trending, popular-query, and history sources live with the collaborators
//! that own those signals; they implement [`SuggestionSource`] and are wired
//! into the aggregator alongside the sources here.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::sync::Arc;

use crate::config::SearchConfig;
use crate::error::Result;
use crate::geo::Coordinates;
use crate::query::{LocationQuery, SortOrder};
use crate::search::store::SpatialStore;
use crate::suggest::{normalize_suggestion_text, SuggestionCandidate, SuggestionSourceType};

/// One pluggable candidate provider
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    /// Human-readable name for logs
    fn name(&self) -> &str;

    fn source_type(&self) -> SuggestionSourceType;

    /// Propose at most `limit` candidates for a partial query
    async fn find_candidates(
        &self,
        text: &str,
        location: Option<Coordinates>,
        limit: usize,
    ) -> Result<Vec<SuggestionCandidate>>;
}

/// Matches business names near the caller via the spatial store
pub struct BusinessNameSource {
    spatial: Arc<dyn SpatialStore>,
    search_radius_km: f64,
    page_size_cap: u32,
}

impl BusinessNameSource {
    pub fn new(spatial: Arc<dyn SpatialStore>, config: &SearchConfig, search_radius_km: f64) -> Self {
        Self {
            spatial,
            search_radius_km,
            page_size_cap: config.max_page_size,
        }
    }
}

#[async_trait]
impl SuggestionSource for BusinessNameSource {
    fn name(&self) -> &str {
        "business-name"
    }

    fn source_type(&self) -> SuggestionSourceType {
        SuggestionSourceType::Business
    }

    async fn find_candidates(
        &self,
        text: &str,
        location: Option<Coordinates>,
        limit: usize,
    ) -> Result<Vec<SuggestionCandidate>> {
        // Name matching is anchored to the caller's location; without one
        // there is no radius to search.
        let Some(center) = location else {
            return Ok(Vec::new());
        };

        let query = LocationQuery {
            center,
            radius_km: self.search_radius_km,
            categories: Vec::new(),
            text: Some(text.to_string()),
            page: 1,
            page_size: (limit as u32).clamp(1, self.page_size_cap),
            sort_by: SortOrder::Distance,
            price_range: None,
            amenities: Vec::new(),
            open_only: false,
        };

        let businesses = self.spatial.find_within_radius(&query).await?;
        let needle = normalize_suggestion_text(text);

        Ok(businesses
            .into_iter()
            .map(|business| {
                let name_normalized = normalize_suggestion_text(&business.name);
                let base_score = if name_normalized == needle {
                    1.0
                } else if name_normalized.starts_with(&needle) {
                    0.8
                } else {
                    0.6
                };

                let mut candidate = SuggestionCandidate::new(
                    business.id.to_string(),
                    SuggestionSourceType::Business,
                    business.name.clone(),
                    base_score,
                );
                candidate.location = Some(business.coordinates);
                candidate.popularity = Some(business.popularity);
                if let Some(category) = business.categories.first() {
                    candidate
                        .metadata
                        .insert("category".to_string(), category.clone());
                }
                candidate
            })
            .take(limit)
            .collect())
    }
}

/// Common directory categories used when no catalog is supplied
static DEFAULT_CATALOG: Lazy<Vec<String>> = Lazy::new(|| {
    [
        "Restaurant", "Cafe", "Bar", "Pizza", "Sushi", "Bakery", "Grocery",
        "Pharmacy", "Gym", "Salon", "Hotel", "Bookstore",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
});

/// Matches against a static category catalog
pub struct CategoryCatalogSource {
    categories: Vec<String>,
}

impl CategoryCatalogSource {
    pub fn new(categories: Vec<String>) -> Self {
        Self { categories }
    }

    pub fn with_default_catalog() -> Self {
        Self::new(DEFAULT_CATALOG.clone())
    }
}

#[async_trait]
impl SuggestionSource for CategoryCatalogSource {
    fn name(&self) -> &str {
        "category-catalog"
    }

    fn source_type(&self) -> SuggestionSourceType {
        SuggestionSourceType::Category
    }

    async fn find_candidates(
        &self,
        text: &str,
        _location: Option<Coordinates>,
        limit: usize,
    ) -> Result<Vec<SuggestionCandidate>> {
        let needle = normalize_suggestion_text(text);
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .categories
            .iter()
            .filter_map(|category| {
                let normalized = normalize_suggestion_text(category);
                let base_score = if normalized.starts_with(&needle) {
                    0.9
                } else if normalized.contains(&needle) {
                    0.6
                } else {
                    return None;
                };

                Some(SuggestionCandidate::new(
                    format!("category:{}", normalized),
                    SuggestionSourceType::Category,
                    category.clone(),
                    base_score,
                ))
            })
            .take(limit)
            .collect())
    }
}
