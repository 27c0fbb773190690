//! Multi-source autocomplete: candidate shapes, source contract, parallel
//! aggregation, and the deterministic ranking engine.

pub mod aggregator;
pub mod ranking;
pub mod sources;

pub use aggregator::{SuggestOptions, SuggestionAggregator};
pub use ranking::{RankingEngine, RankingWeights};
pub use sources::{BusinessNameSource, CategoryCatalogSource, SuggestionSource};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumString};

use crate::geo::Coordinates;

/// Where a suggestion candidate came from. Declaration order is the tie-break
/// priority used when two candidates score identically.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SuggestionSourceType {
    /// The caller's own past searches
    History,
    /// Business-name matching
    Business,
    /// Category catalog matching
    Category,
    /// Currently-trending searches
    Trending,
    /// Nearby-place names
    Location,
    /// Globally popular queries
    Query,
}

impl SuggestionSourceType {
    /// Tie-break priority; lower wins
    pub fn priority(&self) -> u8 {
        *self as u8
    }
}

/// An unranked item proposed by one suggestion source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionCandidate {
    /// Source-scoped identifier
    pub id: String,

    pub source: SuggestionSourceType,

    /// Suggested completion text
    pub text: String,

    /// Source-local confidence, used only to pick a winner when sources
    /// propose the same text
    pub base_score: f64,

    /// Location of the suggested entity, when it has one
    pub location: Option<Coordinates>,

    /// Global popularity signal, 0-100
    pub popularity: Option<f64>,

    /// When this suggestion was last used (history/trending sources)
    pub last_used_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl SuggestionCandidate {
    pub fn new(id: String, source: SuggestionSourceType, text: String, base_score: f64) -> Self {
        Self {
            id,
            source,
            text,
            base_score,
            location: None,
            popularity: None,
            last_used_at: None,
            metadata: HashMap::new(),
        }
    }
}

/// The externally visible suggestion shape
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedSuggestion {
    pub candidate: SuggestionCandidate,

    /// Composite relevance score; only relative order matters
    pub final_score: f64,

    /// Index in the final ordering
    pub position: usize,
}

/// Lowercase and collapse internal whitespace; the normalization used for
/// dedup and text matching
pub(crate) fn normalize_suggestion_text(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
