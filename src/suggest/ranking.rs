//! Deterministic composite scoring for suggestion candidates.
//!
//! Every signal is clamped to [0, 1] before weighting so no single signal can
//! dominate unboundedly. The final score is the plain sum and may exceed 1.0;
//! only relative order matters.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::sync::Arc;

use crate::clock::Clock;
use crate::config::SuggestConfig;
use crate::geo::{self, Coordinates};
use crate::suggest::{normalize_suggestion_text, RankedSuggestion, SuggestionCandidate, SuggestionSourceType};

/// Bonus for an exact case-insensitive text match
const EXACT_MATCH_BONUS: f64 = 0.5;

/// Bonus for a case-insensitive prefix match
const PREFIX_MATCH_BONUS: f64 = 0.3;

/// Weight applied to the clamped popularity signal
const POPULARITY_WEIGHT: f64 = 0.2;

/// Weight applied to the recency signal
const RECENCY_WEIGHT: f64 = 0.1;

/// Age at which the recency signal decays to zero
const RECENCY_WINDOW_DAYS: f64 = 30.0;

/// Per-source weight table; overridable through configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingWeights {
    pub history: f64,
    pub business: f64,
    pub category: f64,
    pub trending: f64,
    pub location: f64,
    pub query: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            history: 0.5,
            business: 0.4,
            category: 0.3,
            trending: 0.2,
            location: 0.2,
            query: 0.1,
        }
    }
}

impl RankingWeights {
    pub fn for_source(&self, source: SuggestionSourceType) -> f64 {
        match source {
            SuggestionSourceType::History => self.history,
            SuggestionSourceType::Business => self.business,
            SuggestionSourceType::Category => self.category,
            SuggestionSourceType::Trending => self.trending,
            SuggestionSourceType::Location => self.location,
            SuggestionSourceType::Query => self.query,
        }
    }
}

/// Assigns each candidate a composite score and produces the final ordered
/// list. Given identical inputs, output order and scores are identical —
/// that determinism is part of the contract.
pub struct RankingEngine {
    weights: RankingWeights,
    min_confidence: f64,
    clock: Arc<dyn Clock>,
}

impl RankingEngine {
    pub fn new(config: &SuggestConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            weights: config.weights.clone(),
            min_confidence: config.min_confidence,
            clock,
        }
    }

    /// Score, filter, and order candidates.
    ///
    /// Ties break by source priority (history > business > category >
    /// trending > location > query), then by candidate text.
    pub fn rank(
        &self,
        candidates: Vec<SuggestionCandidate>,
        query_text: &str,
        location: Option<Coordinates>,
    ) -> Vec<RankedSuggestion> {
        let needle = normalize_suggestion_text(query_text);
        let now = self.clock.now();

        let mut scored: Vec<(f64, SuggestionCandidate)> = candidates
            .into_iter()
            .map(|c| (self.score(&c, &needle, location, now), c))
            .filter(|(score, _)| *score >= self.min_confidence)
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.source.priority().cmp(&b.1.source.priority()))
                .then_with(|| a.1.text.cmp(&b.1.text))
        });

        scored
            .into_iter()
            .enumerate()
            .map(|(position, (final_score, candidate))| RankedSuggestion {
                candidate,
                final_score,
                position,
            })
            .collect()
    }

    fn score(
        &self,
        candidate: &SuggestionCandidate,
        needle: &str,
        location: Option<Coordinates>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> f64 {
        let mut score = 0.0;
        let text = normalize_suggestion_text(&candidate.text);

        if !needle.is_empty() {
            if text == needle {
                score += EXACT_MATCH_BONUS;
            } else if text.starts_with(needle) {
                score += PREFIX_MATCH_BONUS;
            }
        }

        score += self.weights.for_source(candidate.source).clamp(0.0, 1.0);

        if let (Some(query_location), Some(candidate_location)) = (location, candidate.location) {
            score += proximity_bonus(geo::haversine_km(query_location, candidate_location));
        }

        if let Some(popularity) = candidate.popularity {
            score += POPULARITY_WEIGHT * (popularity / 100.0).clamp(0.0, 1.0);
        }

        if let Some(last_used) = candidate.last_used_at {
            let age_days = (now - last_used).num_seconds().max(0) as f64 / 86_400.0;
            score += RECENCY_WEIGHT * (1.0 - age_days / RECENCY_WINDOW_DAYS).clamp(0.0, 1.0);
        }

        score
    }
}

fn proximity_bonus(distance_km: f64) -> f64 {
    if distance_km < 1.0 {
        0.3
    } else if distance_km < 5.0 {
        0.2
    } else if distance_km < 10.0 {
        0.1
    } else {
        0.0
    }
}
