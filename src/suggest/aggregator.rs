//! Parallel suggestion fan-out with partial-failure tolerance

use moka::future::Cache;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::Clock;
use crate::config::SuggestConfig;
use crate::geo::Coordinates;
use crate::suggest::ranking::RankingEngine;
use crate::suggest::sources::SuggestionSource;
use crate::suggest::{normalize_suggestion_text, RankedSuggestion, SuggestionCandidate};

/// Per-call options
#[derive(Debug, Clone, Copy, Default)]
pub struct SuggestOptions {
    /// Final list length; falls back to the configured default
    pub limit: Option<usize>,
}

/// Fans out to the enabled suggestion sources concurrently, merges and
/// deduplicates their candidates, and hands the result to the ranking engine.
///
/// A failing source contributes zero candidates and is logged; it never
/// aborts the request. Repeated identical calls are short-circuited by a
/// small in-process memo cache.
pub struct SuggestionAggregator {
    sources: Vec<Arc<dyn SuggestionSource>>,
    ranking: RankingEngine,
    memo: Cache<String, Arc<Vec<RankedSuggestion>>>,
    config: SuggestConfig,
}

impl SuggestionAggregator {
    pub fn new(
        sources: Vec<Arc<dyn SuggestionSource>>,
        config: SuggestConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let memo = Cache::builder()
            .max_capacity(config.memo_capacity)
            .time_to_live(Duration::from_secs(config.memo_ttl_secs))
            .build();

        Self {
            sources,
            ranking: RankingEngine::new(&config, clock),
            memo,
            config,
        }
    }

    /// Produce the ordered, truncated autocomplete list for a partial query
    pub async fn suggest(
        &self,
        text: &str,
        location: Option<Coordinates>,
        options: &SuggestOptions,
    ) -> Vec<RankedSuggestion> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Vec::new();
        }
        let limit = options.limit.unwrap_or(self.config.default_limit);

        let memo_key = self.memo_key(trimmed, location, limit);
        if let Some(hit) = self.memo.get(&memo_key).await {
            tracing::debug!(key = %memo_key, "Suggestion memo hit");
            return (*hit).clone();
        }

        let fetches = self.sources.iter().map(|source| {
            let source = source.clone();
            let text = trimmed.to_string();
            let source_limit = self.config.source_limit;
            async move {
                let result = source.find_candidates(&text, location, source_limit).await;
                (source, result)
            }
        });

        let mut merged: HashMap<String, SuggestionCandidate> = HashMap::new();
        for (source, result) in futures::future::join_all(fetches).await {
            match result {
                Ok(candidates) => {
                    for candidate in candidates.into_iter().take(self.config.source_limit) {
                        merge_candidate(&mut merged, candidate);
                    }
                }
                Err(e) => {
                    tracing::warn!(source = source.name(), error = %e, "Suggestion source failed");
                }
            }
        }

        let mut ranked = self
            .ranking
            .rank(merged.into_values().collect(), trimmed, location);
        ranked.truncate(limit);

        self.memo.insert(memo_key, Arc::new(ranked.clone())).await;
        ranked
    }

    fn memo_key(&self, text: &str, location: Option<Coordinates>, limit: usize) -> String {
        // Location is quantized coarsely so small GPS jitter still hits
        let location_token = location
            .map(|c| format!("{:.2}:{:.2}", c.lat, c.lng))
            .unwrap_or_else(|| "-".to_string());
        format!(
            "{}|{}|{}",
            normalize_suggestion_text(text),
            location_token,
            limit
        )
    }
}

/// Keep the highest base score when sources propose the same normalized text
fn merge_candidate(merged: &mut HashMap<String, SuggestionCandidate>, candidate: SuggestionCandidate) {
    match merged.entry(normalize_suggestion_text(&candidate.text)) {
        Entry::Occupied(mut existing) => {
            if candidate.base_score > existing.get().base_score {
                existing.insert(candidate);
            }
        }
        Entry::Vacant(slot) => {
            slot.insert(candidate);
        }
    }
}
