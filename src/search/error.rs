//! Error types for search operations

use crate::error::EngineError;

/// Result type for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during a search call
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Query failed validation; no store was contacted
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Spatial store failure; fatal for this call, not retried
    #[error("Spatial store unavailable: {0}")]
    Unavailable(String),

    /// The caller's deadline elapsed mid-flight
    #[error("Search timed out: {0}")]
    Timeout(String),

    /// Result payload could not be encoded
    #[error("Result encoding failed: {0}")]
    Encoding(String),
}

impl From<SearchError> for EngineError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::InvalidQuery(msg) => EngineError::Validation(msg),
            SearchError::Unavailable(msg) => EngineError::SearchUnavailable(msg),
            SearchError::Timeout(msg) => EngineError::Timeout(msg),
            SearchError::Encoding(msg) => EngineError::Serialization(msg),
        }
    }
}
