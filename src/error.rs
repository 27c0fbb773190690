use thiserror::Error;

/// Engine error types
#[derive(Error, Debug)]
pub enum EngineError {
    /// Validation errors (bad input; never reaches a store)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Spatial store failure (fatal for that call, not retried internally)
    #[error("Search unavailable: {0}")]
    SearchUnavailable(String),

    /// Deadline exceeded (surfaced, not retried internally)
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Cache errors (logged and treated as a miss, never surfaced by search)
    #[error("Cache error: {0}")]
    Cache(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Get stable error code string
    pub fn error_code(&self) -> &str {
        match self {
            EngineError::Validation(_) => "VALIDATION_ERROR",
            EngineError::SearchUnavailable(_) => "SEARCH_UNAVAILABLE",
            EngineError::Timeout(_) => "TIMEOUT",
            EngineError::Cache(_) => "CACHE_ERROR",
            EngineError::Configuration(_) => "CONFIGURATION_ERROR",
            EngineError::Serialization(_) => "SERIALIZATION_ERROR",
            EngineError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the error is the caller's fault (4xx-equivalent)
    pub fn is_client_error(&self) -> bool {
        matches!(self, EngineError::Validation(_))
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        EngineError::Serialization(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for EngineError {
    fn from(err: validator::ValidationErrors) -> Self {
        EngineError::Validation(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for EngineError {
    fn from(err: config::ConfigError) -> Self {
        EngineError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, EngineError>;
