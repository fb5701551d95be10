//! Error types for analysis calls

use std::time::Duration;
use thiserror::Error;

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur while asking the analysis service for an agent's output
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The call did not complete before its deadline
    #[error("Analysis deadline of {}s exceeded", .0.as_secs())]
    DeadlineExceeded(Duration),

    /// The call was cancelled through its token
    #[error("Analysis call cancelled")]
    Cancelled,

    /// The service answered with a non-success HTTP status
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// The service answered but reported failure
    #[error("Analysis service reported failure: {0}")]
    Unsuccessful(String),

    /// The service reported success without any text
    #[error("Analysis service returned an empty result")]
    EmptyResult,

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// HTTP transport error
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl AnalysisError {
    /// Whether the failure came from the deadline rather than the service
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::DeadlineExceeded(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_is_distinct() {
        let err = AnalysisError::DeadlineExceeded(Duration::from_secs(360));
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "Analysis deadline of 360s exceeded");

        assert!(!AnalysisError::EmptyResult.is_timeout());
        assert!(!AnalysisError::Cancelled.is_timeout());
    }
}
