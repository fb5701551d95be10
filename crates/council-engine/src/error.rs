//! Error types for council runs

use council_core::SnapshotDefect;
use thiserror::Error;

/// Council engine errors
///
/// The first four variants are fatal to a run and are returned to the caller
/// of [`Council::start_analysis`](crate::Council::start_analysis). Per-agent
/// failures never surface here: they are absorbed into the agent's run state.
#[derive(Debug, Error)]
pub enum CouncilError {
    /// A run is already in progress
    #[error("An analysis run is already in progress")]
    AlreadyRunning,

    /// The subject identifier failed format validation
    #[error("Invalid subject id: {0:?} (expected a six-digit code)")]
    InvalidSubject(String),

    /// The snapshot provider failed
    #[error("Snapshot unavailable for {subject}: {reason}")]
    SnapshotUnavailable { subject: String, reason: String },

    /// The snapshot lacks fields every run depends on
    #[error("Snapshot for {subject} failed validation: {defect}")]
    SnapshotInvalid {
        subject: String,
        defect: SnapshotDefect,
    },

    /// Evidence lookup failed
    #[error("Evidence lookup failed: {0}")]
    EvidenceError(String),

    /// Instruction template error
    #[error("Template error: {0}")]
    TemplateError(#[from] minijinja::Error),

    /// Run-state bookkeeping error
    #[error("Run state error: {0}")]
    StateError(#[from] council_core::Error),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl CouncilError {
    /// Whether this error aborts a run before any agent executes
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::AlreadyRunning
                | Self::InvalidSubject(_)
                | Self::SnapshotUnavailable { .. }
                | Self::SnapshotInvalid { .. }
        )
    }
}

/// Result type alias for council operations
pub type Result<T> = std::result::Result<T, CouncilError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CouncilError::InvalidSubject("AAPL".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid subject id: \"AAPL\" (expected a six-digit code)"
        );

        let err = CouncilError::SnapshotInvalid {
            subject: "600519".to_string(),
            defect: SnapshotDefect::UnresolvedPrice,
        };
        assert_eq!(
            err.to_string(),
            "Snapshot for 600519 failed validation: price is unresolved"
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(CouncilError::AlreadyRunning.is_fatal());
        assert!(
            CouncilError::SnapshotUnavailable {
                subject: "600519".to_string(),
                reason: "timeout".to_string(),
            }
            .is_fatal()
        );
        assert!(!CouncilError::EvidenceError("down".to_string()).is_fatal());
        assert!(!CouncilError::ConfigError("bad".to_string()).is_fatal());
    }

    #[test]
    fn test_state_error_conversion() {
        let core_err = council_core::Error::UnknownAgent("x".to_string());
        let err: CouncilError = core_err.into();
        assert!(matches!(err, CouncilError::StateError(_)));
    }
}
