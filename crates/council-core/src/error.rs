//! Error types for council-core

use crate::state::{AgentStatus, DebateStatus};
use thiserror::Error;

/// Result type alias for council-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for catalog and run-state operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An agent status change that does not follow idle → fetching → analyzing → terminal
    #[error("Invalid agent transition: {from} -> {to}")]
    InvalidTransition {
        /// Status before the attempted change
        from: AgentStatus,
        /// Requested status
        to: AgentStatus,
    },

    /// A debate status change that does not follow idle → debating → finished
    #[error("Invalid debate transition: {from} -> {to}")]
    InvalidDebateTransition {
        /// Status before the attempted change
        from: DebateStatus,
        /// Requested status
        to: DebateStatus,
    },

    /// Agent identifier not present in the catalog
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidTransition {
            from: AgentStatus::Success,
            to: AgentStatus::Fetching,
        };
        assert_eq!(err.to_string(), "Invalid agent transition: success -> fetching");

        let err = Error::UnknownAgent("astrologer".to_string());
        assert_eq!(err.to_string(), "Unknown agent: astrologer");
    }
}
