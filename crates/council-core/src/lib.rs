//! Core types for the research council
//!
//! This crate defines the agent catalog, the per-run state machines, the
//! market snapshot and the prior-outputs context shared between stages.

pub mod catalog;
pub mod context;
pub mod error;
pub mod snapshot;
pub mod state;

pub use catalog::{AgentDefinition, AgentRole, Catalog, Stage, Subgroup};
pub use context::PriorOutputs;
pub use error::{Error, Result};
pub use snapshot::{MarketSnapshot, SnapshotDefect};
pub use state::{
    AgentRunState, AgentStatus, DebateCheckpoint, DebateConclusion, DebateMessage, DebateSession,
    DebateStatus, EvidenceSource, estimate_tokens,
};
