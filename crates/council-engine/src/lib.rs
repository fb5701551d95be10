//! Staged multi-agent orchestration for the research council
//!
//! A run takes one subject through four stages of analysis agents with two
//! debate checkpoints in between:
//!
//! ```text
//! 1a → 1b → 1c → debate_a → stage 2 → debate_b → stage 3 → stage 4 → report
//! ```
//!
//! Agents within a group run concurrently; each group is a barrier. Every
//! agent call is bounded by a deadline, and an agent's failure is recorded in
//! its own state without stopping the run.
//!
//! - [`Council`]: validates input, fetches the snapshot and drives the plan
//! - [`StageScheduler`]: runs plan steps with barrier semantics
//! - [`AgentExecutor`]: runs one agent through its status machine
//! - [`DebateCoordinator`]: plays scripted debates at checkpoints
//! - [`ThoughtStream`] and [`Ticker`]: cosmetic cues and the elapsed clock
//! - [`report::assemble`]: projects settled outputs into Markdown

pub mod board;
pub mod cache;
pub mod config;
pub mod debate;
pub mod error;
pub mod executor;
pub mod instructions;
pub mod market;
pub mod report;
pub mod scheduler;
pub mod session;
pub mod thoughts;
pub mod ticker;

#[cfg(test)]
pub(crate) mod testing;

pub use board::{RunBoard, RunEvent};
pub use config::{CouncilConfig, CouncilConfigBuilder};
pub use debate::{BuiltinScripts, DebateCoordinator, DebateOutcome, DebateScript, DebateScriptSource};
pub use error::{CouncilError, Result};
pub use executor::AgentExecutor;
pub use market::{
    EvidenceProvider, EvidenceRecipe, HttpEvidenceProvider, HttpSnapshotProvider,
    SnapshotProvider,
};
pub use scheduler::{GroupOutcome, Plan, PlanStep, PlanSummary, StageScheduler};
pub use session::{AnalysisOutcome, AnalysisSession, Council, CouncilBuilder};
pub use thoughts::ThoughtStream;
pub use ticker::Ticker;
