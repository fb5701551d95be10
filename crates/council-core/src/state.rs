//! Per-run mutable state: agent run states and debate sessions
//!
//! Both types enforce their own state machines. An [`AgentRunState`] only
//! moves forward along `idle → fetching → analyzing → {success | error}` and a
//! [`DebateSession`] only along `idle → debating → finished`.

use crate::catalog::AgentRole;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of one agent within a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    #[default]
    Idle,
    Fetching,
    Analyzing,
    Success,
    Error,
}

impl AgentStatus {
    /// Whether the agent has settled
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Error)
    }

    /// Whether the agent is currently executing
    pub fn is_active(self) -> bool {
        matches!(self, Self::Fetching | Self::Analyzing)
    }

    /// Whether `next` is the only legal successor of `self`
    pub fn can_advance_to(self, next: AgentStatus) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Fetching)
                | (Self::Fetching, Self::Analyzing)
                | (Self::Analyzing, Self::Success | Self::Error)
        )
    }

    /// Lowercase name
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Fetching => "fetching",
            Self::Analyzing => "analyzing",
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An auxiliary reference surfaced to justify an agent's output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceSource {
    /// Source name
    pub source: String,
    /// Number of items retrieved from the source
    pub count: u64,
    /// Optional human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl EvidenceSource {
    /// Create a source entry
    pub fn new(source: impl Into<String>, count: u64) -> Self {
        Self {
            source: source.into(),
            count,
            description: None,
        }
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Session-scoped state of one agent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRunState {
    /// Current status
    pub status: AgentStatus,
    /// Analysis text on success, diagnostic on error
    pub output: String,
    /// Approximate size of a successful output, for display; 0 otherwise
    pub token_estimate: usize,
    /// Evidence surfaced for this agent
    pub evidence_sources: Vec<EvidenceSource>,
    /// Cosmetic progress cues
    pub thoughts: Vec<String>,
}

impl AgentRunState {
    /// Move to the next status, rejecting anything but a forward step
    pub fn advance(&mut self, next: AgentStatus) -> Result<()> {
        if !self.status.can_advance_to(next) {
            return Err(Error::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Record a successful analysis
    pub fn succeed(&mut self, output: impl Into<String>) -> Result<()> {
        self.advance(AgentStatus::Success)?;
        self.output = output.into();
        self.token_estimate = estimate_tokens(&self.output);
        Ok(())
    }

    /// Record a failed analysis; the diagnostic takes the place of the output
    ///
    /// A diagnostic is not analysis, so the token estimate stays at 0.
    pub fn fail(&mut self, diagnostic: impl Into<String>) -> Result<()> {
        self.advance(AgentStatus::Error)?;
        self.output = diagnostic.into();
        Ok(())
    }
}

/// Approximate token count of a text: `ceil(chars / 1.5)`
pub fn estimate_tokens(text: &str) -> usize {
    let chars = text.chars().count();
    (chars * 2).div_ceil(3)
}

/// Lifecycle status of a debate checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebateStatus {
    #[default]
    Idle,
    Debating,
    Finished,
}

impl fmt::Display for DebateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::Debating => "debating",
            Self::Finished => "finished",
        })
    }
}

/// The two debate checkpoints of the plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebateCheckpoint {
    /// Bull against bear, after the intelligence stage
    Thesis,
    /// Risk appetites, after the research stage
    RiskAppetite,
}

impl DebateCheckpoint {
    /// Both checkpoints in plan order
    pub const ALL: [DebateCheckpoint; 2] = [DebateCheckpoint::Thesis, DebateCheckpoint::RiskAppetite];

    /// Short label
    pub fn label(self) -> &'static str {
        match self {
            Self::Thesis => "debate_a",
            Self::RiskAppetite => "debate_b",
        }
    }
}

/// One utterance in a debate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateMessage {
    /// Speaking role
    pub speaker_role: AgentRole,
    /// What was said
    pub content: String,
    /// 1-based round number
    pub round: u32,
}

/// Final scored outcome of a debate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateConclusion {
    /// Summary text
    pub content: String,
    /// 0..=100, above 50 leans toward the first side
    pub score: u8,
}

/// State of one debate checkpoint within a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebateSession {
    /// Which checkpoint this session belongs to
    pub checkpoint: DebateCheckpoint,
    /// Debate topic
    pub topic: String,
    /// Participating roles
    pub sides: Vec<AgentRole>,
    /// Current status
    pub status: DebateStatus,
    /// Messages in emission order
    pub messages: Vec<DebateMessage>,
    /// Set once the debate has finished
    pub conclusion: Option<DebateConclusion>,
}

impl DebateSession {
    /// Create an idle session for a checkpoint
    pub fn new(checkpoint: DebateCheckpoint) -> Self {
        Self {
            checkpoint,
            topic: String::new(),
            sides: Vec::new(),
            status: DebateStatus::Idle,
            messages: Vec::new(),
            conclusion: None,
        }
    }

    /// idle → debating
    pub fn begin(&mut self, topic: impl Into<String>, sides: Vec<AgentRole>) -> Result<()> {
        if self.status != DebateStatus::Idle {
            return Err(Error::InvalidDebateTransition {
                from: self.status,
                to: DebateStatus::Debating,
            });
        }
        self.topic = topic.into();
        self.sides = sides;
        self.status = DebateStatus::Debating;
        Ok(())
    }

    /// Append a message; only legal while debating
    pub fn push(&mut self, message: DebateMessage) -> Result<()> {
        if self.status != DebateStatus::Debating {
            return Err(Error::InvalidDebateTransition {
                from: self.status,
                to: DebateStatus::Debating,
            });
        }
        self.messages.push(message);
        Ok(())
    }

    /// debating → finished
    pub fn finish(&mut self, conclusion: DebateConclusion) -> Result<()> {
        if self.status != DebateStatus::Debating {
            return Err(Error::InvalidDebateTransition {
                from: self.status,
                to: DebateStatus::Finished,
            });
        }
        self.conclusion = Some(conclusion);
        self.status = DebateStatus::Finished;
        Ok(())
    }
}
