//! Per-run state store and event stream
//!
//! A [`RunBoard`] holds one slot per catalogued agent and per debate
//! checkpoint. Each slot has its own lock and is written only by the task
//! that owns it (an agent's executor, a checkpoint's coordinator). Every
//! state change is published as a [`RunEvent`] while the slot is still
//! locked, so subscribers see changes to one slot in the order they happened.

use council_core::{
    AgentRole, AgentRunState, AgentStatus, Catalog, DebateCheckpoint, DebateConclusion,
    DebateMessage, DebateSession, Error, EvidenceSource, PriorOutputs, Result,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Progress notifications published during a run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    RunStarted {
        run_id: Uuid,
        subject_id: String,
    },
    StepStarted {
        step: String,
    },
    StepSettled {
        step: String,
    },
    AgentStatusChanged {
        role: AgentRole,
        status: AgentStatus,
    },
    EvidenceResolved {
        role: AgentRole,
        sources: usize,
        from_fallback: bool,
    },
    Thought {
        role: AgentRole,
        cue: String,
    },
    DebateMessage {
        checkpoint: DebateCheckpoint,
        speaker: AgentRole,
        round: u32,
        content: String,
    },
    DebateFinished {
        checkpoint: DebateCheckpoint,
        score: u8,
    },
    Tick {
        elapsed_seconds: u64,
    },
    RunFinished {
        run_id: Uuid,
        elapsed_seconds: u64,
        report_ready: bool,
    },
    RunAborted {
        subject_id: String,
        reason: String,
    },
}

/// Mutable state of one run
pub struct RunBoard {
    agents: BTreeMap<AgentRole, RwLock<AgentRunState>>,
    debates: BTreeMap<DebateCheckpoint, RwLock<DebateSession>>,
    elapsed: AtomicU64,
    events: broadcast::Sender<RunEvent>,
}

impl RunBoard {
    /// A board with every catalogued agent and both debates idle
    pub fn new(catalog: &Catalog, events: broadcast::Sender<RunEvent>) -> Self {
        Self {
            agents: catalog
                .iter()
                .map(|def| (def.role, RwLock::new(AgentRunState::default())))
                .collect(),
            debates: DebateCheckpoint::ALL
                .into_iter()
                .map(|checkpoint| (checkpoint, RwLock::new(DebateSession::new(checkpoint))))
                .collect(),
            elapsed: AtomicU64::new(0),
            events,
        }
    }

    /// Publish an event; dropped silently when nobody is listening
    pub fn emit(&self, event: RunEvent) {
        let _ = self.events.send(event);
    }

    fn slot(&self, role: AgentRole) -> Result<&RwLock<AgentRunState>> {
        self.agents
            .get(&role)
            .ok_or_else(|| Error::UnknownAgent(role.id().to_string()))
    }

    fn debate_slot(&self, checkpoint: DebateCheckpoint) -> &RwLock<DebateSession> {
        // both checkpoints are inserted in `new`
        &self.debates[&checkpoint]
    }

    fn update_agent<T>(
        &self,
        role: AgentRole,
        update: impl FnOnce(&mut AgentRunState) -> Result<T>,
    ) -> Result<T> {
        let mut state = self
            .slot(role)?
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = state.status;
        let value = update(&mut state)?;
        if state.status != before {
            self.emit(RunEvent::AgentStatusChanged {
                role,
                status: state.status,
            });
        }
        Ok(value)
    }

    /// Move an agent forward one status
    pub fn advance(&self, role: AgentRole, next: AgentStatus) -> Result<()> {
        self.update_agent(role, |state| state.advance(next))
    }

    /// Settle an agent as successful
    pub fn succeed(&self, role: AgentRole, output: impl Into<String>) -> Result<()> {
        self.update_agent(role, |state| state.succeed(output))
    }

    /// Settle an agent as failed, keeping the diagnostic as its output
    pub fn fail(&self, role: AgentRole, diagnostic: impl Into<String>) -> Result<()> {
        self.update_agent(role, |state| state.fail(diagnostic))
    }

    /// Attach resolved evidence to an agent
    pub fn set_evidence(
        &self,
        role: AgentRole,
        sources: Vec<EvidenceSource>,
        from_fallback: bool,
    ) -> Result<()> {
        self.update_agent(role, |state| {
            self.emit(RunEvent::EvidenceResolved {
                role,
                sources: sources.len(),
                from_fallback,
            });
            state.evidence_sources = sources;
            Ok(())
        })
    }

    /// Record a progress cue for an agent that has not yet settled
    ///
    /// Returns `false` once the agent has settled, and nothing is recorded.
    pub fn push_thought(&self, role: AgentRole, cue: &str) -> Result<bool> {
        self.update_agent(role, |state| {
            if state.status.is_terminal() {
                return Ok(false);
            }
            state.thoughts.push(cue.to_string());
            self.emit(RunEvent::Thought {
                role,
                cue: cue.to_string(),
            });
            Ok(true)
        })
    }

    /// Current status of an agent; `Idle` for roles not on the board
    pub fn status(&self, role: AgentRole) -> AgentStatus {
        self.agent(role).map_or(AgentStatus::Idle, |state| state.status)
    }

    /// Copy of an agent's state
    pub fn agent(&self, role: AgentRole) -> Option<AgentRunState> {
        self.agents
            .get(&role)
            .map(|slot| slot.read().unwrap_or_else(PoisonError::into_inner).clone())
    }

    /// Copies of every agent's state in catalog order
    pub fn agents(&self) -> Vec<(AgentRole, AgentRunState)> {
        self.agents
            .iter()
            .map(|(role, slot)| {
                (
                    *role,
                    slot.read().unwrap_or_else(PoisonError::into_inner).clone(),
                )
            })
            .collect()
    }

    /// Outputs of every settled agent
    pub fn prior_outputs(&self) -> PriorOutputs {
        self.agents()
            .into_iter()
            .filter(|(_, state)| state.status.is_terminal())
            .map(|(role, state)| (role, state.output))
            .collect()
    }

    /// idle → debating
    pub fn begin_debate(
        &self,
        checkpoint: DebateCheckpoint,
        topic: &str,
        sides: Vec<AgentRole>,
    ) -> Result<()> {
        self.debate_slot(checkpoint)
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .begin(topic, sides)
    }

    /// Append a debate message
    pub fn push_debate_message(
        &self,
        checkpoint: DebateCheckpoint,
        message: DebateMessage,
    ) -> Result<()> {
        let mut session = self
            .debate_slot(checkpoint)
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let event = RunEvent::DebateMessage {
            checkpoint,
            speaker: message.speaker_role,
            round: message.round,
            content: message.content.clone(),
        };
        session.push(message)?;
        self.emit(event);
        Ok(())
    }

    /// debating → finished
    pub fn finish_debate(
        &self,
        checkpoint: DebateCheckpoint,
        conclusion: DebateConclusion,
    ) -> Result<()> {
        let mut session = self
            .debate_slot(checkpoint)
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let score = conclusion.score;
        session.finish(conclusion)?;
        self.emit(RunEvent::DebateFinished { checkpoint, score });
        Ok(())
    }

    /// Copy of a debate session
    pub fn debate(&self, checkpoint: DebateCheckpoint) -> DebateSession {
        self.debate_slot(checkpoint)
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Record elapsed whole seconds
    pub fn set_elapsed(&self, seconds: u64) {
        self.elapsed.store(seconds, Ordering::Relaxed);
    }

    /// Elapsed whole seconds since the run started
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed.load(Ordering::Relaxed)
    }
}
