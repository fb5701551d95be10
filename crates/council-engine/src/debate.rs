//! Debate checkpoints
//!
//! A debate is a paced sequence of scripted messages between roles, followed
//! by one scored conclusion. Scripts come from a [`DebateScriptSource`]; the
//! built-in source writes them from the run's snapshot.

use crate::board::RunBoard;
use crate::session::AnalysisSession;
use async_trait::async_trait;
use council_core::{
    AgentRole, DebateCheckpoint, DebateConclusion, DebateMessage, MarketSnapshot, Result,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// One line of a debate script
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedMessage {
    pub speaker: AgentRole,
    pub round: u32,
    pub content: String,
    /// -1.0 (toward the last side) ..= 1.0 (toward the first side)
    pub stance: f64,
}

/// A complete debate, ready to be played out
#[derive(Debug, Clone, PartialEq)]
pub struct DebateScript {
    pub topic: String,
    pub sides: Vec<AgentRole>,
    pub messages: Vec<ScriptedMessage>,
    pub verdict: String,
}

/// Supplies the script for a checkpoint
#[async_trait]
pub trait DebateScriptSource: Send + Sync {
    async fn script(&self, checkpoint: DebateCheckpoint, snapshot: &MarketSnapshot) -> DebateScript;
}

/// Pre-authored scripts for both checkpoints
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinScripts;

#[async_trait]
impl DebateScriptSource for BuiltinScripts {
    async fn script(&self, checkpoint: DebateCheckpoint, snapshot: &MarketSnapshot) -> DebateScript {
        let name = &snapshot.name;
        let price = snapshot.price_display();
        match checkpoint {
            DebateCheckpoint::Thesis => DebateScript {
                topic: format!("Is {name} worth owning at {price}?"),
                sides: vec![AgentRole::BullResearcher, AgentRole::BearResearcher],
                messages: vec![
                    ScriptedMessage {
                        speaker: AgentRole::BullResearcher,
                        round: 1,
                        content: format!(
                            "The intelligence stage shows {name} with a durable franchise and \
                             earnings that support the current price of {price}."
                        ),
                        stance: 0.5,
                    },
                    ScriptedMessage {
                        speaker: AgentRole::BearResearcher,
                        round: 1,
                        content: format!(
                            "Much of that is already priced in. At {price} there is little \
                             margin of safety if growth slows."
                        ),
                        stance: -0.25,
                    },
                    ScriptedMessage {
                        speaker: AgentRole::BullResearcher,
                        round: 2,
                        content: "Cash generation and balance-sheet strength leave room for \
                                  upside surprises that the market is not paying for."
                            .to_string(),
                        stance: 0.5,
                    },
                    ScriptedMessage {
                        speaker: AgentRole::BearResearcher,
                        round: 2,
                        content: "Policy and sentiment risks remain, and a crowded consensus \
                                  can unwind quickly."
                            .to_string(),
                        stance: -0.25,
                    },
                ],
                verdict: format!("The research stage goes forward with a view on {name}."),
            },
            DebateCheckpoint::RiskAppetite => DebateScript {
                topic: format!("How much risk should the council take on {name}?"),
                sides: vec![
                    AgentRole::AggressiveRiskAnalyst,
                    AgentRole::ConservativeRiskAnalyst,
                    AgentRole::NeutralRiskAnalyst,
                ],
                messages: vec![
                    ScriptedMessage {
                        speaker: AgentRole::AggressiveRiskAnalyst,
                        round: 1,
                        content: "The research view has a favourable skew. A full position is \
                                  justified."
                            .to_string(),
                        stance: 0.75,
                    },
                    ScriptedMessage {
                        speaker: AgentRole::ConservativeRiskAnalyst,
                        round: 1,
                        content: format!(
                            "Drawdowns in {name} have been deep before. Size small and keep a \
                             hard stop."
                        ),
                        stance: -0.5,
                    },
                    ScriptedMessage {
                        speaker: AgentRole::NeutralRiskAnalyst,
                        round: 1,
                        content: "Scale in: start at half size and add on confirmation."
                            .to_string(),
                        stance: 0.25,
                    },
                    ScriptedMessage {
                        speaker: AgentRole::AggressiveRiskAnalyst,
                        round: 2,
                        content: "Waiting for confirmation costs the best part of the move."
                            .to_string(),
                        stance: 0.5,
                    },
                    ScriptedMessage {
                        speaker: AgentRole::ConservativeRiskAnalyst,
                        round: 2,
                        content: "Missing part of a move is cheaper than a large loss."
                            .to_string(),
                        stance: -0.5,
                    },
                    ScriptedMessage {
                        speaker: AgentRole::NeutralRiskAnalyst,
                        round: 2,
                        content: "Agreed on a stop. Position size should follow liquidity."
                            .to_string(),
                        stance: 0.0,
                    },
                ],
                verdict: format!("The risk review sets an exposure for {name}."),
            },
        }
    }
}

/// What a finished checkpoint produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DebateOutcome {
    pub checkpoint: DebateCheckpoint,
    pub messages: usize,
    pub score: u8,
}

/// Plays debate scripts onto a [`RunBoard`]
pub struct DebateCoordinator {
    scripts: Arc<dyn DebateScriptSource>,
    message_delay: Duration,
}

impl DebateCoordinator {
    pub fn new(scripts: Arc<dyn DebateScriptSource>, message_delay: Duration) -> Self {
        Self {
            scripts,
            message_delay,
        }
    }

    /// Run the checkpoint for the session's subject
    pub async fn run_debate(
        &self,
        checkpoint: DebateCheckpoint,
        session: &AnalysisSession,
    ) -> Result<DebateOutcome> {
        let script = self.scripts.script(checkpoint, &session.snapshot).await;
        self.play(&session.board, checkpoint, script).await
    }

    /// idle → debating, each message after the delay, conclusion, → finished
    pub async fn play(
        &self,
        board: &RunBoard,
        checkpoint: DebateCheckpoint,
        script: DebateScript,
    ) -> Result<DebateOutcome> {
        info!(checkpoint = checkpoint.label(), topic = %script.topic, "Debate started");
        board.begin_debate(checkpoint, &script.topic, script.sides.clone())?;

        for message in &script.messages {
            tokio::time::sleep(self.message_delay).await;
            board.push_debate_message(
                checkpoint,
                DebateMessage {
                    speaker_role: message.speaker,
                    content: message.content.clone(),
                    round: message.round,
                },
            )?;
        }

        let score = conclusion_score(&script.messages);
        let conclusion = DebateConclusion {
            content: format!(
                "{} Balance of the debate: {} ({score}/100).",
                script.verdict,
                lean(score, &script.sides)
            ),
            score,
        };
        board.finish_debate(checkpoint, conclusion)?;
        info!(checkpoint = checkpoint.label(), score, "Debate finished");

        Ok(DebateOutcome {
            checkpoint,
            messages: script.messages.len(),
            score,
        })
    }
}

/// `round(50 + 50 * mean(stance))` clamped to 0..=100; 50 with no messages
pub fn conclusion_score(messages: &[ScriptedMessage]) -> u8 {
    if messages.is_empty() {
        return 50;
    }
    let mean = messages
        .iter()
        .map(|message| message.stance.clamp(-1.0, 1.0))
        .sum::<f64>()
        / messages.len() as f64;
    (50.0 + 50.0 * mean).round().clamp(0.0, 100.0) as u8
}

fn lean(score: u8, sides: &[AgentRole]) -> String {
    match (score, sides.first(), sides.last()) {
        (56..=100, Some(first), _) => format!("leans toward the {}", first.title()),
        (0..=44, _, Some(last)) => format!("leans toward the {}", last.title()),
        _ => "evenly balanced".to_string(),
    }
}
