//! Stage scheduling with barrier semantics
//!
//! A [`Plan`] is an ordered list of agent groups and debate checkpoints. Each
//! step starts only after the previous one has settled: every agent of a
//! group has reached a terminal status, or the debate has finished. Agents
//! inside a group run concurrently and in no particular order.

use crate::board::RunEvent;
use crate::debate::{DebateCoordinator, DebateOutcome};
use crate::executor::AgentExecutor;
use crate::session::AnalysisSession;
use council_core::{AgentRole, AgentStatus, Catalog, DebateCheckpoint, Stage, Subgroup};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// One step of a plan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanStep {
    /// Agents run concurrently; the step settles when all of them have
    Group {
        label: &'static str,
        roles: Vec<AgentRole>,
    },
    /// A debate checkpoint
    Debate(DebateCheckpoint),
}

impl PlanStep {
    /// Short label, e.g. `1a` or `debate_b`
    pub fn label(&self) -> &'static str {
        match self {
            Self::Group { label, .. } => *label,
            Self::Debate(checkpoint) => checkpoint.label(),
        }
    }
}

/// Ordered steps of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    steps: Vec<PlanStep>,
}

impl Plan {
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self { steps }
    }

    /// `1a, 1b, 1c, debate_a, stage2, debate_b, stage3, stage4`
    pub fn standard(catalog: &Catalog) -> Self {
        let group = |label, stage, subgroup| PlanStep::Group {
            label,
            roles: catalog.group(stage, subgroup),
        };

        Self::new(vec![
            group("1a", Stage::Intelligence, Some(Subgroup::A)),
            group("1b", Stage::Intelligence, Some(Subgroup::B)),
            group("1c", Stage::Intelligence, Some(Subgroup::C)),
            PlanStep::Debate(DebateCheckpoint::Thesis),
            group("stage2", Stage::Research, None),
            PlanStep::Debate(DebateCheckpoint::RiskAppetite),
            group("stage3", Stage::Risk, None),
            group("stage4", Stage::Decision, None),
        ])
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }
}

/// How a group settled
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GroupOutcome {
    pub label: String,
    pub succeeded: Vec<AgentRole>,
    pub failed: Vec<AgentRole>,
}

impl GroupOutcome {
    pub fn settled(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Per-step outcomes of a plan
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub groups: Vec<GroupOutcome>,
    pub debates: Vec<DebateOutcome>,
}

/// Drives a [`Plan`] against one session
pub struct StageScheduler {
    catalog: Arc<Catalog>,
    executor: AgentExecutor,
    debates: DebateCoordinator,
}

impl StageScheduler {
    pub fn new(catalog: Arc<Catalog>, executor: AgentExecutor, debates: DebateCoordinator) -> Self {
        Self {
            catalog,
            executor,
            debates,
        }
    }

    /// Run every step in order
    pub async fn run_plan(&self, plan: &Plan, session: &AnalysisSession) -> PlanSummary {
        let mut summary = PlanSummary::default();

        for step in plan.steps() {
            session.board.emit(RunEvent::StepStarted {
                step: step.label().to_string(),
            });

            match step {
                PlanStep::Group { label, roles } => {
                    summary.groups.push(self.run_group(label, roles, session).await);
                }
                PlanStep::Debate(checkpoint) => {
                    match self.debates.run_debate(*checkpoint, session).await {
                        Ok(outcome) => summary.debates.push(outcome),
                        Err(e) => warn!(checkpoint = checkpoint.label(), error = %e, "Debate could not run"),
                    }
                }
            }

            session.board.emit(RunEvent::StepSettled {
                step: step.label().to_string(),
            });
        }

        summary
    }

    /// Run every role of a group concurrently and wait for all to settle
    pub async fn run_group(
        &self,
        label: &str,
        roles: &[AgentRole],
        session: &AnalysisSession,
    ) -> GroupOutcome {
        let mut outcome = GroupOutcome {
            label: label.to_string(),
            ..GroupOutcome::default()
        };
        if roles.is_empty() {
            return outcome;
        }

        let prior = Arc::new(session.board.prior_outputs());
        info!(group = label, agents = roles.len(), prior = prior.len(), "Group started");

        let runs = roles.iter().filter_map(|role| {
            let definition = self.catalog.get(*role)?;
            let prior = Arc::clone(&prior);
            Some(async move { (*role, self.executor.run(definition, session, prior).await) })
        });

        for (role, result) in join_all(runs).await {
            match result {
                Ok(AgentStatus::Success) => outcome.succeeded.push(role),
                Ok(_) => outcome.failed.push(role),
                Err(e) => {
                    warn!(agent = role.id(), error = %e, "Agent could not run");
                    outcome.failed.push(role);
                }
            }
        }

        info!(
            group = label,
            succeeded = outcome.succeeded.len(),
            failed = outcome.failed.len(),
            "Group settled"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_plan_shape() {
        let plan = Plan::standard(&Catalog::standard());
        let labels: Vec<_> = plan.steps().iter().map(PlanStep::label).collect();
        assert_eq!(
            labels,
            vec!["1a", "1b", "1c", "debate_a", "stage2", "debate_b", "stage3", "stage4"]
        );

        let sizes: Vec<_> = plan
            .steps()
            .iter()
            .filter_map(|step| match step {
                PlanStep::Group { roles, .. } => Some(roles.len()),
                PlanStep::Debate(_) => None,
            })
            .collect();
        assert_eq!(sizes, vec![3, 5, 3, 4, 4, 2]);
        assert_eq!(sizes.iter().sum::<usize>(), 21);
    }

    #[test]
    fn test_first_group_is_news_social_regional() {
        let plan = Plan::standard(&Catalog::standard());
        assert_eq!(
            plan.steps()[0],
            PlanStep::Group {
                label: "1a",
                roles: vec![
                    AgentRole::NewsAnalyst,
                    AgentRole::SocialSentimentAnalyst,
                    AgentRole::RegionalMarketAnalyst,
                ],
            }
        );
    }
}
