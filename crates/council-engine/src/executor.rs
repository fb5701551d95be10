//! Execution of a single agent

use crate::instructions::InstructionBuilder;
use crate::market::{EvidenceProvider, EvidenceRecipe, resolve_evidence};
use crate::session::AnalysisSession;
use crate::thoughts::ThoughtStream;
use council_analysis::{AnalysisError, AnalysisRequest, AnalysisService, analyze_with_deadline};
use council_core::{AgentDefinition, AgentStatus, PriorOutputs, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

const REMEDIATION_HINTS: &str = "What you can try:\n\
- Check that the analysis service is running and reachable\n\
- Check that the analysis API key is valid and has quota left\n\
- Start a new run once the service is healthy";

/// Runs one agent from `idle` to a terminal status
pub struct AgentExecutor {
    analysis: Arc<dyn AnalysisService>,
    evidence: Arc<dyn EvidenceProvider>,
    instructions: Arc<InstructionBuilder>,
    deadline: Duration,
    thought_interval: Duration,
}

impl AgentExecutor {
    pub fn new(
        analysis: Arc<dyn AnalysisService>,
        evidence: Arc<dyn EvidenceProvider>,
        instructions: Arc<InstructionBuilder>,
        deadline: Duration,
        thought_interval: Duration,
    ) -> Self {
        Self {
            analysis,
            evidence,
            instructions,
            deadline,
            thought_interval,
        }
    }

    /// Execute `definition` against the run in `session`
    ///
    /// Analysis failures are absorbed: the agent settles to `error` and the
    /// returned status says so. An `Err` only means the agent was not idle
    /// when execution began.
    pub async fn run(
        &self,
        definition: &AgentDefinition,
        session: &AnalysisSession,
        prior_outputs: Arc<PriorOutputs>,
    ) -> Result<AgentStatus> {
        let role = definition.role;
        let board = &session.board;
        let recipe = EvidenceRecipe::for_role(role);

        board.advance(role, AgentStatus::Fetching)?;
        let thoughts = ThoughtStream::start(
            Arc::clone(board),
            role,
            recipe.thought_cues(),
            self.thought_interval,
        );

        let evidence = resolve_evidence(self.evidence.as_ref(), recipe, &session.subject_id).await;
        board.set_evidence(role, evidence.sources, evidence.from_fallback)?;

        board.advance(role, AgentStatus::Analyzing)?;
        let instruction =
            self.instructions
                .render(definition, &session.snapshot, prior_outputs.len());
        let request = AnalysisRequest::new(
            definition.id,
            session.subject_id.as_str(),
            Arc::clone(&session.snapshot),
            prior_outputs,
            instruction,
        );

        let status = match analyze_with_deadline(self.analysis.as_ref(), request, self.deadline).await
        {
            Ok(output) => {
                debug!(agent = definition.id, chars = output.chars().count(), "Agent succeeded");
                board.succeed(role, output)?;
                AgentStatus::Success
            }
            Err(e) => {
                warn!(agent = definition.id, error = %e, "Agent failed");
                board.fail(role, diagnostic(&e))?;
                AgentStatus::Error
            }
        };

        thoughts.stop();
        Ok(status)
    }
}

/// User-facing text stored in place of the output of a failed agent
pub fn diagnostic(error: &AnalysisError) -> String {
    match error {
        AnalysisError::DeadlineExceeded(deadline) => format!(
            "Analysis timed out after {} seconds: the analysis service did not answer in time.\n\n\
             The service may be overloaded. Start a new run later, or raise the analysis deadline.",
            deadline.as_secs()
        ),
        other => format!("Analysis failed: {other}\n\n{REMEDIATION_HINTS}"),
    }
}
