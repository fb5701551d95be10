//! Run control
//!
//! [`Council`] owns everything that outlives a single run (catalog, plan,
//! providers, event channel) and creates a fresh [`AnalysisSession`] for each
//! run. Only one run may be active at a time.

use crate::board::{RunBoard, RunEvent};
use crate::config::CouncilConfig;
use crate::debate::{BuiltinScripts, DebateCoordinator, DebateOutcome, DebateScriptSource};
use crate::error::{CouncilError, Result};
use crate::executor::AgentExecutor;
use crate::instructions::InstructionBuilder;
use crate::market::{EvidenceProvider, SnapshotProvider};
use crate::report;
use crate::scheduler::{GroupOutcome, Plan, StageScheduler};
use crate::ticker::Ticker;
use chrono::{DateTime, Utc};
use council_analysis::AnalysisService;
use council_core::{
    AgentRole, AgentRunState, Catalog, DebateCheckpoint, DebateSession, MarketSnapshot,
};
use regex::Regex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{info, instrument, warn};
use uuid::Uuid;

const SUBJECT_PATTERN: &str = r"^[0-9]{6}$";

/// Context of one run
pub struct AnalysisSession {
    pub run_id: Uuid,
    pub subject_id: String,
    pub snapshot: Arc<MarketSnapshot>,
    pub started_at: DateTime<Utc>,
    pub board: Arc<RunBoard>,
}

impl AnalysisSession {
    pub fn new(subject_id: impl Into<String>, snapshot: MarketSnapshot, board: RunBoard) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            subject_id: subject_id.into(),
            snapshot: Arc::new(snapshot),
            started_at: Utc::now(),
            board: Arc::new(board),
        }
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.board.elapsed_seconds()
    }
}

/// Result of a completed run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutcome {
    pub run_id: Uuid,
    pub subject_id: String,
    pub groups: Vec<GroupOutcome>,
    pub debates: Vec<DebateOutcome>,
    pub elapsed_seconds: u64,
    pub report: Option<String>,
}

/// Holds the running flag for the duration of a run
struct RunGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> RunGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// The research council
///
/// # Example
///
/// ```no_run
/// use council_analysis::http::{HttpAnalysisConfig, HttpAnalysisService};
/// use council_engine::{Council, CouncilConfig, HttpEvidenceProvider, HttpSnapshotProvider};
/// use std::sync::Arc;
///
/// # async fn run() -> council_engine::Result<()> {
/// let config = CouncilConfig::from_env()?;
/// let analysis = HttpAnalysisService::with_config(
///     HttpAnalysisConfig::from_env().with_deadline(config.analysis_deadline),
/// )
/// .map_err(|e| council_engine::CouncilError::ConfigError(e.to_string()))?;
///
/// let council = Council::builder()
///     .snapshot_provider(Arc::new(HttpSnapshotProvider::new(&config)?))
///     .evidence_provider(Arc::new(HttpEvidenceProvider::new(&config)?))
///     .analysis_service(Arc::new(analysis))
///     .config(config)
///     .build()?;
///
/// let outcome = council.start_analysis("600519").await?;
/// println!("{}", outcome.report.unwrap_or_default());
/// # Ok(())
/// # }
/// ```
pub struct Council {
    catalog: Arc<Catalog>,
    plan: Plan,
    config: CouncilConfig,
    snapshots: Arc<dyn SnapshotProvider>,
    scheduler: StageScheduler,
    subject_pattern: Regex,
    running: AtomicBool,
    current: RwLock<Option<Arc<AnalysisSession>>>,
    events: broadcast::Sender<RunEvent>,
}

impl Council {
    /// Create a new council builder
    pub fn builder() -> CouncilBuilder {
        CouncilBuilder::default()
    }

    /// Run the full plan for `subject_id`
    ///
    /// Fails without running any agent if a run is already active, the
    /// subject is not a six-digit code, or the snapshot cannot be fetched or
    /// is unusable. Agent failures do not fail the run.
    #[instrument(skip(self))]
    pub async fn start_analysis(&self, subject_id: &str) -> Result<AnalysisOutcome> {
        if self.is_running() {
            return Err(CouncilError::AlreadyRunning);
        }
        let subject_id = subject_id.trim();
        if !self.subject_pattern.is_match(subject_id) {
            return Err(CouncilError::InvalidSubject(subject_id.to_string()));
        }
        let _guard = RunGuard::acquire(&self.running).ok_or(CouncilError::AlreadyRunning)?;

        let result = self.run(subject_id).await;
        if let Err(e) = &result {
            warn!(error = %e, "Run aborted");
            let _ = self.events.send(RunEvent::RunAborted {
                subject_id: subject_id.to_string(),
                reason: e.to_string(),
            });
        }
        result
    }

    async fn run(&self, subject_id: &str) -> Result<AnalysisOutcome> {
        self.replace_session(None);

        let snapshot = self
            .snapshots
            .fetch(subject_id)
            .await
            .map_err(|e| match e {
                e @ CouncilError::SnapshotUnavailable { .. } => e,
                other => CouncilError::SnapshotUnavailable {
                    subject: subject_id.to_string(),
                    reason: other.to_string(),
                },
            })?;
        snapshot
            .validate(subject_id)
            .map_err(|defect| CouncilError::SnapshotInvalid {
                subject: subject_id.to_string(),
                defect,
            })?;

        let board = RunBoard::new(&self.catalog, self.events.clone());
        let session = Arc::new(AnalysisSession::new(subject_id, snapshot, board));
        self.replace_session(Some(Arc::clone(&session)));

        info!(run_id = %session.run_id, name = %session.snapshot.name, "Run started");
        session.board.emit(RunEvent::RunStarted {
            run_id: session.run_id,
            subject_id: subject_id.to_string(),
        });

        let started = Instant::now();
        let ticker = Ticker::start(Arc::clone(&session.board), started, self.config.tick_interval);
        let summary = self.scheduler.run_plan(&self.plan, &session).await;
        drop(ticker);

        let elapsed_seconds = started.elapsed().as_secs();
        session.board.set_elapsed(elapsed_seconds);

        let report = report::assemble(&self.catalog, &session);
        session.board.emit(RunEvent::RunFinished {
            run_id: session.run_id,
            elapsed_seconds,
            report_ready: report.is_some(),
        });
        info!(run_id = %session.run_id, elapsed_seconds, "Run finished");

        Ok(AnalysisOutcome {
            run_id: session.run_id,
            subject_id: subject_id.to_string(),
            groups: summary.groups,
            debates: summary.debates,
            elapsed_seconds,
            report,
        })
    }

    fn replace_session(&self, session: Option<Arc<AnalysisSession>>) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = session;
    }

    /// The latest run's session, if its snapshot was accepted
    pub fn current_session(&self) -> Option<Arc<AnalysisSession>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every agent's state in catalog order; all idle when there is no session
    pub fn agent_states(&self) -> Vec<(AgentRole, AgentRunState)> {
        match self.current_session() {
            Some(session) => session.board.agents(),
            None => self
                .catalog
                .iter()
                .map(|def| (def.role, AgentRunState::default()))
                .collect(),
        }
    }

    /// One agent's state
    pub fn agent_state(&self, role: AgentRole) -> AgentRunState {
        self.current_session()
            .and_then(|session| session.board.agent(role))
            .unwrap_or_default()
    }

    /// A debate checkpoint's state
    pub fn debate(&self, checkpoint: DebateCheckpoint) -> DebateSession {
        self.current_session().map_or_else(
            || DebateSession::new(checkpoint),
            |session| session.board.debate(checkpoint),
        )
    }

    /// Elapsed seconds of the latest run
    pub fn elapsed_seconds(&self) -> u64 {
        self.current_session()
            .map_or(0, |session| session.elapsed_seconds())
    }

    /// The latest run's report, once its final decision has settled
    pub fn report(&self) -> Option<String> {
        let session = self.current_session()?;
        report::assemble(&self.catalog, &session)
    }

    /// Whether a run is in progress
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Subscribe to run events
    pub fn subscribe(&self) -> broadcast::Receiver<RunEvent> {
        self.events.subscribe()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }

    pub fn config(&self) -> &CouncilConfig {
        &self.config
    }
}

/// Builder for [`Council`]
#[derive(Default)]
pub struct CouncilBuilder {
    catalog: Option<Catalog>,
    plan: Option<Plan>,
    config: Option<CouncilConfig>,
    snapshots: Option<Arc<dyn SnapshotProvider>>,
    evidence: Option<Arc<dyn EvidenceProvider>>,
    analysis: Option<Arc<dyn AnalysisService>>,
    scripts: Option<Arc<dyn DebateScriptSource>>,
}

impl CouncilBuilder {
    /// Use a custom catalog instead of the standard one
    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Use a custom plan instead of the standard one
    pub fn plan(mut self, plan: Plan) -> Self {
        self.plan = Some(plan);
        self
    }

    /// Set the configuration
    pub fn config(mut self, config: CouncilConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the snapshot provider (required)
    pub fn snapshot_provider(mut self, provider: Arc<dyn SnapshotProvider>) -> Self {
        self.snapshots = Some(provider);
        self
    }

    /// Set the evidence provider (required)
    pub fn evidence_provider(mut self, provider: Arc<dyn EvidenceProvider>) -> Self {
        self.evidence = Some(provider);
        self
    }

    /// Set the analysis service (required)
    pub fn analysis_service(mut self, service: Arc<dyn AnalysisService>) -> Self {
        self.analysis = Some(service);
        self
    }

    /// Set the debate script source; defaults to [`BuiltinScripts`]
    pub fn debate_scripts(mut self, scripts: Arc<dyn DebateScriptSource>) -> Self {
        self.scripts = Some(scripts);
        self
    }

    /// Build the council
    pub fn build(self) -> Result<Council> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let snapshots = self.snapshots.ok_or_else(|| {
            CouncilError::ConfigError("a snapshot provider is required".to_string())
        })?;
        let evidence = self.evidence.ok_or_else(|| {
            CouncilError::ConfigError("an evidence provider is required".to_string())
        })?;
        let analysis = self.analysis.ok_or_else(|| {
            CouncilError::ConfigError("an analysis service is required".to_string())
        })?;
        let scripts = self
            .scripts
            .unwrap_or_else(|| Arc::new(BuiltinScripts));

        let catalog = Arc::new(self.catalog.unwrap_or_default());
        let plan = self.plan.unwrap_or_else(|| Plan::standard(&catalog));
        let subject_pattern = Regex::new(SUBJECT_PATTERN)
            .map_err(|e| CouncilError::ConfigError(format!("invalid subject pattern: {e}")))?;

        let executor = AgentExecutor::new(
            analysis,
            evidence,
            Arc::new(InstructionBuilder::new(&catalog)?),
            config.analysis_deadline,
            config.thought_interval,
        );
        let debates = DebateCoordinator::new(scripts, config.debate_message_delay);
        let (events, _) = broadcast::channel(config.event_capacity);

        Ok(Council {
            scheduler: StageScheduler::new(Arc::clone(&catalog), executor, debates),
            catalog,
            plan,
            config,
            snapshots,
            subject_pattern,
            running: AtomicBool::new(false),
            current: RwLock::new(None),
            events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::PlanStep;
    use crate::testing::{
        ScriptedAnalysis, council, council_with, failing_snapshot_provider, moutai,
        offline_evidence, snapshot_provider,
    };
    use council_core::{AgentStatus, DebateStatus, SnapshotDefect};
    use std::collections::{HashMap, HashSet};
    use std::time::Duration;
    use tokio_test::{assert_err, assert_ok};

    fn drain(rx: &mut broadcast::Receiver<RunEvent>) -> Vec<RunEvent> {
        std::iter::from_fn(|| rx.try_recv().ok()).collect()
    }

    fn status_events(events: &[RunEvent]) -> Vec<(AgentRole, AgentStatus)> {
        events
            .iter()
            .filter_map(|event| match event {
                RunEvent::AgentStatusChanged { role, status } => Some((*role, *status)),
                _ => None,
            })
            .collect()
    }

    fn varied_latency() -> ScriptedAnalysis {
        AgentRole::ALL
            .into_iter()
            .enumerate()
            .fold(ScriptedAnalysis::new(Duration::from_secs(1)), |analysis, (i, role)| {
                analysis.delay(role, Duration::from_millis(300 + (i as u64 * 7919) % 4000))
            })
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_run_settles_every_agent_and_debate() {
        let analysis = Arc::new(ScriptedAnalysis::new(Duration::from_secs(2)));
        let council = council(Arc::clone(&analysis));

        let outcome = assert_ok!(council.start_analysis("600519").await);

        assert_eq!(analysis.calls(), 21);
        assert_eq!(outcome.groups.len(), 6);
        assert!(outcome.groups.iter().all(|group| group.failed.is_empty()));
        assert_eq!(outcome.debates.len(), 2);
        assert!(outcome.report.is_some());
        assert!(!council.is_running());
        assert!(council
            .agent_states()
            .iter()
            .all(|(_, state)| state.status == AgentStatus::Success));
        for checkpoint in DebateCheckpoint::ALL {
            assert_eq!(council.debate(checkpoint).status, DebateStatus::Finished);
        }

        // six groups of two seconds plus ten debate messages of 1.5 seconds
        assert_eq!(outcome.elapsed_seconds, 27);
        assert_eq!(council.elapsed_seconds(), 27);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_group_settles_without_calls() {
        let analysis = Arc::new(ScriptedAnalysis::new(Duration::from_secs(1)));
        let council = Council::builder()
            .snapshot_provider(Arc::new(snapshot_provider(moutai())))
            .evidence_provider(Arc::new(offline_evidence()))
            .analysis_service(Arc::clone(&analysis) as Arc<dyn AnalysisService>)
            .plan(Plan::new(vec![PlanStep::Group {
                label: "empty",
                roles: vec![],
            }]))
            .build()
            .unwrap();
        let mut rx = council.subscribe();

        let outcome = assert_ok!(council.start_analysis("600519").await);

        assert_eq!(analysis.calls(), 0);
        assert_eq!(
            outcome.groups,
            vec![GroupOutcome {
                label: "empty".to_string(),
                succeeded: vec![],
                failed: vec![],
            }]
        );
        assert!(outcome.debates.is_empty());
        assert!(outcome.report.is_none());
        assert!(!council.is_running());

        let events = drain(&mut rx);
        assert!(events
            .iter()
            .any(|event| matches!(event, RunEvent::StepSettled { step } if step == "empty")));
        assert!(status_events(&events).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_group_starts_before_the_previous_step_settles() {
        let council = council(Arc::new(varied_latency()));
        let mut rx = council.subscribe();

        assert_ok!(council.start_analysis("600519").await);
        let events = drain(&mut rx);

        let group_of: HashMap<AgentRole, &'static str> = council
            .plan()
            .steps()
            .iter()
            .filter_map(|step| match step {
                PlanStep::Group { label, roles } => {
                    Some(roles.iter().map(move |role| (*role, *label)))
                }
                PlanStep::Debate(_) => None,
            })
            .flatten()
            .collect();

        let mut current_step: Option<String> = None;
        let mut settled: HashSet<AgentRole> = HashSet::new();
        let mut steps_seen = Vec::new();
        for event in &events {
            match event {
                RunEvent::StepStarted { step } => {
                    assert!(current_step.is_none(), "{step} started inside another step");
                    current_step = Some(step.clone());
                }
                RunEvent::StepSettled { step } => {
                    assert_eq!(current_step.as_deref(), Some(step.as_str()));
                    let unsettled: Vec<_> = group_of
                        .iter()
                        .filter(|(role, label)| **label == step && !settled.contains(*role))
                        .collect();
                    assert!(unsettled.is_empty(), "{step} settled with {unsettled:?} active");
                    steps_seen.push(step.clone());
                    current_step = None;
                }
                RunEvent::AgentStatusChanged { role, status } => {
                    assert_eq!(current_step.as_deref(), Some(group_of[role]), "{role} ran outside its group");
                    if status.is_terminal() {
                        settled.insert(*role);
                    }
                }
                RunEvent::DebateMessage { .. } | RunEvent::DebateFinished { .. } => {
                    assert!(current_step.as_deref().is_some_and(|step| step.starts_with("debate")));
                }
                _ => {}
            }
        }

        assert_eq!(
            steps_seen,
            vec!["1a", "1b", "1c", "debate_a", "stage2", "debate_b", "stage3", "stage4"]
        );
        assert_eq!(settled.len(), 21);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_sequences_are_monotone() {
        let analysis = varied_latency()
            .fail(AgentRole::PolicyAnalyst, "model overloaded")
            .delay(AgentRole::QuantStrategist, Duration::from_secs(500));
        let council = council(Arc::new(analysis));
        let mut rx = council.subscribe();

        assert_ok!(council.start_analysis("600519").await);

        let mut sequences: HashMap<AgentRole, Vec<AgentStatus>> = HashMap::new();
        for (role, status) in status_events(&drain(&mut rx)) {
            sequences.entry(role).or_default().push(status);
        }

        assert_eq!(sequences.len(), 21);
        for (role, sequence) in sequences {
            let expected_end = match role {
                AgentRole::PolicyAnalyst | AgentRole::QuantStrategist => AgentStatus::Error,
                _ => AgentStatus::Success,
            };
            assert_eq!(
                sequence,
                vec![AgentStatus::Fetching, AgentStatus::Analyzing, expected_end],
                "{role}"
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sentinel_price_aborts_before_any_agent_runs() {
        let snapshot: MarketSnapshot = serde_json::from_value(serde_json::json!({
            "subjectId": "600519",
            "name": "Kweichow Moutai",
            "price": "--"
        }))
        .unwrap();
        let mut evidence = crate::market::evidence::MockEvidenceProvider::new();
        evidence.expect_fetch().never();
        let analysis = Arc::new(ScriptedAnalysis::new(Duration::from_secs(1)));
        let council = council_with(snapshot_provider(snapshot), evidence, Arc::clone(&analysis));
        let mut rx = council.subscribe();

        let err = assert_err!(council.start_analysis("600519").await);

        assert!(matches!(
            err,
            CouncilError::SnapshotInvalid {
                defect: SnapshotDefect::UnresolvedPrice,
                ..
            }
        ));
        assert_eq!(analysis.calls(), 0);
        assert!(council
            .agent_states()
            .iter()
            .all(|(_, state)| state.status == AgentStatus::Idle));
        assert!(council.current_session().is_none());
        assert!(council.report().is_none());
        assert!(!council.is_running());

        let events = drain(&mut rx);
        assert!(status_events(&events).is_empty());
        assert!(matches!(events.as_slice(), [RunEvent::RunAborted { .. }]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_positive_price_is_rejected() {
        let mut snapshot = moutai();
        snapshot.price = Some(0.0);
        let analysis = Arc::new(ScriptedAnalysis::new(Duration::from_secs(1)));
        let council = council_with(snapshot_provider(snapshot), offline_evidence(), Arc::clone(&analysis));

        let err = assert_err!(council.start_analysis("600519").await);
        assert!(matches!(
            err,
            CouncilError::SnapshotInvalid {
                defect: SnapshotDefect::SentinelPrice(_),
                ..
            }
        ));
        assert_eq!(analysis.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_failure_is_fatal_and_cleaned_up() {
        let analysis = Arc::new(ScriptedAnalysis::new(Duration::from_secs(1)));
        let council = council_with(
            failing_snapshot_provider("quote feed down"),
            offline_evidence(),
            Arc::clone(&analysis),
        );

        let err = assert_err!(council.start_analysis("600519").await);
        assert!(err.is_fatal());
        assert!(matches!(
            err,
            CouncilError::SnapshotUnavailable { ref reason, .. } if reason.contains("quote feed down")
        ));
        assert_eq!(analysis.calls(), 0);
        assert!(!council.is_running());

        // the gate is released, so the next attempt reaches the provider again
        let err = assert_err!(council.start_analysis("600519").await);
        assert!(matches!(err, CouncilError::SnapshotUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_invalid_subject_is_rejected() {
        let analysis = Arc::new(ScriptedAnalysis::new(Duration::ZERO));
        let mut snapshots = crate::market::snapshot::MockSnapshotProvider::new();
        snapshots.expect_fetch().never();
        let council = council_with(snapshots, offline_evidence(), Arc::clone(&analysis));

        for subject in ["60051", "6005190", "AAPL", "", "60o519"] {
            let err = assert_err!(council.start_analysis(subject).await);
            assert!(matches!(err, CouncilError::InvalidSubject(_)), "{subject}");
        }
        assert!(!council.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_run_is_rejected_while_one_is_active() {
        let analysis = Arc::new(ScriptedAnalysis::new(Duration::from_secs(5)));
        let council = Arc::new(council(analysis));

        let background = Arc::clone(&council);
        let first = tokio::spawn(async move { background.start_analysis("600519").await });

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(council.is_running());
        let err = assert_err!(council.start_analysis("000858").await);
        assert!(matches!(err, CouncilError::AlreadyRunning));

        assert_ok!(first.await.unwrap());
        assert!(!council.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_timeout_still_completes_the_run() {
        let analysis = Arc::new(ScriptedAnalysis::new(Duration::from_secs(400)));
        let council = council(Arc::clone(&analysis));

        let outcome = assert_ok!(council.start_analysis("600519").await);

        assert_eq!(analysis.calls(), 21);
        assert_eq!(outcome.groups.len(), 6);
        for group in &outcome.groups {
            assert!(group.succeeded.is_empty(), "{}", group.label);
            assert!(!group.failed.is_empty(), "{}", group.label);
        }
        assert_eq!(outcome.debates.len(), 2);
        for (_, state) in council.agent_states() {
            assert_eq!(state.status, AgentStatus::Error);
            assert!(state.output.starts_with("Analysis timed out after 360 seconds"));
        }

        // six groups bounded by the deadline, never by the 400 second calls
        assert!(outcome.elapsed_seconds >= 6 * 360);
        assert!(outcome.elapsed_seconds < 6 * 400);
        assert!(outcome.report.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_subgroup_settles_before_the_next_starts() {
        let analysis = ScriptedAnalysis::new(Duration::from_secs(1))
            .delay(AgentRole::NewsAnalyst, Duration::from_secs(3))
            .delay(AgentRole::SocialSentimentAnalyst, Duration::from_secs(1))
            .delay(AgentRole::RegionalMarketAnalyst, Duration::from_secs(2));
        let analysis = Arc::new(analysis);
        let council = council(Arc::clone(&analysis));
        let mut rx = council.subscribe();

        assert_ok!(council.start_analysis("600519").await);
        let statuses = status_events(&drain(&mut rx));

        let first_group = [
            AgentRole::NewsAnalyst,
            AgentRole::SocialSentimentAnalyst,
            AgentRole::RegionalMarketAnalyst,
        ];
        let completions: Vec<_> = statuses
            .iter()
            .filter(|(role, status)| first_group.contains(role) && status.is_terminal())
            .map(|(role, _)| *role)
            .collect();
        assert_eq!(
            completions,
            vec![
                AgentRole::SocialSentimentAnalyst,
                AgentRole::RegionalMarketAnalyst,
                AgentRole::NewsAnalyst,
            ]
        );

        let last_completion = statuses
            .iter()
            .position(|(role, status)| *role == AgentRole::NewsAnalyst && status.is_terminal())
            .unwrap();
        let first_next_start = statuses
            .iter()
            .position(|(role, _)| role.subgroup() == Some(council_core::Subgroup::B))
            .unwrap();
        assert!(last_completion < first_next_start);

        for role in first_group {
            assert_eq!(analysis.prior_count(role), Some(0));
        }
        assert_eq!(analysis.prior_count(AgentRole::MacroEconomist), Some(3));
        assert_eq!(analysis.prior_count(AgentRole::BullResearcher), Some(11));
        assert_eq!(analysis.prior_count(AgentRole::PortfolioManager), Some(19));
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_timeout_is_isolated() {
        let analysis = ScriptedAnalysis::new(Duration::from_secs(1))
            .delay(AgentRole::NewsAnalyst, Duration::from_secs(400));
        let council = council(Arc::new(analysis));

        let outcome = assert_ok!(council.start_analysis("600519").await);

        let news = council.agent_state(AgentRole::NewsAnalyst);
        assert_eq!(news.status, AgentStatus::Error);
        assert!(news.output.contains("timed out after 360 seconds"));
        assert_eq!(news.token_estimate, 0);
        assert_eq!(outcome.groups[0].failed, vec![AgentRole::NewsAnalyst]);
        assert!(council
            .agent_states()
            .iter()
            .filter(|(role, _)| *role != AgentRole::NewsAnalyst)
            .all(|(_, state)| state.status == AgentStatus::Success));

        let report = outcome.report.unwrap();
        assert!(report.contains("### News Analyst (analysis failed)"));
        assert!(report.contains("timed out after 360 seconds"));
        assert!(report.contains("### Portfolio Manager\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_generic_failure_carries_remediation_hints() {
        let analysis = ScriptedAnalysis::new(Duration::from_secs(1))
            .fail(AgentRole::Trader, "quota exhausted");
        let council = council(Arc::new(analysis));

        assert_ok!(council.start_analysis("600519").await);

        let trader = council.agent_state(AgentRole::Trader);
        assert_eq!(trader.status, AgentStatus::Error);
        assert!(trader.output.contains("quota exhausted"));
        assert!(trader.output.contains("What you can try"));
        assert!(!trader.output.contains("timed out"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_is_stable_across_reads() {
        let council = council(Arc::new(varied_latency()));

        let outcome = assert_ok!(council.start_analysis("600519").await);
        let first = council.report().unwrap();
        let second = council.report().unwrap();

        assert_eq!(first, second);
        assert_eq!(outcome.report.as_deref(), Some(first.as_str()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_stream_brackets_the_run() {
        let council = council(Arc::new(ScriptedAnalysis::new(Duration::from_secs(1))));
        let mut rx = council.subscribe();

        let outcome = assert_ok!(council.start_analysis("600519").await);
        let events = drain(&mut rx);

        assert!(matches!(
            events.first(),
            Some(RunEvent::RunStarted { run_id, .. }) if *run_id == outcome.run_id
        ));
        assert!(matches!(
            events.last(),
            Some(RunEvent::RunFinished { report_ready: true, .. })
        ));
        assert!(events.iter().any(|e| matches!(e, RunEvent::Tick { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, RunEvent::EvidenceResolved { from_fallback: true, .. })));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, RunEvent::DebateFinished { .. }))
                .count(),
            2
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_run_resets_state() {
        let council = council(Arc::new(ScriptedAnalysis::new(Duration::from_secs(1))));

        let first = assert_ok!(council.start_analysis("600519").await);
        let second = assert_ok!(council.start_analysis("600519").await);

        assert_ne!(first.run_id, second.run_id);
        let session = council.current_session().unwrap();
        assert_eq!(session.run_id, second.run_id);
        assert!(session
            .board
            .agents()
            .iter()
            .all(|(_, state)| state.thoughts.len() <= 3));
    }

    #[test]
    fn test_builder_requires_providers() {
        let result = Council::builder().build();
        assert!(matches!(result, Err(CouncilError::ConfigError(_))));
    }

    #[test]
    fn test_oversized_event_capacity_is_a_config_error() {
        let config = CouncilConfig {
            event_capacity: usize::MAX,
            ..CouncilConfig::default()
        };
        let result = Council::builder()
            .snapshot_provider(Arc::new(snapshot_provider(moutai())))
            .evidence_provider(Arc::new(offline_evidence()))
            .analysis_service(Arc::new(ScriptedAnalysis::new(Duration::ZERO)))
            .config(config)
            .build();
        assert!(matches!(result, Err(CouncilError::ConfigError(_))));
    }

    #[test]
    fn test_observers_before_any_run() {
        let council = council(Arc::new(ScriptedAnalysis::new(Duration::ZERO)));
        assert_eq!(council.agent_states().len(), 21);
        assert_eq!(council.elapsed_seconds(), 0);
        assert!(council.report().is_none());
        assert_eq!(
            council.debate(DebateCheckpoint::Thesis),
            DebateSession::new(DebateCheckpoint::Thesis)
        );
    }
}
