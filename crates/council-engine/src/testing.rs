//! Test doubles shared by the engine's unit tests

use crate::config::CouncilConfig;
use crate::error::CouncilError;
use crate::market::evidence::MockEvidenceProvider;
use crate::market::snapshot::MockSnapshotProvider;
use crate::session::Council;
use async_trait::async_trait;
use council_analysis::{AnalysisError, AnalysisRequest, AnalysisResponse, AnalysisService};
use council_core::{AgentRole, MarketSnapshot};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Analysis service with per-role latency and failures
pub(crate) struct ScriptedAnalysis {
    default_delay: Duration,
    delays: HashMap<&'static str, Duration>,
    failures: HashMap<&'static str, &'static str>,
    calls: AtomicUsize,
    prior_counts: Mutex<HashMap<String, usize>>,
}

impl ScriptedAnalysis {
    pub(crate) fn new(default_delay: Duration) -> Self {
        Self {
            default_delay,
            delays: HashMap::new(),
            failures: HashMap::new(),
            calls: AtomicUsize::new(0),
            prior_counts: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn delay(mut self, role: AgentRole, delay: Duration) -> Self {
        self.delays.insert(role.id(), delay);
        self
    }

    pub(crate) fn fail(mut self, role: AgentRole, error: &'static str) -> Self {
        self.failures.insert(role.id(), error);
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of prior outputs the role's request carried
    pub(crate) fn prior_count(&self, role: AgentRole) -> Option<usize> {
        self.prior_counts.lock().unwrap().get(role.id()).copied()
    }
}

#[async_trait]
impl AnalysisService for ScriptedAnalysis {
    async fn analyze(
        &self,
        request: AnalysisRequest,
        cancel: CancellationToken,
    ) -> council_analysis::Result<AnalysisResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prior_counts
            .lock()
            .unwrap()
            .insert(request.agent_id.clone(), request.prior_outputs.len());

        let delay = self
            .delays
            .get(request.agent_id.as_str())
            .copied()
            .unwrap_or(self.default_delay);
        tokio::select! {
            () = cancel.cancelled() => return Err(AnalysisError::Cancelled),
            () = tokio::time::sleep(delay) => {}
        }

        if let Some(error) = self.failures.get(request.agent_id.as_str()) {
            return Ok(AnalysisResponse::failure(*error));
        }
        Ok(AnalysisResponse::success(format!(
            "{} view on {} after {} findings.",
            request.agent_id,
            request.subject_id,
            request.prior_outputs.len()
        )))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

pub(crate) fn moutai() -> MarketSnapshot {
    let mut snapshot = MarketSnapshot::new("600519", "Kweichow Moutai", 1688.0);
    snapshot.change_percent = Some(0.85);
    snapshot
}

pub(crate) fn snapshot_provider(snapshot: MarketSnapshot) -> MockSnapshotProvider {
    let mut provider = MockSnapshotProvider::new();
    provider
        .expect_fetch()
        .returning(move |_| Ok(snapshot.clone()));
    provider
}

pub(crate) fn failing_snapshot_provider(reason: &'static str) -> MockSnapshotProvider {
    let mut provider = MockSnapshotProvider::new();
    provider
        .expect_fetch()
        .returning(move |_| Err(CouncilError::EvidenceError(reason.to_string())));
    provider
}

/// Evidence provider whose every lookup fails, so agents use fallbacks
pub(crate) fn offline_evidence() -> MockEvidenceProvider {
    let mut provider = MockEvidenceProvider::new();
    provider
        .expect_fetch()
        .returning(|_, _| Err(CouncilError::EvidenceError("offline".to_string())));
    provider
}

pub(crate) fn council_with(
    snapshots: MockSnapshotProvider,
    evidence: MockEvidenceProvider,
    analysis: Arc<ScriptedAnalysis>,
) -> Council {
    Council::builder()
        .snapshot_provider(Arc::new(snapshots))
        .evidence_provider(Arc::new(evidence))
        .analysis_service(analysis)
        .config(CouncilConfig::default())
        .build()
        .unwrap()
}

pub(crate) fn council(analysis: Arc<ScriptedAnalysis>) -> Council {
    council_with(snapshot_provider(moutai()), offline_evidence(), analysis)
}
