//! Bounded-time analysis calls
//!
//! The deadline is enforced here rather than in each service: the call races
//! a timer, and when the timer wins the call's cancellation token is fired and
//! the in-flight future is dropped.

use crate::{AnalysisError, AnalysisRequest, AnalysisService, Result};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Run one analysis call under `deadline`
///
/// Returns the analysis text, [`AnalysisError::DeadlineExceeded`] when the
/// timer fires first, or the service's own error (including failure and empty
/// responses).
pub async fn analyze_with_deadline(
    service: &dyn AnalysisService,
    request: AnalysisRequest,
    deadline: Duration,
) -> Result<String> {
    let agent_id = request.agent_id.clone();
    let token = CancellationToken::new();
    let call = service.analyze(request, token.child_token());

    tokio::select! {
        response = call => {
            debug!(agent = %agent_id, service = service.name(), "Analysis call returned");
            response?.into_output()
        }
        () = tokio::time::sleep(deadline) => {
            token.cancel();
            warn!(agent = %agent_id, deadline_secs = deadline.as_secs(), "Analysis call exceeded its deadline");
            Err(AnalysisError::DeadlineExceeded(deadline))
        }
    }
}
