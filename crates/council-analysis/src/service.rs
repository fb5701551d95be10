//! Analysis service trait definition

use crate::{AnalysisRequest, AnalysisResponse, Result};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Trait for services that turn an agent's request into analysis text
///
/// Implementations should stop work promptly once `cancel` fires; the caller
/// has already given up on the result by then.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Produce the analysis for one agent
    async fn analyze(
        &self,
        request: AnalysisRequest,
        cancel: CancellationToken,
    ) -> Result<AnalysisResponse>;

    /// Service name, for logs
    fn name(&self) -> &str;
}
