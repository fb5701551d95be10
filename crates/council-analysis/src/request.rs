//! Analysis request and response types

use crate::{AnalysisError, Result};
use council_core::{MarketSnapshot, PriorOutputs};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Everything the analysis service needs to produce one agent's output
///
/// The snapshot and prior outputs are shared with the rest of the group, so
/// they are held behind `Arc`s.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// Catalog identifier of the agent
    pub agent_id: String,

    /// Subject being analysed
    pub subject_id: String,

    /// Market snapshot taken at run start
    pub snapshot: Arc<MarketSnapshot>,

    /// Outputs of every agent that settled before this agent's step
    pub prior_outputs: Arc<PriorOutputs>,

    /// Preamble plus role-specific instruction
    pub instruction: String,
}

impl AnalysisRequest {
    /// Create a request
    pub fn new(
        agent_id: impl Into<String>,
        subject_id: impl Into<String>,
        snapshot: Arc<MarketSnapshot>,
        prior_outputs: Arc<PriorOutputs>,
        instruction: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            subject_id: subject_id.into(),
            snapshot,
            prior_outputs,
            instruction: instruction.into(),
        }
    }
}

/// Response envelope returned by the analysis service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// Whether the service considers the analysis successful
    #[serde(default)]
    pub success: bool,

    /// Analysis text
    #[serde(default)]
    pub result: Option<String>,

    /// Service-side error description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResponse {
    /// A successful response carrying `result`
    pub fn success(result: impl Into<String>) -> Self {
        Self {
            success: true,
            result: Some(result.into()),
            error: None,
        }
    }

    /// A failed response carrying `error`
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }

    /// Extract the analysis text, treating failure and blank results as errors
    pub fn into_output(self) -> Result<String> {
        if !self.success {
            return Err(AnalysisError::Unsuccessful(
                self.error
                    .unwrap_or_else(|| "no error detail provided".to_string()),
            ));
        }
        match self.result {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(AnalysisError::EmptyResult),
        }
    }
}
