//! HTTP analysis service client
//!
//! Talks to an analysis backend exposing `POST {api_base}/analyze`, which
//! accepts an [`AnalysisRequest`] as JSON and answers with an
//! [`AnalysisResponse`] envelope.
//!
//! # Example
//!
//! ```no_run
//! use council_analysis::http::{HttpAnalysisConfig, HttpAnalysisService};
//!
//! # fn main() -> council_analysis::Result<()> {
//! let config = HttpAnalysisConfig::new("http://localhost:8080/api")
//!     .with_api_key("secret")
//!     .with_timeout(420);
//! let service = HttpAnalysisService::with_config(config)?;
//! # Ok(())
//! # }
//! ```

use crate::{AnalysisError, AnalysisRequest, AnalysisResponse, AnalysisService, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

const DEFAULT_API_BASE: &str = "http://localhost:8080/api";
/// Headroom of the transport timeout over the analysis deadline
const TRANSPORT_MARGIN_SECS: u64 = 60;
const DEFAULT_TIMEOUT_SECS: u64 = 360 + TRANSPORT_MARGIN_SECS;

/// Configuration for the HTTP analysis service
#[derive(Debug, Clone)]
pub struct HttpAnalysisConfig {
    /// Base URL of the analysis API
    pub api_base: String,

    /// Optional bearer token
    pub api_key: Option<String>,

    /// Transport-level timeout in seconds; kept above the per-agent deadline
    pub timeout_secs: u64,
}

impl HttpAnalysisConfig {
    /// Create a config for `api_base` with default settings
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Create config from environment variables
    ///
    /// Reads `COUNCIL_ANALYSIS_URL` (default `http://localhost:8080/api`) and
    /// the optional `COUNCIL_ANALYSIS_KEY`.
    pub fn from_env() -> Self {
        let api_base = std::env::var("COUNCIL_ANALYSIS_URL")
            .unwrap_or_else(|_| DEFAULT_API_BASE.to_string());
        let mut config = Self::new(api_base);
        config.api_key = std::env::var("COUNCIL_ANALYSIS_KEY").ok();
        config
    }

    /// Set the bearer token
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the transport timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Derive the transport timeout from the per-agent analysis deadline
    ///
    /// The transport must outlive the deadline, otherwise a slow call fails
    /// as a transport error instead of a timeout.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.timeout_secs = deadline
            .as_secs()
            .saturating_add(TRANSPORT_MARGIN_SECS);
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/analyze", self.api_base.trim_end_matches('/'))
    }
}

impl Default for HttpAnalysisConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

/// Analysis service backed by an HTTP API
pub struct HttpAnalysisService {
    client: Client,
    config: HttpAnalysisConfig,
}

impl HttpAnalysisService {
    /// Create a service with the given configuration
    pub fn with_config(config: HttpAnalysisConfig) -> Result<Self> {
        if config.api_base.trim().is_empty() {
            return Err(AnalysisError::ConfigurationError(
                "analysis API base URL is empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a service from environment variables
    pub fn from_env() -> Result<Self> {
        Self::with_config(HttpAnalysisConfig::from_env())
    }

    async fn post(&self, request: &AnalysisRequest) -> Result<AnalysisResponse> {
        let mut builder = self.client.post(self.config.endpoint()).json(request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::RequestFailed(format!("HTTP {status}: {body}")));
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl AnalysisService for HttpAnalysisService {
    #[instrument(skip(self, request, cancel), fields(agent = %request.agent_id))]
    async fn analyze(
        &self,
        request: AnalysisRequest,
        cancel: CancellationToken,
    ) -> Result<AnalysisResponse> {
        debug!("Sending request to analysis API");

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(AnalysisError::Cancelled),
            response = self.post(&request) => response,
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}
