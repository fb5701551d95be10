//! Market snapshot provider

use crate::config::CouncilConfig;
use crate::error::{CouncilError, Result};
use async_trait::async_trait;
use council_core::MarketSnapshot;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

/// Source of the point-in-time snapshot that seeds a run
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Fetch the current snapshot for `subject_id`
    async fn fetch(&self, subject_id: &str) -> Result<MarketSnapshot>;
}

/// Snapshot provider backed by `GET {api_base}/snapshot/{subject_id}`
pub struct HttpSnapshotProvider {
    client: Client,
    api_base: String,
}

impl HttpSnapshotProvider {
    /// Create a provider from the council configuration
    pub fn new(config: &CouncilConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            api_base: config.market_api_base.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl SnapshotProvider for HttpSnapshotProvider {
    async fn fetch(&self, subject_id: &str) -> Result<MarketSnapshot> {
        let url = format!("{}/snapshot/{subject_id}", self.api_base);
        debug!(%url, "Fetching market snapshot");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(CouncilError::SnapshotUnavailable {
                subject: subject_id.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let body: Value = response.json().await?;
        parse_snapshot(subject_id, body)
    }
}

/// Accept either a bare snapshot object or one wrapped in a `data` field
fn parse_snapshot(subject_id: &str, body: Value) -> Result<MarketSnapshot> {
    let payload = match body {
        Value::Object(mut map) if map.get("data").is_some_and(Value::is_object) => {
            map.remove("data").unwrap_or_default()
        }
        other => other,
    };
    // serde would otherwise fill the struct positionally from an array
    if !payload.is_object() {
        return Err(CouncilError::SnapshotUnavailable {
            subject: subject_id.to_string(),
            reason: "snapshot payload is not a JSON object".to_string(),
        });
    }
    Ok(serde_json::from_value(payload)?)
}
