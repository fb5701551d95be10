//! Market snapshot of the analysed subject

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Point-in-time market data for one subject
///
/// Numeric fields are optional: upstream quote feeds report unresolved values
/// as `null`, empty strings or placeholders such as `"--"`, all of which
/// deserialize to `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub subject_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub previous_close: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub change_percent: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub volume: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub turnover: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub market_cap: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pe_ratio: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub pb_ratio: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub high_52w: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub low_52w: Option<f64>,
    #[serde(default)]
    pub as_of: Option<DateTime<Utc>>,
}

/// Reason a snapshot cannot seed a run
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotDefect {
    #[error("snapshot is for {actual}, expected {expected}")]
    SubjectMismatch { expected: String, actual: String },

    #[error("subject name is missing")]
    MissingName,

    #[error("price is unresolved")]
    UnresolvedPrice,

    #[error("price {0} is not a usable quote")]
    SentinelPrice(String),
}

impl MarketSnapshot {
    /// Create a snapshot with a name and price
    pub fn new(subject_id: impl Into<String>, name: impl Into<String>, price: f64) -> Self {
        Self {
            subject_id: subject_id.into(),
            name: name.into(),
            price: Some(price),
            ..Self::default()
        }
    }

    /// Check the fields every run depends on
    pub fn validate(&self, expected_subject: &str) -> Result<(), SnapshotDefect> {
        if !self.subject_id.is_empty() && self.subject_id != expected_subject {
            return Err(SnapshotDefect::SubjectMismatch {
                expected: expected_subject.to_string(),
                actual: self.subject_id.clone(),
            });
        }
        if self.name.trim().is_empty() {
            return Err(SnapshotDefect::MissingName);
        }
        match self.price {
            None => Err(SnapshotDefect::UnresolvedPrice),
            Some(price) if !price.is_finite() || price <= 0.0 => {
                Err(SnapshotDefect::SentinelPrice(price.to_string()))
            }
            Some(_) => Ok(()),
        }
    }

    /// Price formatted for prompts and reports
    pub fn price_display(&self) -> String {
        self.price
            .map_or_else(|| "n/a".to_string(), |price| format!("{price:.2}"))
    }

    /// Daily change formatted for prompts and reports
    pub fn change_display(&self) -> String {
        self.change_percent
            .map_or_else(|| "n/a".to_string(), |change| format!("{change:+.2}%"))
    }
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().trim_end_matches('%').parse::<f64>().ok(),
        _ => None,
    })
}
