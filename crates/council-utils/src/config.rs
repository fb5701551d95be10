//! Application-level configuration

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Output format of the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable single-line output
    #[default]
    Compact,
    /// One JSON object per event
    Json,
}

/// Unrecognised log format name
#[derive(Debug, Error)]
#[error("Unknown log format: {0} (expected \"compact\" or \"json\")")]
pub struct UnknownLogFormat(pub String);

impl FromStr for LogFormat {
    type Err = UnknownLogFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" | "text" | "pretty" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(UnknownLogFormat(other.to_string())),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name
    pub app_name: String,
    /// Environment (dev, prod, etc.)
    pub environment: String,
    /// Log output format
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "research-council".to_string(),
            environment: "development".to_string(),
            log_format: LogFormat::Compact,
        }
    }
}

impl AppConfig {
    /// Load from `COUNCIL_ENV` and `COUNCIL_LOG_FORMAT`
    pub fn from_env() -> Result<Self, UnknownLogFormat> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, UnknownLogFormat> {
        let mut config = Self::default();
        if let Some(environment) = lookup("COUNCIL_ENV") {
            config.environment = environment;
        }
        if let Some(format) = lookup("COUNCIL_LOG_FORMAT") {
            config.log_format = format.parse()?;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.environment, "development");
        assert_eq!(config.log_format, LogFormat::Compact);
    }

    #[test]
    fn test_from_lookup() {
        let vars = HashMap::from([
            ("COUNCIL_ENV", "production"),
            ("COUNCIL_LOG_FORMAT", "JSON"),
        ]);
        let config = AppConfig::from_lookup(|key| vars.get(key).map(ToString::to_string)).unwrap();
        assert_eq!(config.environment, "production");
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_bad_log_format() {
        let err = AppConfig::from_lookup(|key| {
            (key == "COUNCIL_LOG_FORMAT").then(|| "xml".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("xml"));
    }
}
