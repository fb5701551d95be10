//! Configuration for council runs

use crate::error::{CouncilError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_MARKET_API_BASE: &str = "http://localhost:8080/api";

/// Upper bound on the run event channel capacity
pub const MAX_EVENT_CAPACITY: usize = 65_536;

/// Configuration for council runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouncilConfig {
    /// Deadline for each agent's analysis call
    pub analysis_deadline: Duration,

    /// Cadence of the elapsed-time ticker
    pub tick_interval: Duration,

    /// Cadence of cosmetic thought cues
    pub thought_interval: Duration,

    /// Pause before each scripted debate message
    pub debate_message_delay: Duration,

    /// Capacity of the run event channel
    pub event_capacity: usize,

    /// How long evidence lookups stay cached
    pub evidence_cache_ttl: Duration,

    /// Evidence requests per minute
    pub evidence_rate_limit: u32,

    /// Timeout for snapshot and evidence requests
    pub request_timeout: Duration,

    /// Base URL of the market data API
    pub market_api_base: String,
}

impl Default for CouncilConfig {
    fn default() -> Self {
        Self {
            analysis_deadline: Duration::from_secs(360),    // 6 minutes
            tick_interval: Duration::from_secs(1),
            thought_interval: Duration::from_secs(1),
            debate_message_delay: Duration::from_millis(1500),
            event_capacity: 1024,
            evidence_cache_ttl: Duration::from_secs(300),   // 5 minutes
            evidence_rate_limit: 120,
            request_timeout: Duration::from_secs(30),
            market_api_base: DEFAULT_MARKET_API_BASE.to_string(),
        }
    }
}

impl CouncilConfig {
    /// Create a new configuration builder
    pub fn builder() -> CouncilConfigBuilder {
        CouncilConfigBuilder::default()
    }

    /// Load configuration from `COUNCIL_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// Recognised keys: `COUNCIL_ANALYSIS_DEADLINE_SECS`, `COUNCIL_TICK_MS`,
    /// `COUNCIL_THOUGHT_MS`, `COUNCIL_DEBATE_DELAY_MS`,
    /// `COUNCIL_EVENT_CAPACITY`, `COUNCIL_EVIDENCE_TTL_SECS`,
    /// `COUNCIL_EVIDENCE_RATE_LIMIT`, `COUNCIL_REQUEST_TIMEOUT_SECS` and
    /// `COUNCIL_MARKET_URL`. Missing keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str| -> Result<Option<u64>> {
            lookup(key)
                .map(|raw| {
                    raw.trim().parse::<u64>().map_err(|_| {
                        CouncilError::ConfigError(format!("{key} must be an integer, got {raw:?}"))
                    })
                })
                .transpose()
        };

        let mut builder = Self::builder();
        if let Some(secs) = number("COUNCIL_ANALYSIS_DEADLINE_SECS")? {
            builder = builder.analysis_deadline(Duration::from_secs(secs));
        }
        if let Some(ms) = number("COUNCIL_TICK_MS")? {
            builder = builder.tick_interval(Duration::from_millis(ms));
        }
        if let Some(ms) = number("COUNCIL_THOUGHT_MS")? {
            builder = builder.thought_interval(Duration::from_millis(ms));
        }
        if let Some(ms) = number("COUNCIL_DEBATE_DELAY_MS")? {
            builder = builder.debate_message_delay(Duration::from_millis(ms));
        }
        if let Some(capacity) = number("COUNCIL_EVENT_CAPACITY")? {
            builder = builder.event_capacity(usize::try_from(capacity).unwrap_or(usize::MAX));
        }
        if let Some(secs) = number("COUNCIL_EVIDENCE_TTL_SECS")? {
            builder = builder.evidence_cache_ttl(Duration::from_secs(secs));
        }
        if let Some(limit) = number("COUNCIL_EVIDENCE_RATE_LIMIT")? {
            builder = builder.evidence_rate_limit(u32::try_from(limit).unwrap_or(u32::MAX));
        }
        if let Some(secs) = number("COUNCIL_REQUEST_TIMEOUT_SECS")? {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }
        if let Some(base) = lookup("COUNCIL_MARKET_URL") {
            builder = builder.market_api_base(base);
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.analysis_deadline.is_zero() {
            return Err(CouncilError::ConfigError(
                "analysis_deadline must be greater than 0".to_string(),
            ));
        }

        if self.tick_interval.is_zero() || self.thought_interval.is_zero() {
            return Err(CouncilError::ConfigError(
                "tick and thought intervals must be greater than 0".to_string(),
            ));
        }

        if self.event_capacity == 0 || self.event_capacity > MAX_EVENT_CAPACITY {
            return Err(CouncilError::ConfigError(format!(
                "event_capacity must be between 1 and {MAX_EVENT_CAPACITY}, got {}",
                self.event_capacity
            )));
        }

        if self.evidence_rate_limit == 0 {
            return Err(CouncilError::ConfigError(
                "evidence_rate_limit must be greater than 0".to_string(),
            ));
        }

        if self.market_api_base.trim().is_empty() {
            return Err(CouncilError::ConfigError(
                "market_api_base must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for CouncilConfig
#[derive(Debug, Default)]
pub struct CouncilConfigBuilder {
    analysis_deadline: Option<Duration>,
    tick_interval: Option<Duration>,
    thought_interval: Option<Duration>,
    debate_message_delay: Option<Duration>,
    event_capacity: Option<usize>,
    evidence_cache_ttl: Option<Duration>,
    evidence_rate_limit: Option<u32>,
    request_timeout: Option<Duration>,
    market_api_base: Option<String>,
}

impl CouncilConfigBuilder {
    /// Set the per-agent analysis deadline
    pub fn analysis_deadline(mut self, duration: Duration) -> Self {
        self.analysis_deadline = Some(duration);
        self
    }

    /// Set the elapsed-time tick interval
    pub fn tick_interval(mut self, duration: Duration) -> Self {
        self.tick_interval = Some(duration);
        self
    }

    /// Set the thought cue interval
    pub fn thought_interval(mut self, duration: Duration) -> Self {
        self.thought_interval = Some(duration);
        self
    }

    /// Set the delay before each debate message
    pub fn debate_message_delay(mut self, duration: Duration) -> Self {
        self.debate_message_delay = Some(duration);
        self
    }

    /// Set the event channel capacity
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = Some(capacity);
        self
    }

    /// Set the evidence cache TTL
    pub fn evidence_cache_ttl(mut self, duration: Duration) -> Self {
        self.evidence_cache_ttl = Some(duration);
        self
    }

    /// Set evidence requests per minute
    pub fn evidence_rate_limit(mut self, per_minute: u32) -> Self {
        self.evidence_rate_limit = Some(per_minute);
        self
    }

    /// Set the provider request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set the market data API base URL
    pub fn market_api_base(mut self, base: impl Into<String>) -> Self {
        self.market_api_base = Some(base.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<CouncilConfig> {
        let defaults = CouncilConfig::default();

        let config = CouncilConfig {
            analysis_deadline: self.analysis_deadline.unwrap_or(defaults.analysis_deadline),
            tick_interval: self.tick_interval.unwrap_or(defaults.tick_interval),
            thought_interval: self.thought_interval.unwrap_or(defaults.thought_interval),
            debate_message_delay: self
                .debate_message_delay
                .unwrap_or(defaults.debate_message_delay),
            event_capacity: self.event_capacity.unwrap_or(defaults.event_capacity),
            evidence_cache_ttl: self.evidence_cache_ttl.unwrap_or(defaults.evidence_cache_ttl),
            evidence_rate_limit: self
                .evidence_rate_limit
                .unwrap_or(defaults.evidence_rate_limit),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
            market_api_base: self.market_api_base.unwrap_or(defaults.market_api_base),
        };

        config.validate()?;
        Ok(config)
    }
}
