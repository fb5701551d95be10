//! Role-keyed evidence lookups
//!
//! Every role maps to exactly one [`EvidenceRecipe`]. A recipe names the
//! lookup endpoint, the thought cues shown while the agent works, and a static
//! list of sources used whenever the lookup fails or comes back empty, so an
//! agent always has evidence to show.

use crate::cache::{EvidenceCache, EvidenceKey};
use crate::config::CouncilConfig;
use crate::error::{CouncilError, Result};
use async_trait::async_trait;
use council_core::{AgentRole, EvidenceSource};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde_json::Value;
use std::collections::BTreeMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{debug, warn};

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Evidence lookup performed for a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvidenceRecipe {
    News,
    Social,
    RegionalMarket,
    Macro,
    Industry,
    Fundamentals,
    Technical,
    CapitalFlow,
    Policy,
    Events,
    Consensus,
    RiskVariants,
    Trading,
}

impl EvidenceRecipe {
    /// The recipe used by `role`
    pub fn for_role(role: AgentRole) -> Self {
        match role {
            AgentRole::NewsAnalyst => Self::News,
            AgentRole::SocialSentimentAnalyst => Self::Social,
            AgentRole::RegionalMarketAnalyst => Self::RegionalMarket,
            AgentRole::MacroEconomist => Self::Macro,
            AgentRole::IndustryAnalyst => Self::Industry,
            AgentRole::FundamentalAnalyst => Self::Fundamentals,
            AgentRole::TechnicalAnalyst | AgentRole::QuantStrategist => Self::Technical,
            AgentRole::CapitalFlowAnalyst => Self::CapitalFlow,
            AgentRole::PolicyAnalyst | AgentRole::ComplianceOfficer => Self::Policy,
            AgentRole::EventDrivenAnalyst => Self::Events,
            AgentRole::ValuationAnalyst
            | AgentRole::BullResearcher
            | AgentRole::BearResearcher
            | AgentRole::ResearchDirector => Self::Consensus,
            AgentRole::AggressiveRiskAnalyst
            | AgentRole::NeutralRiskAnalyst
            | AgentRole::ConservativeRiskAnalyst => Self::RiskVariants,
            AgentRole::Trader | AgentRole::PortfolioManager => Self::Trading,
        }
    }

    /// Path segment of the lookup endpoint
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Social => "social",
            Self::RegionalMarket => "regional",
            Self::Macro => "macro",
            Self::Industry => "industry",
            Self::Fundamentals => "fundamentals",
            Self::Technical => "technical",
            Self::CapitalFlow => "capital-flow",
            Self::Policy => "policy",
            Self::Events => "events",
            Self::Consensus => "consensus",
            Self::RiskVariants => "risk",
            Self::Trading => "trading",
        }
    }

    /// Sources shown when the lookup yields nothing usable
    fn fallback_table(self) -> &'static [(&'static str, u64, &'static str)] {
        match self {
            Self::News => &[
                ("Exchange announcements", 12, "Filings and notices from the exchange"),
                ("Financial newswires", 24, "Headlines from the past week"),
                ("Research notes", 6, "Recent broker commentary"),
            ],
            Self::Social => &[
                ("Investor forums", 40, "Retail discussion threads"),
                ("Microblog sentiment", 120, "Short-form posts mentioning the subject"),
            ],
            Self::RegionalMarket => &[
                ("Hong Kong connect flows", 5, "Southbound and northbound activity"),
                ("Overseas listings", 3, "Peers listed outside the mainland"),
            ],
            Self::Macro => &[
                ("PMI and CPI releases", 4, "Latest activity and price indicators"),
                ("Central bank operations", 6, "Open-market operations and rate decisions"),
            ],
            Self::Industry => &[
                ("Sector index", 1, "Performance of the sector benchmark"),
                ("Peer comparison", 8, "Listed competitors"),
            ],
            Self::Fundamentals => &[
                ("Quarterly statements", 8, "Income, balance sheet and cash flow"),
                ("Dividend history", 5, "Payout record"),
            ],
            Self::Technical => &[
                ("Daily candles", 250, "One year of daily prices"),
                ("Volume profile", 60, "Sixty sessions of volume"),
            ],
            Self::CapitalFlow => &[
                ("Main-force net flow", 20, "Large-order net inflow by session"),
                ("Margin balance", 20, "Margin financing balance"),
            ],
            Self::Policy => &[
                ("Regulatory releases", 6, "Notices from market regulators"),
                ("Industry policy", 4, "Sector-level policy documents"),
            ],
            Self::Events => &[
                ("Corporate calendar", 5, "Earnings dates and shareholder meetings"),
                ("Block trades", 3, "Recent block transactions"),
            ],
            Self::Consensus => &[
                ("Analyst ratings", 15, "Published buy/hold/sell ratings"),
                ("Target prices", 10, "Consensus price targets"),
            ],
            Self::RiskVariants => &[
                ("Historical volatility", 1, "Realised volatility over one year"),
                ("Drawdown history", 1, "Largest peak-to-trough declines"),
            ],
            Self::Trading => &[
                ("Order book depth", 10, "Five-level bid and ask depth"),
                ("Intraday ticks", 240, "Minute bars for the last session"),
            ],
        }
    }

    /// Static fallback sources; never empty
    pub fn fallback_sources(self) -> Vec<EvidenceSource> {
        self.fallback_table()
            .iter()
            .map(|(source, count, description)| {
                EvidenceSource::new(*source, *count).with_description(*description)
            })
            .collect()
    }

    /// Progress cues shown while an agent using this recipe works
    pub fn thought_cues(self) -> &'static [&'static str] {
        match self {
            Self::News => &[
                "Scanning recent announcements",
                "Grouping headlines by theme",
                "Weighing positive against negative coverage",
            ],
            Self::Social => &[
                "Sampling forum threads",
                "Scoring retail sentiment",
                "Checking for unusual chatter",
            ],
            Self::RegionalMarket => &[
                "Comparing cross-border flows",
                "Reading overseas peer moves",
            ],
            Self::Macro => &[
                "Reviewing activity indicators",
                "Mapping liquidity conditions",
                "Relating the cycle to the sector",
            ],
            Self::Industry => &[
                "Ranking the sector",
                "Lining up listed peers",
            ],
            Self::Fundamentals => &[
                "Reading the latest statements",
                "Checking margins and cash conversion",
                "Testing balance-sheet strength",
            ],
            Self::Technical => &[
                "Plotting trend and moving averages",
                "Locating support and resistance",
                "Checking momentum divergence",
            ],
            Self::CapitalFlow => &[
                "Summing large-order flows",
                "Tracking margin balance",
            ],
            Self::Policy => &[
                "Reviewing regulatory releases",
                "Assessing policy exposure",
            ],
            Self::Events => &[
                "Listing upcoming catalysts",
                "Sizing event impact",
            ],
            Self::Consensus => &[
                "Collecting prior findings",
                "Weighing the strongest arguments",
                "Drafting a position",
            ],
            Self::RiskVariants => &[
                "Stress-testing the thesis",
                "Estimating downside scenarios",
                "Setting exposure limits",
            ],
            Self::Trading => &[
                "Reading order-book depth",
                "Choosing entry and exit levels",
                "Sizing the position",
            ],
        }
    }
}

/// Status and size of one source in a lookup response
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEntry {
    pub status: String,
    pub count: u64,
    pub data: Option<Value>,
}

impl SourceEntry {
    fn is_usable(&self) -> bool {
        matches!(self.status.as_str(), "success" | "ok" | "fulfilled") && self.count > 0
    }

    fn description(&self) -> Option<String> {
        let data = self.data.as_ref()?;
        ["description", "summary", "title"]
            .iter()
            .find_map(|key| data.get(key).and_then(Value::as_str))
            .map(str::to_string)
    }
}

/// Parsed response of one evidence lookup: `{sources: {key: {status, count, data?}}}`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceBundle {
    pub sources: BTreeMap<String, SourceEntry>,
}

impl SourceBundle {
    /// Parse a lookup response, skipping anything malformed
    pub fn from_value(value: &Value) -> Self {
        let Some(sources) = value.get("sources").and_then(Value::as_object) else {
            return Self::default();
        };

        let sources = sources
            .iter()
            .filter_map(|(key, entry)| {
                let entry = entry.as_object()?;
                let status = entry.get("status")?.as_str()?.to_ascii_lowercase();
                let count = match entry.get("count") {
                    Some(Value::Number(n)) => n.as_u64()?,
                    Some(Value::String(s)) => s.trim().parse().ok()?,
                    _ => return None,
                };
                let data = entry.get("data").filter(|data| !data.is_null()).cloned();
                Some((key.clone(), SourceEntry { status, count, data }))
            })
            .collect();

        Self { sources }
    }

    /// Usable entries as evidence, in key order
    pub fn into_evidence(self) -> Vec<EvidenceSource> {
        self.sources
            .into_iter()
            .filter(|(_, entry)| entry.is_usable())
            .map(|(key, entry)| {
                let description = entry.description();
                let source = EvidenceSource::new(key, entry.count);
                match description {
                    Some(description) => source.with_description(description),
                    None => source,
                }
            })
            .collect()
    }
}

/// Evidence attached to an agent, with where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEvidence {
    pub sources: Vec<EvidenceSource>,
    pub from_fallback: bool,
}

/// Source of evidence lookups
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EvidenceProvider: Send + Sync {
    /// Perform the lookup named by `recipe` for `subject_id`
    async fn fetch(&self, recipe: EvidenceRecipe, subject_id: &str) -> Result<SourceBundle>;
}

/// Run a lookup and fall back to the recipe's static list on any failure
///
/// Never fails and never returns an empty list.
pub async fn resolve_evidence(
    provider: &dyn EvidenceProvider,
    recipe: EvidenceRecipe,
    subject_id: &str,
) -> ResolvedEvidence {
    let sources = match provider.fetch(recipe, subject_id).await {
        Ok(bundle) => bundle.into_evidence(),
        Err(e) => {
            warn!(endpoint = recipe.endpoint(), error = %e, "Evidence lookup failed, using fallback");
            Vec::new()
        }
    };

    if sources.is_empty() {
        debug!(endpoint = recipe.endpoint(), "No usable evidence, using fallback");
        return ResolvedEvidence {
            sources: recipe.fallback_sources(),
            from_fallback: true,
        };
    }

    ResolvedEvidence {
        sources,
        from_fallback: false,
    }
}

/// Evidence provider backed by `GET {api_base}/evidence/{endpoint}/{subject_id}`
///
/// Responses are cached per subject and endpoint, and requests are paced by a
/// per-minute quota.
pub struct HttpEvidenceProvider {
    client: Client,
    api_base: String,
    cache: EvidenceCache,
    rate_limiter: SharedRateLimiter,
}

impl HttpEvidenceProvider {
    /// Create a provider from the council configuration
    pub fn new(config: &CouncilConfig) -> Result<Self> {
        let per_minute = NonZeroU32::new(config.evidence_rate_limit).ok_or_else(|| {
            CouncilError::ConfigError("evidence_rate_limit must be greater than 0".to_string())
        })?;
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            api_base: config.market_api_base.trim_end_matches('/').to_string(),
            cache: EvidenceCache::new(config.evidence_cache_ttl),
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_minute(per_minute))),
        })
    }

    async fn get(&self, recipe: EvidenceRecipe, subject_id: &str) -> Result<Value> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}/evidence/{}/{subject_id}", self.api_base, recipe.endpoint());
        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            return Err(CouncilError::EvidenceError(format!(
                "{} lookup returned HTTP {}",
                recipe.endpoint(),
                response.status()
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl EvidenceProvider for HttpEvidenceProvider {
    async fn fetch(&self, recipe: EvidenceRecipe, subject_id: &str) -> Result<SourceBundle> {
        let key = EvidenceKey::new(subject_id, recipe.endpoint());
        let value = self
            .cache
            .get_or_fetch(key, || self.get(recipe, subject_id))
            .await?;
        Ok(SourceBundle::from_value(&value))
    }
}
