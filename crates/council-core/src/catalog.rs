//! The council's agent catalog
//!
//! Every analytical role is a variant of [`AgentRole`]. Titles, stage
//! placement and instruction templates are resolved with exhaustive matches,
//! so adding a role without wiring it up fails to compile.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the four ordered pipeline phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Information gathering and specialist analysis
    Intelligence,
    /// Thesis building on top of the specialist work
    Research,
    /// Risk review of the proposed thesis
    Risk,
    /// Final trading and portfolio decision
    Decision,
}

impl Stage {
    /// All stages in execution order
    pub const ALL: [Stage; 4] = [
        Stage::Intelligence,
        Stage::Research,
        Stage::Risk,
        Stage::Decision,
    ];

    /// 1-based stage number
    pub fn number(self) -> u8 {
        match self {
            Self::Intelligence => 1,
            Self::Research => 2,
            Self::Risk => 3,
            Self::Decision => 4,
        }
    }

    /// Human-readable stage name
    pub fn title(self) -> &'static str {
        match self {
            Self::Intelligence => "Market Intelligence",
            Self::Research => "Investment Research",
            Self::Risk => "Risk Review",
            Self::Decision => "Final Decision",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stage {}: {}", self.number(), self.title())
    }
}

/// Sequential sub-groups of the intelligence stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Subgroup {
    /// Outside-in signals: news, social chatter, regional markets
    A,
    /// Core analysis: macro, industry, fundamentals, technicals, flows
    B,
    /// Special situations: policy, valuation, events
    C,
}

impl Subgroup {
    /// Short label used in plan step names
    pub fn label(self) -> &'static str {
        match self {
            Self::A => "1a",
            Self::B => "1b",
            Self::C => "1c",
        }
    }
}

/// A catalogued analytical role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    NewsAnalyst,
    SocialSentimentAnalyst,
    RegionalMarketAnalyst,
    MacroEconomist,
    IndustryAnalyst,
    FundamentalAnalyst,
    TechnicalAnalyst,
    CapitalFlowAnalyst,
    PolicyAnalyst,
    ValuationAnalyst,
    EventDrivenAnalyst,
    BullResearcher,
    BearResearcher,
    QuantStrategist,
    ResearchDirector,
    AggressiveRiskAnalyst,
    NeutralRiskAnalyst,
    ConservativeRiskAnalyst,
    ComplianceOfficer,
    Trader,
    PortfolioManager,
}

impl AgentRole {
    /// Every role in catalog order
    pub const ALL: [AgentRole; 21] = [
        AgentRole::NewsAnalyst,
        AgentRole::SocialSentimentAnalyst,
        AgentRole::RegionalMarketAnalyst,
        AgentRole::MacroEconomist,
        AgentRole::IndustryAnalyst,
        AgentRole::FundamentalAnalyst,
        AgentRole::TechnicalAnalyst,
        AgentRole::CapitalFlowAnalyst,
        AgentRole::PolicyAnalyst,
        AgentRole::ValuationAnalyst,
        AgentRole::EventDrivenAnalyst,
        AgentRole::BullResearcher,
        AgentRole::BearResearcher,
        AgentRole::QuantStrategist,
        AgentRole::ResearchDirector,
        AgentRole::AggressiveRiskAnalyst,
        AgentRole::NeutralRiskAnalyst,
        AgentRole::ConservativeRiskAnalyst,
        AgentRole::ComplianceOfficer,
        AgentRole::Trader,
        AgentRole::PortfolioManager,
    ];

    /// Stable identifier, identical to the serialized form
    pub fn id(self) -> &'static str {
        match self {
            Self::NewsAnalyst => "news_analyst",
            Self::SocialSentimentAnalyst => "social_sentiment_analyst",
            Self::RegionalMarketAnalyst => "regional_market_analyst",
            Self::MacroEconomist => "macro_economist",
            Self::IndustryAnalyst => "industry_analyst",
            Self::FundamentalAnalyst => "fundamental_analyst",
            Self::TechnicalAnalyst => "technical_analyst",
            Self::CapitalFlowAnalyst => "capital_flow_analyst",
            Self::PolicyAnalyst => "policy_analyst",
            Self::ValuationAnalyst => "valuation_analyst",
            Self::EventDrivenAnalyst => "event_driven_analyst",
            Self::BullResearcher => "bull_researcher",
            Self::BearResearcher => "bear_researcher",
            Self::QuantStrategist => "quant_strategist",
            Self::ResearchDirector => "research_director",
            Self::AggressiveRiskAnalyst => "aggressive_risk_analyst",
            Self::NeutralRiskAnalyst => "neutral_risk_analyst",
            Self::ConservativeRiskAnalyst => "conservative_risk_analyst",
            Self::ComplianceOfficer => "compliance_officer",
            Self::Trader => "trader",
            Self::PortfolioManager => "portfolio_manager",
        }
    }

    /// Look a role up by its identifier
    pub fn from_id(id: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|role| role.id() == id)
            .ok_or_else(|| Error::UnknownAgent(id.to_string()))
    }

    /// Display title
    pub fn title(self) -> &'static str {
        match self {
            Self::NewsAnalyst => "News Analyst",
            Self::SocialSentimentAnalyst => "Social Sentiment Analyst",
            Self::RegionalMarketAnalyst => "Regional Market Analyst",
            Self::MacroEconomist => "Macro Economist",
            Self::IndustryAnalyst => "Industry Analyst",
            Self::FundamentalAnalyst => "Fundamental Analyst",
            Self::TechnicalAnalyst => "Technical Analyst",
            Self::CapitalFlowAnalyst => "Capital Flow Analyst",
            Self::PolicyAnalyst => "Policy Analyst",
            Self::ValuationAnalyst => "Valuation Analyst",
            Self::EventDrivenAnalyst => "Event-Driven Analyst",
            Self::BullResearcher => "Bull Researcher",
            Self::BearResearcher => "Bear Researcher",
            Self::QuantStrategist => "Quant Strategist",
            Self::ResearchDirector => "Research Director",
            Self::AggressiveRiskAnalyst => "Aggressive Risk Analyst",
            Self::NeutralRiskAnalyst => "Neutral Risk Analyst",
            Self::ConservativeRiskAnalyst => "Conservative Risk Analyst",
            Self::ComplianceOfficer => "Compliance Officer",
            Self::Trader => "Trader",
            Self::PortfolioManager => "Portfolio Manager",
        }
    }

    /// Stage the role runs in
    pub fn stage(self) -> Stage {
        match self {
            Self::NewsAnalyst
            | Self::SocialSentimentAnalyst
            | Self::RegionalMarketAnalyst
            | Self::MacroEconomist
            | Self::IndustryAnalyst
            | Self::FundamentalAnalyst
            | Self::TechnicalAnalyst
            | Self::CapitalFlowAnalyst
            | Self::PolicyAnalyst
            | Self::ValuationAnalyst
            | Self::EventDrivenAnalyst => Stage::Intelligence,
            Self::BullResearcher
            | Self::BearResearcher
            | Self::QuantStrategist
            | Self::ResearchDirector => Stage::Research,
            Self::AggressiveRiskAnalyst
            | Self::NeutralRiskAnalyst
            | Self::ConservativeRiskAnalyst
            | Self::ComplianceOfficer => Stage::Risk,
            Self::Trader | Self::PortfolioManager => Stage::Decision,
        }
    }

    /// Sub-group within the intelligence stage
    pub fn subgroup(self) -> Option<Subgroup> {
        match self {
            Self::NewsAnalyst | Self::SocialSentimentAnalyst | Self::RegionalMarketAnalyst => {
                Some(Subgroup::A)
            }
            Self::MacroEconomist
            | Self::IndustryAnalyst
            | Self::FundamentalAnalyst
            | Self::TechnicalAnalyst
            | Self::CapitalFlowAnalyst => Some(Subgroup::B),
            Self::PolicyAnalyst | Self::ValuationAnalyst | Self::EventDrivenAnalyst => {
                Some(Subgroup::C)
            }
            _ => None,
        }
    }

    /// Role-specific instruction template (MiniJinja syntax)
    ///
    /// Roles without a dedicated template are briefed with the generic one.
    pub fn instruction_template(self) -> Option<&'static str> {
        let template = match self {
            Self::NewsAnalyst => {
                "Review the latest company announcements and press coverage for {{ name }}. \
                 Separate material news from noise, rate the overall tone, and flag any \
                 headline that could move the share price in the next two weeks."
            }
            Self::SocialSentimentAnalyst => {
                "Assess retail investor sentiment around {{ name }} on forums and social \
                 platforms. Quantify the bull/bear split, note unusual spikes in discussion \
                 volume, and call out crowded narratives."
            }
            Self::RegionalMarketAnalyst => {
                "Compare how {{ name }} and its peers trade across mainland and Hong Kong \
                 listings. Discuss cross-border flows, AH premium or discount, and regional \
                 index context."
            }
            Self::MacroEconomist => {
                "Describe the macro backdrop relevant to {{ name }}: growth, inflation, \
                 liquidity, interest rates and currency. Explain which of these matters most \
                 for this business right now."
            }
            Self::IndustryAnalyst => {
                "Position {{ name }} within its industry. Cover the competitive landscape, \
                 the cycle stage, pricing power, and the main structural threats."
            }
            Self::FundamentalAnalyst => {
                "Analyse the financial statements of {{ name }}: revenue and margin trends, \
                 cash conversion, balance-sheet strength and return on equity. Highlight the \
                 two numbers an investor should watch."
            }
            Self::TechnicalAnalyst => {
                "Read the price action of {{ name }} (last price {{ price }}). Identify trend, \
                 support and resistance, momentum and volume signals, and give a short-term \
                 technical bias."
            }
            Self::CapitalFlowAnalyst => {
                "Track money flows into and out of {{ name }}: main-force net inflow, \
                 northbound holdings, margin financing and block trades."
            }
            Self::PolicyAnalyst => {
                "Identify regulatory and policy factors affecting {{ name }}, including \
                 industry policy, tax, pricing controls and any pending rule changes."
            }
            Self::ValuationAnalyst => {
                "Value {{ name }} using at least two methods (multiples and a cash-flow \
                 approach). State a fair-value range and compare it with the current price \
                 of {{ price }}."
            }
            Self::EventDrivenAnalyst => {
                "List upcoming catalysts for {{ name }}: earnings dates, shareholder \
                 meetings, lock-up expiries, buybacks, index rebalances. Estimate the likely \
                 price impact of each."
            }
            Self::BullResearcher => {
                "Build the strongest honest bull case for {{ name }} from the council's \
                 findings so far. Rank the three best arguments and state what would \
                 invalidate them."
            }
            Self::BearResearcher => {
                "Build the strongest honest bear case for {{ name }} from the council's \
                 findings so far. Rank the three most serious risks and state what would \
                 defuse them."
            }
            Self::ResearchDirector => {
                "Weigh the bull and bear evidence on {{ name }} and issue a research view: \
                 rating, conviction level and the key debate the market is having."
            }
            Self::AggressiveRiskAnalyst => {
                "Argue for taking risk on {{ name }}: where is the upside asymmetric, and how \
                 large a position would an aggressive mandate accept?"
            }
            Self::NeutralRiskAnalyst => {
                "Give a balanced risk assessment of {{ name }}: expected volatility, \
                 drawdown scenarios and a sensible position size for a balanced mandate."
            }
            Self::ConservativeRiskAnalyst => {
                "Argue the capital-preservation view on {{ name }}: worst plausible outcomes, \
                 liquidity risk and the conditions under which to stay out."
            }
            Self::Trader => {
                "Turn the council's view on {{ name }} into an execution plan: entry zone, \
                 stop-loss, targets and order timing around the current price of {{ price }}."
            }
            Self::PortfolioManager => {
                "Make the final call on {{ name }}. State BUY, HOLD or SELL, a target weight, \
                 a 12-month target price and the top risks, referencing the council's \
                 earlier findings."
            }
            Self::QuantStrategist | Self::ComplianceOfficer => return None,
        };
        Some(template)
    }

    /// Whether this role takes the council's final decision
    pub fn is_terminal_decision(self) -> bool {
        matches!(self, Self::PortfolioManager)
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Immutable description of a catalogued agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentDefinition {
    /// Stable identifier
    pub id: &'static str,
    /// Role variant
    pub role: AgentRole,
    /// Display title
    pub title: &'static str,
    /// Stage the agent runs in
    pub stage: Stage,
    /// Intelligence sub-group, if any
    pub subgroup: Option<Subgroup>,
    /// Role-specific instruction template
    pub instruction_template: Option<&'static str>,
}

impl AgentDefinition {
    /// Build the definition for a role
    pub fn for_role(role: AgentRole) -> Self {
        Self {
            id: role.id(),
            role,
            title: role.title(),
            stage: role.stage(),
            subgroup: role.subgroup(),
            instruction_template: role.instruction_template(),
        }
    }
}

/// Ordered, read-only collection of agent definitions
#[derive(Debug, Clone)]
pub struct Catalog {
    definitions: Vec<AgentDefinition>,
}

impl Catalog {
    /// The standard 21-agent council
    pub fn standard() -> Self {
        Self {
            definitions: AgentRole::ALL
                .into_iter()
                .map(AgentDefinition::for_role)
                .collect(),
        }
    }

    /// Look up the definition of a role
    pub fn get(&self, role: AgentRole) -> Option<&AgentDefinition> {
        self.definitions.iter().find(|def| def.role == role)
    }

    /// Look up a definition by identifier
    pub fn by_id(&self, id: &str) -> Result<&AgentDefinition> {
        self.definitions
            .iter()
            .find(|def| def.id == id)
            .ok_or_else(|| Error::UnknownAgent(id.to_string()))
    }

    /// Iterate definitions in catalog order
    pub fn iter(&self) -> impl Iterator<Item = &AgentDefinition> {
        self.definitions.iter()
    }

    /// Roles of a stage, optionally narrowed to one sub-group, in catalog order
    pub fn group(&self, stage: Stage, subgroup: Option<Subgroup>) -> Vec<AgentRole> {
        self.definitions
            .iter()
            .filter(|def| def.stage == stage && (subgroup.is_none() || def.subgroup == subgroup))
            .map(|def| def.role)
            .collect()
    }

    /// The role whose completion marks the report as ready
    pub fn terminal_role(&self) -> Option<AgentRole> {
        self.definitions
            .iter()
            .map(|def| def.role)
            .find(|role| role.is_terminal_decision())
    }

    /// Number of catalogued agents
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}
