//! Outputs handed from earlier agents to later ones
//!
//! `PriorOutputs` is captured at a barrier, after every writer of the previous
//! step has settled, and is never mutated afterwards. Later agents share it
//! behind an `Arc`.

use crate::catalog::AgentRole;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read-only snapshot of completed agent outputs, keyed by role
///
/// Iteration follows catalog order.
///
/// # Example
///
/// ```
/// use council_core::{AgentRole, PriorOutputs};
///
/// let prior = PriorOutputs::from_iter([
///     (AgentRole::TechnicalAnalyst, "Uptrend intact".to_string()),
///     (AgentRole::NewsAnalyst, "Quiet week".to_string()),
/// ]);
///
/// assert_eq!(prior.len(), 2);
/// assert_eq!(prior.get(AgentRole::NewsAnalyst), Some("Quiet week"));
/// assert_eq!(prior.roles().next(), Some(AgentRole::NewsAnalyst));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PriorOutputs {
    outputs: BTreeMap<AgentRole, String>,
}

impl PriorOutputs {
    /// Create an empty snapshot
    pub fn new() -> Self {
        Self::default()
    }

    /// Output of a role, if it had settled when the snapshot was taken
    pub fn get(&self, role: AgentRole) -> Option<&str> {
        self.outputs.get(&role).map(String::as_str)
    }

    /// Whether a role is present
    pub fn contains(&self, role: AgentRole) -> bool {
        self.outputs.contains_key(&role)
    }

    /// Roles present, in catalog order
    pub fn roles(&self) -> impl Iterator<Item = AgentRole> + '_ {
        self.outputs.keys().copied()
    }

    /// `(role, output)` pairs, in catalog order
    pub fn iter(&self) -> impl Iterator<Item = (AgentRole, &str)> {
        self.outputs.iter().map(|(role, output)| (*role, output.as_str()))
    }

    /// Number of outputs
    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    /// Whether no agent had settled yet
    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl FromIterator<(AgentRole, String)> for PriorOutputs {
    fn from_iter<I: IntoIterator<Item = (AgentRole, String)>>(iter: I) -> Self {
        Self {
            outputs: iter.into_iter().collect(),
        }
    }
}
