//! Session domain model.
//!
//! [`SessionState`] is the canonical mutable record of one simulation run.
//! Visual panels read it and render; only the two data-source adapters
//! (live channel, local simulator) ever write to it, through
//! [`super::SessionStore`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, AgentStatus, Team};

/// Health of the defended asset at session start.
pub const FULL_HEALTH: u8 = 100;

/// Sentinel stored in [`SessionState::explanation`] while a reply to an
/// `EXPLAIN` request is outstanding. Consumers render it as a spinner.
pub const EXPLANATION_LOADING: &str = "__LOADING__";

/// A team's pending plan awaiting human approval.
///
/// Destroyed (set to `None`) the instant a decision is submitted, before
/// the decision's effects are applied, so the approval UI can never
/// double-submit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub team: Team,
    pub action: String,
    pub description: String,
}

/// The code behind a team's current move. Ephemeral: replaced wholesale on
/// each request, clearable by the consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeArtifact {
    pub team: Team,
    pub code: String,
    pub title: String,
    pub description: String,
}

/// Canonical state of one attacker/defender session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Asset health in [0, 100]; never negative, clamped at 0.
    pub health: u8,
    /// Pulses true for the hit-flash window after nonzero damage.
    pub is_hit: bool,
    /// Defender mitigation score in [0, 100].
    pub mitigation_score: u8,
    /// Description of the currently deployed defense.
    pub defense_description: String,
    /// Pending plan awaiting human approval, if any.
    pub proposal: Option<Proposal>,
    /// Latest requested code artifact, if any.
    pub code_artifact: Option<CodeArtifact>,
    /// Latest educational explanation; may hold [`EXPLANATION_LOADING`].
    pub explanation: Option<String>,
    /// Latest transcript line per agent (overwritten, not appended).
    pub transcripts: HashMap<AgentId, String>,
    /// Presentation status per agent.
    pub statuses: HashMap<AgentId, AgentStatus>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            health: FULL_HEALTH,
            is_hit: false,
            mitigation_score: 0,
            defense_description: String::new(),
            proposal: None,
            code_artifact: None,
            explanation: None,
            transcripts: HashMap::new(),
            statuses: HashMap::new(),
        }
    }
}

impl SessionState {
    /// Applies damage, clamped so health never drops below zero.
    pub(crate) fn take_damage(&mut self, damage: u8) {
        self.health = self.health.saturating_sub(damage);
    }

    /// Status of one agent, defaulting to idle when never reported.
    pub fn status_of(&self, agent: AgentId) -> AgentStatus {
        self.statuses.get(&agent).copied().unwrap_or_default()
    }
}
