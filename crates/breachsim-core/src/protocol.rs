//! Wire protocol for the duplex game channel.
//!
//! Inbound and outbound frames are closed tagged unions exchanged as JSON
//! text frames. Decoding is exhaustive: a frame with an unrecognized `type`
//! tag is a [`BreachError::Codec`], never silently ignored.

use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, AgentStatus, Team};
use crate::error::{BreachError, Result};

/// Events pushed by the remote service over the game channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum InboundEvent {
    /// An agent changed presentation status.
    #[serde(rename = "STATE_UPDATE")]
    StateUpdate { agent: AgentId, status: AgentStatus },
    /// An agent produced a transcript line (latest line wins).
    #[serde(rename = "NEW_MESSAGE")]
    NewMessage { agent: AgentId, text: String },
    /// Resolution of an attack against the defended asset.
    #[serde(rename = "IMPACT")]
    Impact {
        damage_taken: u8,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mitigation_score: Option<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        defense_desc: Option<String>,
    },
    /// A team's plan is ready for human approval.
    #[serde(rename = "PROPOSAL")]
    Proposal {
        team: Team,
        action: String,
        description: String,
    },
    /// Reply to a `GET_CODE` command.
    #[serde(rename = "CODE_RESPONSE")]
    CodeResponse {
        team: Team,
        code: String,
        title: String,
        description: String,
    },
    /// Reply to an `EXPLAIN` command.
    #[serde(rename = "EDUCATIONAL_RESPONSE")]
    EducationalResponse { edu_text: String },
}

impl InboundEvent {
    /// Whether this event counts as proof that the remote service is
    /// actively producing simulation output.
    ///
    /// Request/response payloads (`PROPOSAL`, `CODE_RESPONSE`,
    /// `EDUCATIONAL_RESPONSE`) do not qualify; only the streaming
    /// simulation events do.
    pub fn proves_liveness(&self) -> bool {
        matches!(
            self,
            InboundEvent::StateUpdate { .. }
                | InboundEvent::NewMessage { .. }
                | InboundEvent::Impact { .. }
        )
    }
}

/// Commands sent to the remote service over the game channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundCommand {
    /// Begin a session for the named mission.
    #[serde(rename = "START")]
    Start { mission: String },
    /// Request a plain-language summary of a team's activity.
    #[serde(rename = "SUMMARIZE")]
    Summarize { team: Team },
    /// Request the code artifact behind a team's current move.
    #[serde(rename = "GET_CODE")]
    GetCode { team: Team },
    /// Request an educational explanation of the current exchange.
    #[serde(rename = "EXPLAIN")]
    Explain,
    /// Human approval decision for the pending proposal.
    #[serde(rename = "DECISION")]
    Decision { approved: bool },
}

impl OutboundCommand {
    /// Serializes the command to its JSON wire form.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(BreachError::from)
    }
}

/// Decodes one inbound text frame.
///
/// # Errors
///
/// Returns [`BreachError::Codec`] if the payload is not valid JSON or does
/// not match any event in the closed union.
pub fn decode(frame: &str) -> Result<InboundEvent> {
    serde_json::from_str(frame).map_err(BreachError::from)
}
