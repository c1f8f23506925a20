//! Faction and agent identity types.
//!
//! The simulation runs two five-agent teams through a fixed pipeline:
//! scanner -> infrastructure -> data -> weaponizer -> commander. Wire names
//! follow the remote service (`RED_SCANNER`, `RED_INF`, ...).

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

/// One of the two simulation factions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Team {
    /// Attacker faction.
    Red,
    /// Defender faction.
    Blue,
}

/// Position of an agent in its team's hand-off pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum PipelineStage {
    Scanner,
    Infrastructure,
    Data,
    Weaponizer,
    Commander,
}

impl PipelineStage {
    /// The stage that receives this stage's output, if any.
    pub fn next(self) -> Option<PipelineStage> {
        match self {
            PipelineStage::Scanner => Some(PipelineStage::Infrastructure),
            PipelineStage::Infrastructure => Some(PipelineStage::Data),
            PipelineStage::Data => Some(PipelineStage::Weaponizer),
            PipelineStage::Weaponizer => Some(PipelineStage::Commander),
            PipelineStage::Commander => None,
        }
    }
}

/// A concrete agent: one pipeline stage of one team.
///
/// Serialized and displayed in the remote service's flat form
/// (`RED_SCANNER`, `BLUE_INF`, ...) so the wire contract stays
/// byte-compatible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum AgentId {
    #[serde(rename = "RED_SCANNER")]
    #[strum(serialize = "RED_SCANNER")]
    RedScanner,
    #[serde(rename = "RED_INF")]
    #[strum(serialize = "RED_INF")]
    RedInfrastructure,
    #[serde(rename = "RED_DATA")]
    #[strum(serialize = "RED_DATA")]
    RedData,
    #[serde(rename = "RED_WEAPONIZER")]
    #[strum(serialize = "RED_WEAPONIZER")]
    RedWeaponizer,
    #[serde(rename = "RED_COMMANDER")]
    #[strum(serialize = "RED_COMMANDER")]
    RedCommander,
    #[serde(rename = "BLUE_SCANNER")]
    #[strum(serialize = "BLUE_SCANNER")]
    BlueScanner,
    #[serde(rename = "BLUE_INF")]
    #[strum(serialize = "BLUE_INF")]
    BlueInfrastructure,
    #[serde(rename = "BLUE_DATA")]
    #[strum(serialize = "BLUE_DATA")]
    BlueData,
    #[serde(rename = "BLUE_WEAPONIZER")]
    #[strum(serialize = "BLUE_WEAPONIZER")]
    BlueWeaponizer,
    #[serde(rename = "BLUE_COMMANDER")]
    #[strum(serialize = "BLUE_COMMANDER")]
    BlueCommander,
}

impl AgentId {
    /// Looks up the agent filling `stage` for `team`.
    pub fn new(team: Team, stage: PipelineStage) -> Self {
        match (team, stage) {
            (Team::Red, PipelineStage::Scanner) => AgentId::RedScanner,
            (Team::Red, PipelineStage::Infrastructure) => AgentId::RedInfrastructure,
            (Team::Red, PipelineStage::Data) => AgentId::RedData,
            (Team::Red, PipelineStage::Weaponizer) => AgentId::RedWeaponizer,
            (Team::Red, PipelineStage::Commander) => AgentId::RedCommander,
            (Team::Blue, PipelineStage::Scanner) => AgentId::BlueScanner,
            (Team::Blue, PipelineStage::Infrastructure) => AgentId::BlueInfrastructure,
            (Team::Blue, PipelineStage::Data) => AgentId::BlueData,
            (Team::Blue, PipelineStage::Weaponizer) => AgentId::BlueWeaponizer,
            (Team::Blue, PipelineStage::Commander) => AgentId::BlueCommander,
        }
    }

    /// The faction this agent belongs to.
    pub fn team(self) -> Team {
        match self {
            AgentId::RedScanner
            | AgentId::RedInfrastructure
            | AgentId::RedData
            | AgentId::RedWeaponizer
            | AgentId::RedCommander => Team::Red,
            _ => Team::Blue,
        }
    }

    /// The pipeline stage this agent fills.
    pub fn stage(self) -> PipelineStage {
        match self {
            AgentId::RedScanner | AgentId::BlueScanner => PipelineStage::Scanner,
            AgentId::RedInfrastructure | AgentId::BlueInfrastructure => {
                PipelineStage::Infrastructure
            }
            AgentId::RedData | AgentId::BlueData => PipelineStage::Data,
            AgentId::RedWeaponizer | AgentId::BlueWeaponizer => PipelineStage::Weaponizer,
            AgentId::RedCommander | AgentId::BlueCommander => PipelineStage::Commander,
        }
    }
}

/// Presentation status of a single agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AgentStatus {
    #[default]
    Idle,
    Thinking,
    Acting,
}
