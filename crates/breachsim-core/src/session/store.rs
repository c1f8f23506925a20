//! Shared handle around the session state.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::agent::{AgentId, AgentStatus};
use crate::protocol::InboundEvent;
use crate::session::model::{CodeArtifact, Proposal, SessionState};

/// Shared, internally synchronized handle to the [`SessionState`].
///
/// Consumers call [`snapshot`](Self::snapshot); everything else is the
/// narrow mutation surface used by the data-source adapters. Mutations are
/// whole-field replacements or well-defined reducers, never partial merges.
#[derive(Clone, Default)]
pub struct SessionStore {
    state: Arc<RwLock<SessionState>>,
    /// Bumped on every hit so a stale flash-clear cannot revert a newer hit.
    hit_generation: Arc<RwLock<u64>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state, cloned for rendering.
    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Applies one inbound event.
    ///
    /// Returns the hit generation when the event flashed the hit flag, so
    /// the caller can schedule [`clear_hit`](Self::clear_hit) after the
    /// flash window.
    pub async fn apply(&self, event: InboundEvent) -> Option<u64> {
        match event {
            InboundEvent::StateUpdate { agent, status } => {
                self.set_status(agent, status).await;
                None
            }
            InboundEvent::NewMessage { agent, text } => {
                self.set_transcript(agent, text).await;
                None
            }
            InboundEvent::Impact {
                damage_taken,
                mitigation_score,
                defense_desc,
            } => {
                self.apply_impact(damage_taken, mitigation_score, defense_desc)
                    .await
            }
            InboundEvent::Proposal {
                team,
                action,
                description,
            } => {
                self.install_proposal(Proposal {
                    team,
                    action,
                    description,
                })
                .await;
                None
            }
            InboundEvent::CodeResponse {
                team,
                code,
                title,
                description,
            } => {
                self.set_code_artifact(CodeArtifact {
                    team,
                    code,
                    title,
                    description,
                })
                .await;
                None
            }
            InboundEvent::EducationalResponse { edu_text } => {
                self.set_explanation(Some(edu_text)).await;
                None
            }
        }
    }

    pub async fn set_status(&self, agent: AgentId, status: AgentStatus) {
        self.state.write().await.statuses.insert(agent, status);
    }

    /// Latest line per agent; overwrites, never appends.
    pub async fn set_transcript(&self, agent: AgentId, text: String) {
        self.state.write().await.transcripts.insert(agent, text);
    }

    /// Applies an impact: damage clamped at zero health, optional defense
    /// fields replaced wholesale. Returns the new hit generation when the
    /// damage was nonzero.
    pub async fn apply_impact(
        &self,
        damage: u8,
        mitigation_score: Option<u8>,
        defense_desc: Option<String>,
    ) -> Option<u64> {
        let mut state = self.state.write().await;
        state.take_damage(damage);
        if let Some(score) = mitigation_score {
            state.mitigation_score = score;
        }
        if let Some(desc) = defense_desc {
            state.defense_description = desc;
        }
        if damage == 0 {
            return None;
        }
        state.is_hit = true;
        drop(state);

        let mut generation = self.hit_generation.write().await;
        *generation += 1;
        Some(*generation)
    }

    /// Reverts the hit flash, unless a newer hit has landed since
    /// `generation` was issued.
    pub async fn clear_hit(&self, generation: u64) {
        let current = *self.hit_generation.read().await;
        if current == generation {
            self.state.write().await.is_hit = false;
        }
    }

    /// Applies the defender execution effect (mitigation + description).
    pub async fn set_defense(&self, mitigation_score: u8, defense_desc: String) {
        let mut state = self.state.write().await;
        state.mitigation_score = mitigation_score;
        state.defense_description = defense_desc;
    }

    /// Installs a pending proposal. Refused (returns false) while another
    /// proposal is outstanding: at most one is ever pending.
    pub async fn install_proposal(&self, proposal: Proposal) -> bool {
        let mut state = self.state.write().await;
        if state.proposal.is_some() {
            return false;
        }
        state.proposal = Some(proposal);
        true
    }

    /// Removes and returns the pending proposal, if any.
    pub async fn take_proposal(&self) -> Option<Proposal> {
        self.state.write().await.proposal.take()
    }

    pub async fn set_code_artifact(&self, artifact: CodeArtifact) {
        self.state.write().await.code_artifact = Some(artifact);
    }

    /// Consumer-initiated dismissal of the ephemeral artifact.
    pub async fn clear_code_artifact(&self) {
        self.state.write().await.code_artifact = None;
    }

    pub async fn set_explanation(&self, explanation: Option<String>) {
        self.state.write().await.explanation = explanation;
    }

    /// Restores every field to its session-start default.
    pub async fn reset(&self) {
        *self.state.write().await = SessionState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Team;
    use crate::session::model::FULL_HEALTH;

    #[tokio::test]
    async fn test_health_never_goes_negative() {
        let store = SessionStore::new();
        for _ in 0..10 {
            store.apply_impact(40, None, None).await;
        }
        assert_eq!(store.snapshot().await.health, 0);
    }

    #[tokio::test]
    async fn test_impact_updates_defense_fields() {
        let store = SessionStore::new();
        store
            .apply_impact(5, Some(85), Some("Adaptive WAF".to_string()))
            .await;
        let state = store.snapshot().await;
        assert_eq!(state.health, 95);
        assert_eq!(state.mitigation_score, 85);
        assert_eq!(state.defense_description, "Adaptive WAF");
        assert!(state.is_hit);
    }

    #[tokio::test]
    async fn test_zero_damage_does_not_flash() {
        let store = SessionStore::new();
        let generation = store.apply_impact(0, Some(40), None).await;
        assert!(generation.is_none());
        assert!(!store.snapshot().await.is_hit);
    }

    #[tokio::test]
    async fn test_stale_hit_clear_is_ignored() {
        let store = SessionStore::new();
        let first = store.apply_impact(10, None, None).await.unwrap();
        let second = store.apply_impact(10, None, None).await.unwrap();
        assert_ne!(first, second);

        // The first impact's scheduled clear fires after the second hit:
        // the flash must survive.
        store.clear_hit(first).await;
        assert!(store.snapshot().await.is_hit);

        store.clear_hit(second).await;
        assert!(!store.snapshot().await.is_hit);
    }

    #[tokio::test]
    async fn test_single_pending_proposal() {
        let store = SessionStore::new();
        let proposal = Proposal {
            team: Team::Red,
            action: "SYN flood".to_string(),
            description: "Saturate the edge".to_string(),
        };
        assert!(store.install_proposal(proposal.clone()).await);
        assert!(!store.install_proposal(proposal).await);

        assert!(store.take_proposal().await.is_some());
        assert!(store.take_proposal().await.is_none());
    }

    #[tokio::test]
    async fn test_transcript_overwrites() {
        let store = SessionStore::new();
        store
            .set_transcript(AgentId::RedScanner, "first".to_string())
            .await;
        store
            .set_transcript(AgentId::RedScanner, "second".to_string())
            .await;
        let state = store.snapshot().await;
        assert_eq!(state.transcripts.len(), 1);
        assert_eq!(state.transcripts[&AgentId::RedScanner], "second");
    }

    #[tokio::test]
    async fn test_reset_restores_defaults() {
        let store = SessionStore::new();
        store.apply_impact(30, Some(50), Some("rule".to_string())).await;
        store.set_status(AgentId::BlueScanner, AgentStatus::Thinking).await;
        store
            .set_transcript(AgentId::RedData, "exfil staged".to_string())
            .await;
        store.set_explanation(Some("because".to_string())).await;
        store
            .set_code_artifact(CodeArtifact {
                team: Team::Blue,
                code: "drop tcp".to_string(),
                title: "Rate limiter".to_string(),
                description: "Edge rule".to_string(),
            })
            .await;

        store.reset().await;
        let state = store.snapshot().await;
        assert_eq!(state.health, FULL_HEALTH);
        assert!(!state.is_hit);
        assert_eq!(state.mitigation_score, 0);
        assert!(state.defense_description.is_empty());
        assert!(state.proposal.is_none());
        assert!(state.code_artifact.is_none());
        assert!(state.explanation.is_none());
        assert!(state.transcripts.is_empty());
        assert!(state.statuses.is_empty());
    }
}
