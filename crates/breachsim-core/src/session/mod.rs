//! Session state: the single source of truth consumers render from.

mod model;
mod store;

pub use model::{CodeArtifact, EXPLANATION_LOADING, FULL_HEALTH, Proposal, SessionState};
pub use store::SessionStore;
