//! Orchestration layer for a breachsim session.
//!
//! Wires the domain types from `breachsim-core` to a data source: the live
//! game channel when the remote service is reachable, a deterministic local
//! simulator otherwise. [`SessionController`] is the single entry point;
//! consumers drive it and read [`SessionStore`](breachsim_core::session::SessionStore)
//! snapshots.

pub mod config;
pub mod controller;
pub mod live;
pub mod sim;

pub use config::{ClientConfig, Timing};
pub use controller::SessionController;
pub use live::LiveChannel;
pub use sim::Simulator;
