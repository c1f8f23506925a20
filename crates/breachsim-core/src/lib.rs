//! Domain layer for the breachsim session controller.
//!
//! Pure data and state: faction/agent identities, the session state store,
//! the wire protocol codec, and the mock narrative scripts. No I/O and no
//! timers live here; those belong to `breachsim-client`.

pub mod agent;
pub mod error;
pub mod protocol;
pub mod script;
pub mod session;

// Re-export common error type
pub use error::{BreachError, Result};
