//! Client configuration: endpoint resolution and timing knobs.

use std::time::Duration;

use breachsim_core::{BreachError, Result};
use url::Url;

/// Env var holding the HTTP(S) base of the remote service.
pub const BASE_URL_ENV: &str = "BREACHSIM_BASE_URL";

/// Base used when the environment provides none.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// Path of the duplex game channel on the remote service.
const GAME_CHANNEL_PATH: &str = "/ws/game";

/// Every timer the controller owns, in one place.
///
/// Defaults are the production constants; tests scale them down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// How long a channel may stay pending before it is abandoned.
    pub connect_timeout: Duration,
    /// How long after `START` the remote has to prove liveness.
    pub liveness_timeout: Duration,
    /// Simulator tick period.
    pub tick_interval: Duration,
    /// How long `is_hit` stays true after damage.
    pub hit_flash: Duration,
    /// Pause between a rejection and the pipeline rewind.
    pub rethink_delay: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(3000),
            liveness_timeout: Duration::from_millis(5000),
            tick_interval: Duration::from_millis(1500),
            hit_flash: Duration::from_millis(500),
            rethink_delay: Duration::from_millis(1500),
        }
    }
}

impl Timing {
    /// Uniformly scaled-down timing for fast deterministic tests.
    pub fn scaled_down(divisor: u32) -> Self {
        let d = Self::default();
        Self {
            connect_timeout: d.connect_timeout / divisor,
            liveness_timeout: d.liveness_timeout / divisor,
            tick_interval: d.tick_interval / divisor,
            hit_flash: d.hit_flash / divisor,
            rethink_delay: d.rethink_delay / divisor,
        }
    }
}

/// Configuration for one [`SessionController`](crate::SessionController).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// HTTP(S) base of the remote service.
    pub base_url: String,
    pub timing: Timing,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timing: Timing::default(),
        }
    }
}

impl ClientConfig {
    /// Resolves the base URL from the environment, falling back to
    /// [`DEFAULT_BASE_URL`] when unset or blank.
    pub fn from_env() -> Self {
        let base_url = match std::env::var(BASE_URL_ENV) {
            Ok(value) if !value.trim().is_empty() => value,
            _ => DEFAULT_BASE_URL.to_string(),
        };
        Self {
            base_url,
            timing: Timing::default(),
        }
    }

    /// Derives the game channel endpoint from the base URL: http maps to
    /// ws, https to wss; ws/wss bases pass through unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`BreachError::Config`] for an unparseable base or an
    /// unsupported scheme.
    pub fn ws_url(&self) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| BreachError::config(format!("invalid base url: {e}")))?;
        let scheme = match url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => {
                return Err(BreachError::config(format!(
                    "unsupported scheme for game channel: {other}"
                )));
            }
        };
        url.set_scheme(scheme)
            .map_err(|_| BreachError::config("base url cannot carry a ws scheme"))?;
        url.set_path(GAME_CHANNEL_PATH);
        Ok(url)
    }
}
