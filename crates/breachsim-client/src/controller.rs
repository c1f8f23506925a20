//! The command facade: one uniform API over the live channel and the
//! local simulator.
//!
//! Consumers never branch on data source; every operation routes to
//! whichever mode currently owns the session and produces the same
//! observable state shape either way.

use std::sync::Arc;

use breachsim_core::agent::{AgentId, PipelineStage, Team};
use breachsim_core::protocol::OutboundCommand;
use breachsim_core::script::MockScript;
use breachsim_core::session::{CodeArtifact, EXPLANATION_LOADING, SessionState, SessionStore};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::ClientConfig;
use crate::live::LiveChannel;
use crate::sim::Simulator;

/// Which data source currently owns the session. At most one is ever
/// active; transitions tear the old source down before activating the new.
enum Mode {
    /// No source active yet (before `start`, or after a failed connect).
    Idle,
    Live(LiveChannel),
    Mock(Simulator),
}

struct Inner {
    mode: Mode,
    /// Start-liveness watchdog, armed when `START` goes out on a live
    /// channel.
    watchdog: Option<JoinHandle<()>>,
    /// Script used for canned responses when no simulator is running.
    canned_script: Option<&'static MockScript>,
    /// Delayed canned-response tasks (mock explanation), cancelled on
    /// reset.
    pending: Vec<JoinHandle<()>>,
}

/// Owns one session end to end: the state store, the active data source,
/// and every timer. Construct once per session; clones of the inner state
/// are never shared across controllers.
pub struct SessionController {
    config: ClientConfig,
    store: SessionStore,
    inner: Mutex<Inner>,
}

impl SessionController {
    pub fn new(config: ClientConfig) -> Arc<Self> {
        Arc::new(Self {
            config,
            store: SessionStore::new(),
            inner: Mutex::new(Inner {
                mode: Mode::Idle,
                watchdog: None,
                canned_script: None,
                pending: Vec::new(),
            }),
        })
    }

    /// Read-only state for consumers.
    pub async fn snapshot(&self) -> SessionState {
        self.store.snapshot().await
    }

    /// The underlying store (read-only use by consumers).
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Attempts to open the live channel. Transport failure is logged and
    /// swallowed: the session stays mock-capable and `start` will fall
    /// through to the simulator.
    pub async fn connect(&self) {
        match LiveChannel::connect(&self.config, self.store.clone()).await {
            Ok(channel) => {
                let mut inner = self.inner.lock().await;
                inner.mode = Mode::Live(channel);
            }
            Err(e) => {
                warn!(target: "controller", "live connect failed, staying local: {e}");
            }
        }
    }

    /// Starts the mission: `START` over the live channel (watchdog armed),
    /// or the simulator directly when no channel is open.
    pub async fn start(self: &Arc<Self>, mission: &str) {
        let mut inner = self.inner.lock().await;
        match &inner.mode {
            Mode::Live(channel) => {
                info!(target: "controller", "starting mission '{mission}' on live channel");
                if let Err(e) = channel
                    .send(OutboundCommand::Start {
                        mission: mission.to_string(),
                    })
                    .await
                {
                    warn!(target: "controller", "start failed on live channel: {e}");
                    inner.mode = Mode::Idle;
                    self.start_mock(&mut inner);
                    return;
                }
                self.arm_watchdog(&mut inner, mission.to_string());
            }
            Mode::Mock(_) => {
                warn!(target: "controller", "start ignored: simulator already running");
            }
            Mode::Idle => {
                info!(target: "controller", "no live channel, starting mission '{mission}' locally");
                self.start_mock(&mut inner);
            }
        }
    }

    /// Arms the start-liveness timer: if no liveness-proving event arrives
    /// before expiry, the live channel is torn down first and the
    /// simulator takes over. A qualifying event before expiry disarms it
    /// for the session.
    fn arm_watchdog(self: &Arc<Self>, inner: &mut Inner, mission: String) {
        // Re-arming replaces the old timer outright.
        if let Some(stale) = inner.watchdog.take() {
            stale.abort();
        }
        let controller = Arc::clone(self);
        inner.watchdog = Some(tokio::spawn(async move {
            tokio::time::sleep(controller.config.timing.liveness_timeout).await;
            let mut inner = controller.inner.lock().await;
            let Mode::Live(channel) = &inner.mode else {
                return;
            };
            if channel.liveness_proven() {
                return;
            }
            warn!(
                target: "controller",
                "no liveness within {:?} of START, falling back to local simulator for '{mission}'",
                controller.config.timing.liveness_timeout,
            );
            // Teardown before activation: the two modes never interleave.
            channel.close();
            inner.mode = Mode::Idle;
            controller.start_mock(&mut inner);
        }));
    }

    /// Activates the simulator. Caller holds the inner lock.
    fn start_mock(&self, inner: &mut Inner) {
        let script = match inner.canned_script {
            Some(script) => script,
            None => {
                let script = MockScript::choose(&mut rand::thread_rng());
                inner.canned_script = Some(script);
                script
            }
        };
        let simulator =
            Simulator::start_with_script(self.store.clone(), self.config.timing, script);
        inner.mode = Mode::Mock(simulator);
    }

    /// Requests a plain-language summary of a team's activity.
    pub async fn request_summary(&self, team: Team) {
        let mut inner = self.inner.lock().await;
        if let Mode::Live(channel) = &inner.mode {
            if let Err(e) = channel.send(OutboundCommand::Summarize { team }).await {
                warn!(target: "controller", "summarize failed: {e}");
            }
            return;
        }
        let script = Self::canned_script(&mut inner);
        let commander = AgentId::new(team, PipelineStage::Commander);
        self.store
            .set_transcript(commander, script.summary(team).to_string())
            .await;
    }

    /// Requests the code artifact behind a team's current move.
    pub async fn request_code(&self, team: Team) {
        let mut inner = self.inner.lock().await;
        if let Mode::Live(channel) = &inner.mode {
            if let Err(e) = channel.send(OutboundCommand::GetCode { team }).await {
                warn!(target: "controller", "get_code failed: {e}");
            }
            return;
        }
        let code = Self::canned_script(&mut inner).code(team);
        self.store
            .set_code_artifact(CodeArtifact {
                team,
                code: code.code.to_string(),
                title: code.title.to_string(),
                description: code.description.to_string(),
            })
            .await;
    }

    /// Requests an educational explanation of the current exchange. The
    /// loading sentinel lands synchronously in both modes so consumers can
    /// render a spinner without branching on data source.
    pub async fn request_explanation(&self) {
        self.store
            .set_explanation(Some(EXPLANATION_LOADING.to_string()))
            .await;
        let mut inner = self.inner.lock().await;
        if let Mode::Live(channel) = &inner.mode {
            if let Err(e) = channel.send(OutboundCommand::Explain).await {
                warn!(target: "controller", "explain failed: {e}");
            }
            return;
        }
        // Canned reply after one tick, standing in for the remote round
        // trip.
        let script = Self::canned_script(&mut inner);
        let store = self.store.clone();
        let delay = self.config.timing.tick_interval;
        inner.pending.push(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            store.set_explanation(Some(script.explanation.to_string())).await;
        }));
    }

    /// Submits the human decision on the pending proposal.
    ///
    /// The proposal is cleared unconditionally and synchronously before
    /// any effect is applied: the approval UI must never be able to
    /// double-submit.
    pub async fn submit_decision(&self, approved: bool) {
        self.store.take_proposal().await;
        let inner = self.inner.lock().await;
        match &inner.mode {
            Mode::Live(channel) => {
                if let Err(e) = channel.send(OutboundCommand::Decision { approved }).await {
                    warn!(target: "controller", "decision failed: {e}");
                }
            }
            Mode::Mock(simulator) => simulator.resolve_decision(approved).await,
            Mode::Idle => {
                warn!(target: "controller", "decision with no active session, ignoring");
            }
        }
    }

    /// Consumer-initiated dismissal of the ephemeral code artifact.
    pub async fn clear_code_artifact(&self) {
        self.store.clear_code_artifact().await;
    }

    /// Tears down whichever source is active plus every owned timer, then
    /// restores the store to session-start defaults.
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(watchdog) = inner.watchdog.take() {
            watchdog.abort();
        }
        for handle in inner.pending.drain(..) {
            handle.abort();
        }
        match std::mem::replace(&mut inner.mode, Mode::Idle) {
            Mode::Live(channel) => channel.close(),
            Mode::Mock(simulator) => simulator.shutdown().await,
            Mode::Idle => {}
        }
        inner.canned_script = None;
        drop(inner);

        self.store.reset().await;
        info!(target: "controller", "session reset");
    }

    /// Whether the session is currently driven by the local simulator.
    pub async fn is_mock(&self) -> bool {
        matches!(self.inner.lock().await.mode, Mode::Mock(_))
    }

    /// Whether a live channel currently owns the session.
    pub async fn is_live(&self) -> bool {
        matches!(self.inner.lock().await.mode, Mode::Live(_))
    }

    fn canned_script(inner: &mut Inner) -> &'static MockScript {
        if let Mode::Mock(simulator) = &inner.mode {
            return simulator.script();
        }
        match inner.canned_script {
            Some(script) => script,
            None => {
                let script = MockScript::choose(&mut rand::thread_rng());
                inner.canned_script = Some(script);
                script
            }
        }
    }
}
