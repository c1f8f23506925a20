//! Local deterministic simulator.
//!
//! Replicates the event sequence a live session would produce, including
//! the mid-sequence approval pause and the rewind-on-rejection retry loop.
//! The progression is an explicit state machine driven by a fixed repeating
//! tick; each tick performs exactly one transition.

use std::sync::Arc;

use breachsim_core::agent::{AgentId, AgentStatus, PipelineStage, Team};
use breachsim_core::script::MockScript;
use breachsim_core::session::{Proposal, SessionStore};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, info, warn};

use crate::config::Timing;

/// Damage applied by the red execute step.
pub const RED_STRIKE_DAMAGE: u8 = 30;

/// Mitigation score installed by the blue execute step.
pub const BLUE_MITIGATION_SCORE: u8 = 85;

/// Named states of the simulator.
///
/// The approval gate and the rejection retry are first-class states, not
/// special-cased step numbers: a rejected proposal moves the machine to
/// [`Rethinking`](SimPhase::Rethinking) and, after the rethink delay, back
/// to the start of that team's scanning subsequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimPhase {
    /// Walking the team's pipeline, scanner through weaponizer.
    ///
    /// `announced` is false only before the very first agent has been set
    /// thinking; every hand-off announces the next agent on the same tick.
    Scanning {
        team: Team,
        stage: PipelineStage,
        announced: bool,
    },
    /// Proposal installed; ticks are no-ops until a decision arrives.
    AwaitingApproval { team: Team },
    /// Rejected; waiting out the rethink delay before rewinding.
    Rethinking { team: Team },
    /// Approved; the next tick applies the team's execute effect.
    Executing { team: Team },
    /// Terminal. The tick task exits; the simulator does not loop.
    Done,
}

impl SimPhase {
    /// Start of a team's scanning subsequence (the rewind target).
    fn scanning_start(team: Team) -> Self {
        SimPhase::Scanning {
            team,
            stage: PipelineStage::Scanner,
            announced: true,
        }
    }
}

#[derive(Clone)]
struct SimCore {
    store: SessionStore,
    script: &'static MockScript,
    timing: Timing,
    phase: Arc<Mutex<SimPhase>>,
}

impl SimCore {
    /// Runs one tick. Returns true once the machine is done.
    async fn step(&self) -> bool {
        let mut phase = self.phase.lock().await;
        match *phase {
            SimPhase::Scanning {
                team,
                stage,
                announced: false,
            } => {
                let agent = AgentId::new(team, stage);
                self.store.set_status(agent, AgentStatus::Thinking).await;
                *phase = SimPhase::Scanning {
                    team,
                    stage,
                    announced: true,
                };
                false
            }
            SimPhase::Scanning {
                team,
                stage,
                announced: true,
            } => {
                let agent = AgentId::new(team, stage);
                self.store.set_status(agent, AgentStatus::Idle).await;
                self.store
                    .set_transcript(agent, self.script.line(team, stage).to_string())
                    .await;

                if stage == PipelineStage::Weaponizer {
                    // Pipeline complete: the commander takes over and the
                    // plan goes to the human gate.
                    let commander = AgentId::new(team, PipelineStage::Commander);
                    self.store
                        .set_status(commander, AgentStatus::Thinking)
                        .await;
                    let text = self.script.proposal(team);
                    let installed = self
                        .store
                        .install_proposal(Proposal {
                            team,
                            action: text.action.to_string(),
                            description: text.description.to_string(),
                        })
                        .await;
                    if !installed {
                        warn!(target: "sim", "proposal for {team} refused: one already pending");
                    }
                    info!(target: "sim", "{team} awaiting approval");
                    *phase = SimPhase::AwaitingApproval { team };
                } else if let Some(next) = stage.next() {
                    // Hand-off: next agent starts thinking on the same tick.
                    self.store
                        .set_status(AgentId::new(team, next), AgentStatus::Thinking)
                        .await;
                    *phase = SimPhase::Scanning {
                        team,
                        stage: next,
                        announced: true,
                    };
                }
                false
            }
            // Frozen: the tick keeps firing on schedule but does nothing
            // until an external decision moves the machine.
            SimPhase::AwaitingApproval { .. } | SimPhase::Rethinking { .. } => false,
            SimPhase::Executing { team } => {
                let commander = AgentId::new(team, PipelineStage::Commander);
                self.store
                    .set_transcript(
                        commander,
                        self.script.line(team, PipelineStage::Commander).to_string(),
                    )
                    .await;
                self.store.set_status(commander, AgentStatus::Idle).await;
                match team {
                    Team::Red => {
                        if let Some(generation) =
                            self.store.apply_impact(RED_STRIKE_DAMAGE, None, None).await
                        {
                            let store = self.store.clone();
                            let hit_flash = self.timing.hit_flash;
                            tokio::spawn(async move {
                                tokio::time::sleep(hit_flash).await;
                                store.clear_hit(generation).await;
                            });
                        }
                        *phase = SimPhase::Scanning {
                            team: Team::Blue,
                            stage: PipelineStage::Scanner,
                            announced: false,
                        };
                    }
                    Team::Blue => {
                        self.store
                            .set_defense(
                                BLUE_MITIGATION_SCORE,
                                self.script.defense_description.to_string(),
                            )
                            .await;
                        info!(target: "sim", "session complete");
                        *phase = SimPhase::Done;
                    }
                }
                false
            }
            SimPhase::Done => true,
        }
    }
}

/// Timer-driven replicator of a live session, for when the remote service
/// is slow or unreachable. Single pass; does not loop.
pub struct Simulator {
    core: SimCore,
    tick: JoinHandle<()>,
    aux: Mutex<Vec<JoinHandle<()>>>,
}

impl Simulator {
    /// Chooses a script variant at random and starts the tick task.
    pub fn start(store: SessionStore, timing: Timing) -> Self {
        let script = MockScript::choose(&mut rand::thread_rng());
        Self::start_with_script(store, timing, script)
    }

    /// Starts with a specific script (used by tests and the facade when a
    /// variant was already chosen for canned responses).
    pub fn start_with_script(
        store: SessionStore,
        timing: Timing,
        script: &'static MockScript,
    ) -> Self {
        info!(target: "sim", "mock mode active, script '{}'", script.name);
        let core = SimCore {
            store,
            script,
            timing,
            phase: Arc::new(Mutex::new(SimPhase::Scanning {
                team: Team::Red,
                stage: PipelineStage::Scanner,
                announced: false,
            })),
        };
        let tick = {
            let core = core.clone();
            tokio::spawn(async move {
                let period = core.timing.tick_interval;
                let mut ticker = interval_at(Instant::now() + period, period);
                loop {
                    ticker.tick().await;
                    if core.step().await {
                        break;
                    }
                }
                debug!(target: "sim", "tick task finished");
            })
        };
        Self {
            core,
            tick,
            aux: Mutex::new(Vec::new()),
        }
    }

    /// The script driving this run.
    pub fn script(&self) -> &'static MockScript {
        self.core.script
    }

    /// Current machine state (primarily for assertions and dashboards).
    pub async fn phase(&self) -> SimPhase {
        *self.core.phase.lock().await
    }

    /// Applies a human decision to the pending approval gate.
    ///
    /// Approval unblocks the execute step for the next tick. Rejection
    /// posts the commander's rethink line immediately, then rewinds the
    /// machine to the start of that team's scanning subsequence after the
    /// rethink delay, with the scanner back to thinking.
    pub async fn resolve_decision(&self, approved: bool) {
        let mut phase = self.core.phase.lock().await;
        let SimPhase::AwaitingApproval { team } = *phase else {
            warn!(target: "sim", "decision with no pending approval, ignoring");
            return;
        };
        if approved {
            info!(target: "sim", "{team} proposal approved");
            *phase = SimPhase::Executing { team };
            return;
        }

        info!(target: "sim", "{team} proposal rejected, rewinding");
        let commander = AgentId::new(team, PipelineStage::Commander);
        self.core
            .store
            .set_transcript(commander, self.core.script.rethink.to_string())
            .await;
        self.core
            .store
            .set_status(commander, AgentStatus::Thinking)
            .await;
        *phase = SimPhase::Rethinking { team };
        drop(phase);

        let core = self.core.clone();
        let rewind = tokio::spawn(async move {
            tokio::time::sleep(core.timing.rethink_delay).await;
            let mut phase = core.phase.lock().await;
            if *phase != (SimPhase::Rethinking { team }) {
                return;
            }
            *phase = SimPhase::scanning_start(team);
            core.store
                .set_status(
                    AgentId::new(team, PipelineStage::Commander),
                    AgentStatus::Idle,
                )
                .await;
            core.store
                .set_status(
                    AgentId::new(team, PipelineStage::Scanner),
                    AgentStatus::Thinking,
                )
                .await;
        });
        self.aux.lock().await.push(rewind);
    }

    /// Aborts the tick task and any pending rewind. Idempotent.
    pub async fn shutdown(&self) {
        self.tick.abort();
        for handle in self.aux.lock().await.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for Simulator {
    fn drop(&mut self) {
        // Backstop; the controller shuts down explicitly on every path.
        self.tick.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{Duration, sleep};

    fn fast_timing() -> Timing {
        Timing::scaled_down(30)
    }

    /// A tick period plus slack, for sleeping past N transitions.
    fn ticks(timing: &Timing, n: u32) -> Duration {
        timing.tick_interval * n + timing.tick_interval / 2
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_pipeline_hand_off() {
        let store = SessionStore::new();
        let timing = fast_timing();
        let sim = Simulator::start(store.clone(), timing);

        // Tick 1: scanner thinking.
        sleep(ticks(&timing, 1)).await;
        assert_eq!(
            store.snapshot().await.status_of(AgentId::RedScanner),
            AgentStatus::Thinking
        );

        // Tick 2: scanner reports, infrastructure picks up.
        sleep(timing.tick_interval).await;
        let state = store.snapshot().await;
        assert_eq!(state.status_of(AgentId::RedScanner), AgentStatus::Idle);
        assert!(!state.transcripts[&AgentId::RedScanner].is_empty());
        assert_eq!(
            state.status_of(AgentId::RedInfrastructure),
            AgentStatus::Thinking
        );

        sim.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_pause_at_approval_gate() {
        let store = SessionStore::new();
        let timing = fast_timing();
        let sim = Simulator::start(store.clone(), timing);

        // Ticks 1..=5 walk scanner through weaponizer.
        sleep(ticks(&timing, 5)).await;
        assert_eq!(sim.phase().await, SimPhase::AwaitingApproval { team: Team::Red });
        let state = store.snapshot().await;
        let proposal = state.proposal.as_ref().expect("proposal installed");
        assert_eq!(proposal.team, Team::Red);
        assert!(!proposal.action.is_empty());
        assert_eq!(
            state.status_of(AgentId::RedCommander),
            AgentStatus::Thinking
        );

        // Ticks keep firing but the machine is frozen.
        sleep(ticks(&timing, 3)).await;
        assert_eq!(sim.phase().await, SimPhase::AwaitingApproval { team: Team::Red });
        assert_eq!(store.snapshot().await.health, 100);

        sim.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_approval_unblocks_execute() {
        let store = SessionStore::new();
        let timing = fast_timing();
        let sim = Simulator::start(store.clone(), timing);

        sleep(ticks(&timing, 5)).await;
        store.take_proposal().await;
        sim.resolve_decision(true).await;

        sleep(timing.tick_interval).await;
        let state = store.snapshot().await;
        assert_eq!(state.health, 100 - RED_STRIKE_DAMAGE);
        assert!(matches!(
            sim.phase().await,
            SimPhase::Scanning {
                team: Team::Blue,
                stage: PipelineStage::Scanner,
                ..
            }
        ));

        sim.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rejection_rewinds_to_scanning_start() {
        let store = SessionStore::new();
        let timing = fast_timing();
        let sim = Simulator::start(store.clone(), timing);

        sleep(ticks(&timing, 5)).await;
        store.take_proposal().await;
        sim.resolve_decision(false).await;

        // Rethink line and commander status are immediate.
        let state = store.snapshot().await;
        assert_eq!(
            state.transcripts[&AgentId::RedCommander],
            sim.script().rethink
        );
        assert_eq!(
            state.status_of(AgentId::RedCommander),
            AgentStatus::Thinking
        );

        // Within the rethink delay the scanner is thinking again and the
        // machine sits at the red scanning start.
        sleep(timing.rethink_delay + timing.tick_interval / 3).await;
        assert_eq!(sim.phase().await, SimPhase::scanning_start(Team::Red));
        assert_eq!(
            store.snapshot().await.status_of(AgentId::RedScanner),
            AgentStatus::Thinking
        );

        // The retry walks the pipeline back to a fresh proposal.
        sleep(ticks(&timing, 4)).await;
        assert_eq!(sim.phase().await, SimPhase::AwaitingApproval { team: Team::Red });
        assert!(store.snapshot().await.proposal.is_some());

        sim.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_full_pass_reaches_done() {
        let store = SessionStore::new();
        let timing = fast_timing();
        let sim = Simulator::start(store.clone(), timing);

        sleep(ticks(&timing, 5)).await;
        store.take_proposal().await;
        sim.resolve_decision(true).await;

        // Red execute + blue pipeline + blue approval gate.
        sleep(timing.tick_interval * 6).await;
        assert_eq!(sim.phase().await, SimPhase::AwaitingApproval { team: Team::Blue });
        store.take_proposal().await;
        sim.resolve_decision(true).await;

        sleep(timing.tick_interval).await;
        let state = store.snapshot().await;
        assert_eq!(state.mitigation_score, BLUE_MITIGATION_SCORE);
        assert!(!state.defense_description.is_empty());
        assert_eq!(sim.phase().await, SimPhase::Done);

        // Terminal: nothing moves anymore.
        sleep(timing.tick_interval * 2).await;
        assert_eq!(sim.phase().await, SimPhase::Done);

        sim.shutdown().await;
    }
}
