//! The engine task.

use crate::handle::{EngineCommand, EngineStatus, LifecycleState};
use redblue_simulation::{SimulationRunner, Snapshot};
use redblue_state::{Scenario, ScenarioError};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

/// Shortest tick the interval timer accepts.
const MIN_TICK: Duration = Duration::from_millis(1);

/// Sole owner of the runner. Every state mutation happens here.
pub(crate) struct EngineLoop {
    runner: SimulationRunner,
    lifecycle: LifecycleState,
    speed: f64,
    initial_speed: f64,
    tick: Duration,
    /// Wall-clock instant of the last paced tick while running.
    last_tick: Option<Instant>,
    snapshots: watch::Sender<Arc<Snapshot>>,
}

enum Flow {
    Continue,
    Exit,
}

impl EngineLoop {
    pub(crate) fn new(
        runner: SimulationRunner,
        tick: Duration,
        speed: f64,
        snapshots: watch::Sender<Arc<Snapshot>>,
    ) -> Self {
        Self {
            runner,
            lifecycle: LifecycleState::Stopped,
            speed,
            initial_speed: speed,
            tick: tick.max(MIN_TICK),
            last_tick: None,
            snapshots,
        }
    }

    /// Run until shutdown or until every handle is dropped.
    pub(crate) async fn run(mut self, mut rx: mpsc::UnboundedReceiver<EngineCommand>) {
        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                // Commands are drained before the next tick.
                biased;

                maybe_cmd = rx.recv() => {
                    let Some(cmd) = maybe_cmd else {
                        debug!("All engine handles dropped");
                        break;
                    };
                    if let Flow::Exit = self.handle_command(cmd) {
                        break;
                    }
                }

                _ = ticker.tick(), if self.lifecycle.is_running() => {
                    self.on_tick();
                }
            }
        }

        self.runner.log_control("Engine stopped", json!({}));
        debug!("Engine loop shutting down");
    }

    fn handle_command(&mut self, cmd: EngineCommand) -> Flow {
        match cmd {
            EngineCommand::Start => self.start(),
            EngineCommand::Pause => self.pause(),
            EngineCommand::SetSpeed(factor) => {
                info!(speed = factor, "Setting simulation speed");
                self.speed = factor;
                self.runner
                    .log_control(format!("Speed set to {factor}x"), json!({ "speed": factor }));
            }
            EngineCommand::Schedule(intent) => {
                trace!(intent = %intent.label(), time = ?intent.time, "Intent submitted");
                self.runner.schedule(*intent);
                self.publish();
            }
            EngineCommand::Reset { scenario, seed, ack } => {
                let result = self.reset(*scenario, seed);
                let _ = ack.send(result);
            }
            EngineCommand::Status(reply) => {
                let _ = reply.send(self.status());
            }
            EngineCommand::Shutdown => return Flow::Exit,
        }
        Flow::Continue
    }

    fn start(&mut self) {
        if self.lifecycle.is_running() {
            debug!("Simulation is already running");
            return;
        }
        info!(now = ?self.runner.now(), "Starting simulation");
        self.lifecycle = LifecycleState::Running;
        self.last_tick = Some(Instant::now());
        self.runner
            .log_control("Simulation started", json!({ "speed": self.speed }));
    }

    fn pause(&mut self) {
        if !self.lifecycle.is_running() {
            debug!(lifecycle = ?self.lifecycle, "Simulation is not running");
            return;
        }
        // Catch up to the pause instant so no wall-clock time is lost.
        self.on_tick();
        info!(now = ?self.runner.now(), "Pausing simulation");
        self.lifecycle = LifecycleState::Paused;
        self.last_tick = None;
        self.runner.log_control("Simulation paused", json!({}));
        self.publish();
    }

    fn reset(&mut self, scenario: Scenario, seed: u64) -> Result<(), ScenarioError> {
        self.runner.reset(scenario, seed)?;
        self.lifecycle = LifecycleState::Stopped;
        self.last_tick = None;
        self.speed = self.initial_speed;
        self.runner.log_control(
            "Simulation reset complete, ready to start",
            json!({ "seed": seed }),
        );
        self.publish();
        Ok(())
    }

    fn on_tick(&mut self) {
        let now = Instant::now();
        let Some(last) = self.last_tick.replace(now) else {
            return;
        };
        let processed = self.runner.advance_by(now - last, self.speed);
        if processed > 0 {
            trace!(processed, now = ?self.runner.now(), "Paced tick");
        }
        self.publish();
    }

    fn status(&self) -> EngineStatus {
        EngineStatus {
            lifecycle: self.lifecycle,
            speed: self.speed,
            now: self.runner.now(),
            pending_events: self.runner.pending_events(),
            events_processed: self.runner.stats().events_processed,
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(Arc::new(self.runner.snapshot()));
    }
}
