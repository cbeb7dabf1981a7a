//! Real-time engine for the red/blue simulation.
//!
//! Wraps a [`SimulationRunner`] in a single tokio task that advances logical
//! time in step with the wall clock. Control happens through a cloneable
//! [`EngineHandle`]; the task is the only place the simulation is mutated,
//! so no lock guards the state graph.
//!
//! # Architecture
//!
//! ```text
//! EngineHandle ──► EngineCommand (mpsc) ──► EngineLoop ──► advance_by(delta, speed)
//!  start/pause/speed                           │  ▲
//!  schedule/reset/status                       │  └── Tick timer (50ms)
//!                                              │
//!            watch<Arc<Snapshot>> ◄────────────┤
//!            LogRecord (mpsc)     ◄────────────┘
//! ```

mod config;
mod error;
mod event_loop;
mod handle;

pub use config::{EngineConfig, DEFAULT_TICK};
pub use error::EngineError;
pub use handle::{EngineHandle, EngineStatus, LifecycleState};

use event_loop::EngineLoop;
use redblue_core::{LogRecord, LogSink};
use redblue_simulation::SimulationRunner;
use redblue_state::{Scenario, ScenarioError};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;

/// A running engine task.
///
/// Dropping the engine without [`shutdown`](Self::shutdown) leaves the task
/// running until every [`EngineHandle`] is dropped.
#[derive(Debug)]
pub struct Engine {
    handle: EngineHandle,
    task: JoinHandle<()>,
}

impl Engine {
    /// Load `scenario` and spawn the engine task in the `Stopped` state.
    ///
    /// Must be called from within a tokio runtime. Returns the engine and
    /// the stream of log records, starting with the load records.
    pub fn spawn(
        scenario: Scenario,
        seed: u64,
        config: EngineConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<LogRecord>), ScenarioError> {
        let runner = SimulationRunner::with_config(scenario, seed, config.runner.clone())?;
        Ok(Self::spawn_runner(runner, config))
    }

    /// Spawn the engine around a prepared runner, e.g. one with a planner.
    ///
    /// `config.runner` is ignored; the runner keeps its own configuration.
    pub fn spawn_runner(
        mut runner: SimulationRunner,
        config: EngineConfig,
    ) -> (Self, mpsc::UnboundedReceiver<LogRecord>) {
        let (mut log_tx, log_rx) = mpsc::unbounded_channel();
        for record in runner.history().iter() {
            log_tx.record(record.clone());
        }
        runner.set_log_sink(log_tx);

        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(runner.snapshot()));
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        info!(
            scenario = %runner.scenario().name,
            seed = runner.seed(),
            tick = ?config.tick,
            speed = config.initial_speed,
            "Spawning engine"
        );
        let event_loop = EngineLoop::new(runner, config.tick, config.initial_speed, snapshot_tx);
        let task = tokio::spawn(event_loop.run(cmd_rx));

        (
            Self {
                handle: EngineHandle::new(cmd_tx, snapshot_rx),
                task,
            },
            log_rx,
        )
    }

    pub fn handle(&self) -> EngineHandle {
        self.handle.clone()
    }

    /// Stop the engine task and wait for it to finish.
    pub async fn shutdown(self) -> Result<(), EngineError> {
        self.handle.shutdown();
        self.task.await?;
        Ok(())
    }
}
