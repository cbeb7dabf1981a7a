//! Command surface for the engine task.

use crate::EngineError;
use redblue_core::Intent;
use redblue_simulation::Snapshot;
use redblue_state::{Scenario, ScenarioError};
use serde::{Serialize, Serializer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};

/// Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Stopped,
    Running,
    Paused,
}

impl LifecycleState {
    pub fn is_running(self) -> bool {
        self == LifecycleState::Running
    }
}

/// Engine status at the moment the request was handled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineStatus {
    pub lifecycle: LifecycleState,
    pub speed: f64,
    #[serde(serialize_with = "serialize_secs")]
    pub now: Duration,
    pub pending_events: usize,
    pub events_processed: u64,
}

fn serialize_secs<S: Serializer>(time: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(time.as_secs_f64())
}

/// Command sent to the engine task.
#[derive(Debug)]
pub(crate) enum EngineCommand {
    Start,
    Pause,
    SetSpeed(f64),
    /// Intent is boxed to keep the enum small.
    Schedule(Box<Intent>),
    Reset {
        scenario: Box<Scenario>,
        seed: u64,
        ack: oneshot::Sender<Result<(), ScenarioError>>,
    },
    Status(oneshot::Sender<EngineStatus>),
    Shutdown,
}

/// Cloneable handle for controlling a running [`Engine`](crate::Engine).
///
/// Commands are queued and consumed by the engine task in order, between
/// ticks. None of them touch the simulation state directly.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<EngineCommand>,
    snapshots: watch::Receiver<Arc<Snapshot>>,
}

impl EngineHandle {
    pub(crate) fn new(
        tx: mpsc::UnboundedSender<EngineCommand>,
        snapshots: watch::Receiver<Arc<Snapshot>>,
    ) -> Self {
        Self { tx, snapshots }
    }

    fn send(&self, command: EngineCommand) -> Result<(), EngineError> {
        self.tx.send(command).map_err(|_| EngineError::Stopped)
    }

    /// Begin or resume paced execution. No-op while running.
    pub fn start(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::Start)
    }

    /// Stop consuming events and advancing time. No-op unless running.
    pub fn pause(&self) -> Result<(), EngineError> {
        self.send(EngineCommand::Pause)
    }

    /// Change the wall-clock to logical-time multiplier.
    pub fn set_speed(&self, factor: f64) -> Result<(), EngineError> {
        if !factor.is_finite() || factor < 0.0 {
            return Err(EngineError::InvalidSpeed(factor));
        }
        self.send(EngineCommand::SetSpeed(factor))
    }

    /// Enqueue an intent; it lands in the scheduler before the next tick.
    pub fn schedule(&self, intent: Intent) -> Result<(), EngineError> {
        self.send(EngineCommand::Schedule(Box::new(intent)))
    }

    /// Replace the run. Resolves once the engine has applied or rejected it.
    ///
    /// On success the engine is `Stopped` at logical time zero.
    pub async fn reset(&self, scenario: Scenario, seed: u64) -> Result<(), EngineError> {
        let (ack, rx) = oneshot::channel();
        self.send(EngineCommand::Reset {
            scenario: Box::new(scenario),
            seed,
            ack,
        })?;
        rx.await.map_err(|_| EngineError::Stopped)??;
        Ok(())
    }

    pub async fn status(&self) -> Result<EngineStatus, EngineError> {
        let (tx, rx) = oneshot::channel();
        self.send(EngineCommand::Status(tx))?;
        rx.await.map_err(|_| EngineError::Stopped)
    }

    /// Most recently published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified whenever a new snapshot is published.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshots.clone()
    }

    pub(crate) fn shutdown(&self) {
        let _ = self.tx.send(EngineCommand::Shutdown);
    }
}
