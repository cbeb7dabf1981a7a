//! Error types for the real-time engine.

use redblue_state::ScenarioError;
use thiserror::Error;

/// Errors returned by [`EngineHandle`](crate::EngineHandle) and [`Engine`](crate::Engine).
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine task has shut down.
    #[error("engine task is not running")]
    Stopped,

    /// Speed factors must be finite and non-negative.
    #[error("invalid speed factor {0}: must be finite and >= 0")]
    InvalidSpeed(f64),

    /// A reset was rejected; the current run is untouched.
    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    /// The engine task panicked or was cancelled.
    #[error("engine task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
