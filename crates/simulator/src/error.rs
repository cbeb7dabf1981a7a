//! Error types for the simulator.

use redblue_engine::EngineError;
use redblue_state::ScenarioError;
use std::path::PathBuf;
use thiserror::Error;

/// Problems with a simulator configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("unknown scenario '{0}'")]
    UnknownScenario(String),

    #[error("invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

/// Errors from a simulator run.
#[derive(Debug, Error)]
pub enum SimulatorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scenario(#[from] ScenarioError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}
