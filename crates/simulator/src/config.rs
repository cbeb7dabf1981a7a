//! Configuration types for the simulator.
//!
//! Every field has a default, so a TOML file only needs the values it
//! changes:
//!
//! ```toml
//! scenario = "mvp"
//! seed = 42
//! mode = "paced"
//! duration_secs = 5.0
//! speed = 2.0
//! replenish_interval_secs = 10.0
//! ```

use crate::{scenarios, ConfigError};
use clap::ValueEnum;
use redblue_engine::EngineConfig;
use redblue_simulation::RunnerConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// How logical time is driven.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Resolve events as fast as possible up to a logical deadline.
    #[default]
    Stepped,
    /// Advance logical time with the wall clock through the engine task.
    Paced,
}

/// Configuration for a simulator run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulatorConfig {
    /// Built-in scenario to load.
    pub scenario: String,

    /// Random seed. When omitted, a random seed is chosen and logged.
    pub seed: Option<u64>,

    pub mode: RunMode,

    /// Logical deadline for stepped runs, in seconds.
    pub until_secs: f64,

    /// Wall-clock length of paced runs, in seconds.
    pub duration_secs: f64,

    /// Logical seconds per wall-clock second in paced runs.
    pub speed: f64,

    /// Wall-clock quantum between paced ticks, in milliseconds.
    pub tick_ms: u64,

    /// Log records kept for the report.
    pub history: usize,

    /// Replenish action points at this logical interval, in seconds.
    pub replenish_interval_secs: Option<f64>,

    /// Schedule the scripted red/blue exchange at load.
    pub demo_intents: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            scenario: scenarios::MVP.to_string(),
            seed: None,
            mode: RunMode::Stepped,
            until_secs: 10.0,
            duration_secs: 10.0,
            speed: 1.0,
            tick_ms: 50,
            history: redblue_core::DEFAULT_HISTORY_CAPACITY,
            replenish_interval_secs: None,
            demo_intents: true,
        }
    }
}

impl SimulatorConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_until(mut self, secs: f64) -> Self {
        self.until_secs = secs;
        self
    }

    pub fn with_duration(mut self, secs: f64) -> Self {
        self.duration_secs = secs;
        self
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_history(mut self, history: usize) -> Self {
        self.history = history;
        self
    }

    /// Reject values the runner would otherwise silently clamp.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if scenarios::by_name(&self.scenario).is_none() {
            return Err(ConfigError::UnknownScenario(self.scenario.clone()));
        }
        seconds("until_secs", self.until_secs)?;
        seconds("duration_secs", self.duration_secs)?;
        non_negative("speed", self.speed)?;
        if self.tick_ms == 0 {
            return Err(invalid("tick_ms", "must be at least 1"));
        }
        if self.history == 0 {
            return Err(invalid("history", "must be at least 1"));
        }
        if let Some(interval) = self.replenish_interval_secs {
            seconds("replenish_interval_secs", interval)?;
            if interval == 0.0 {
                return Err(invalid("replenish_interval_secs", "must be positive"));
            }
        }
        Ok(())
    }

    pub fn until(&self) -> Duration {
        to_duration(self.until_secs)
    }

    pub fn duration(&self) -> Duration {
        to_duration(self.duration_secs)
    }

    pub fn runner_config(&self) -> RunnerConfig {
        let mut config = RunnerConfig::default().with_history_capacity(self.history);
        if let Some(interval) = self.replenish_interval_secs {
            config = config.with_replenish_interval(to_duration(interval));
        }
        config
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_tick(Duration::from_millis(self.tick_ms))
            .with_speed(self.speed)
            .with_runner(self.runner_config())
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(field, format!("expected a finite value >= 0, got {value}")))
    }
}

/// Seconds as a `Duration`, saturating out-of-range values.
fn to_duration(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

/// A non-negative number of seconds that fits in a `Duration`.
fn seconds(field: &'static str, value: f64) -> Result<(), ConfigError> {
    non_negative(field, value)?;
    if Duration::try_from_secs_f64(value).is_err() {
        return Err(invalid(field, format!("{value} seconds is out of range")));
    }
    Ok(())
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
