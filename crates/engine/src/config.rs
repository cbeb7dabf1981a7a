//! Engine configuration.

use redblue_simulation::RunnerConfig;
use std::time::Duration;

/// Default wall-clock quantum between paced ticks.
pub const DEFAULT_TICK: Duration = Duration::from_millis(50);

/// Configuration for the real-time engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Wall-clock time between ticks (default: 50ms).
    pub tick: Duration,

    /// Speed factor after spawn and after every reset (default: 1.0).
    pub initial_speed: f64,

    /// Configuration of the owned runner.
    pub runner: RunnerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            initial_speed: 1.0,
            runner: RunnerConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick.max(Duration::from_millis(1));
        self
    }

    /// Invalid factors fall back to 1.0.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.initial_speed = if speed.is_finite() && speed >= 0.0 {
            speed
        } else {
            1.0
        };
        self
    }

    pub fn with_runner(mut self, runner: RunnerConfig) -> Self {
        self.runner = runner;
        self
    }
}
