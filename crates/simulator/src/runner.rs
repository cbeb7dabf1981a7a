//! Simulator driver for stepped and paced runs.

use crate::{scenarios, ConfigError, RunMode, SimulationReport, SimulatorConfig, SimulatorError};
use redblue_core::{HistoryBuffer, Intent, LogSink};
use redblue_engine::Engine;
use redblue_simulation::SimulationRunner;
use redblue_state::Scenario;
use tracing::info;

/// A configured, ready-to-run simulation.
#[derive(Debug, Clone)]
pub struct Simulator {
    config: SimulatorConfig,
    scenario: Scenario,
    seed: u64,
    intents: Vec<Intent>,
}

impl Simulator {
    /// Validate `config`, pick the seed and load the scenario definition.
    pub fn new(config: SimulatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let scenario = scenarios::by_name(&config.scenario)
            .ok_or_else(|| ConfigError::UnknownScenario(config.scenario.clone()))?;
        let seed = config.seed.unwrap_or_else(rand::random);
        let intents = if config.demo_intents {
            scenarios::demo_intents()
        } else {
            Vec::new()
        };

        info!(
            scenario = %config.scenario,
            seed,
            mode = ?config.mode,
            "Simulator configured"
        );
        Ok(Self {
            config,
            scenario,
            seed,
            intents,
        })
    }

    /// Add an intent to schedule before the run starts.
    pub fn with_intent(mut self, intent: Intent) -> Self {
        self.intents.push(intent);
        self
    }

    /// The seed in use; pass it back in to replay the run.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub async fn run(&self) -> Result<SimulationReport, SimulatorError> {
        match self.config.mode {
            RunMode::Stepped => self.run_stepped(),
            RunMode::Paced => self.run_paced().await,
        }
    }

    /// Resolve everything due by the configured logical deadline.
    pub fn run_stepped(&self) -> Result<SimulationReport, SimulatorError> {
        let mut runner =
            SimulationRunner::with_config(self.scenario.clone(), self.seed, self.config.runner_config())?;
        for intent in &self.intents {
            runner.schedule(intent.clone());
        }

        runner.run_until(self.config.until());
        info!(
            events = runner.stats().events_processed,
            now = ?runner.now(),
            "Stepped run complete"
        );

        Ok(SimulationReport {
            scenario: self.scenario.name.clone(),
            seed: self.seed,
            mode: RunMode::Stepped,
            snapshot: runner.snapshot(),
            history: runner.history().iter().cloned().collect(),
        })
    }

    /// Drive the engine in real time for the configured wall-clock duration.
    pub async fn run_paced(&self) -> Result<SimulationReport, SimulatorError> {
        let (engine, mut logs) =
            Engine::spawn(self.scenario.clone(), self.seed, self.config.engine_config())?;
        let handle = engine.handle();
        for intent in &self.intents {
            handle.schedule(intent.clone())?;
        }

        handle.start()?;
        tokio::time::sleep(self.config.duration()).await;
        handle.pause()?;

        let status = handle.status().await?;
        let snapshot = handle.snapshot();
        engine.shutdown().await?;
        info!(
            events = status.events_processed,
            now = ?status.now,
            "Paced run complete"
        );

        let mut history = HistoryBuffer::with_capacity(self.config.history);
        while let Ok(record) = logs.try_recv() {
            history.record(record);
        }

        Ok(SimulationReport {
            scenario: self.scenario.name.clone(),
            seed: self.seed,
            mode: RunMode::Paced,
            snapshot: (*snapshot).clone(),
            history: history.iter().cloned().collect(),
        })
    }
}
