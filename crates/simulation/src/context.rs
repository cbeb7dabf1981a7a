//! Per-run simulation state.

use crate::EventScheduler;
use redblue_state::{RandomStream, Scenario, ScenarioError, StateStore};
use std::time::Duration;

/// Everything one run mutates, owned in one place.
///
/// Built once per run (and again on reset). Components borrow what they
/// need from it; nothing lives in globals.
#[derive(Debug, Clone)]
pub struct SimulationContext {
    pub state: StateStore,
    pub rng: RandomStream,
    pub scheduler: EventScheduler,
    pub now: Duration,
}

impl SimulationContext {
    /// Fresh context at logical time zero.
    pub fn new(scenario: &Scenario, seed: u64) -> Result<Self, ScenarioError> {
        Ok(Self {
            state: StateStore::from_scenario(scenario)?,
            rng: RandomStream::new(seed),
            scheduler: EventScheduler::new(),
            now: Duration::ZERO,
        })
    }
}
