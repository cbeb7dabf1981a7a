//! Deterministic simulation runner.
//!
//! This crate drives a red/blue network scenario through logical time.
//! Given the same seed, scenario and scheduled intents, it produces
//! identical results every run.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  SimulationRunner                       │
//! │                                                         │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     Event Queue (BTreeMap<EventKey, Intent>)       │ │
//! │  │     Ordered by: time, priority, sequence           │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     resolve(action) against StateStore + RNG       │ │
//! │  │     Decide → Planner, Replenish → all actors       │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     Follow-up intents → queue, records → history   │ │
//! │  └────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod context;
mod event_queue;
mod planner;
mod runner;
mod snapshot;

pub use context::SimulationContext;
pub use event_queue::{EventKey, EventScheduler};
pub use planner::{IdlePlanner, Planner};
pub use runner::{RunnerConfig, SimulationRunner, SimulationStats, DEFAULT_MAX_EVENTS_PER_ADVANCE};
pub use snapshot::Snapshot;
