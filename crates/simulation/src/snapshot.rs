//! Point-in-time view of a run.

use crate::SimulationStats;
use redblue_state::StateStore;
use serde::{Serialize, Serializer};
use std::time::Duration;

/// Consistent copy of the state at one logical instant.
///
/// Cheap to take: the state store shares structure with the live one.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    #[serde(serialize_with = "serialize_secs")]
    pub time: Duration,
    pub pending_events: usize,
    pub stats: SimulationStats,
    pub state: StateStore,
}

fn serialize_secs<S: Serializer>(time: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(time.as_secs_f64())
}
