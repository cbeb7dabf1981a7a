//! Simulation actors (red/blue agents).

use crate::{ActorId, NodeId, Team};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Action points granted per replenishment cycle unless configured.
pub const DEFAULT_ACTION_POINTS_PER_CYCLE: u32 = 10;

/// An agent taking part in the simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub team: Team,
    /// Current action-point balance.
    pub action_points: u32,
    /// Balance restored at every replenishment cycle.
    pub action_points_per_cycle: u32,
    /// Nodes this actor is aware of. Only grows.
    pub knowledge: BTreeSet<NodeId>,
    pub skill_level: u8,
}

impl Actor {
    /// Create an actor with a full default balance and no knowledge.
    pub fn new(id: impl Into<ActorId>, team: Team) -> Self {
        Self {
            id: id.into(),
            team,
            action_points: DEFAULT_ACTION_POINTS_PER_CYCLE,
            action_points_per_cycle: DEFAULT_ACTION_POINTS_PER_CYCLE,
            knowledge: BTreeSet::new(),
            skill_level: 5,
        }
    }

    /// Set the per-cycle allotment and start with a full balance.
    pub fn with_action_points(mut self, per_cycle: u32) -> Self {
        self.action_points = per_cycle;
        self.action_points_per_cycle = per_cycle;
        self
    }

    pub fn with_skill_level(mut self, level: u8) -> Self {
        self.skill_level = level;
        self
    }

    pub fn knows(&self, node: &NodeId) -> bool {
        self.knowledge.contains(node)
    }
}
