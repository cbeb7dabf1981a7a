//! Scheduled units of work.

use crate::{Action, Resolve};
use redblue_types::{ActorId, NodeId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Priority levels for intents at the same timestamp.
///
/// Lower values are processed first. Any `i32` is accepted; these are the
/// levels the engine itself uses.
pub mod priority {
    /// Engine bookkeeping (replenishment) runs before anything else.
    pub const SYSTEM: i32 = -10;
    /// Default for actor actions.
    pub const ACTION: i32 = 0;
    /// Planning turns run after the actions due at the same instant.
    pub const DECISION: i32 = 10;
}

/// What an intent asks the runner to do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IntentKind {
    /// Resolve an action on behalf of the intent's actor.
    PerformAction { action: Action },
    /// Planning turn for the intent's actor.
    Decide,
    /// Restore every actor to its per-cycle action-point allotment.
    ReplenishActionPoints,
}

impl IntentKind {
    pub fn name(&self) -> &'static str {
        match self {
            IntentKind::PerformAction { .. } => "PerformAction",
            IntentKind::Decide => "Decide",
            IntentKind::ReplenishActionPoints => "ReplenishActionPoints",
        }
    }
}

/// A timestamped unit of work. Immutable once scheduled.
///
/// Ordering fields beyond `time` and `priority` (the sequence number) are
/// assigned by the scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// Logical time at which the intent resolves.
    pub time: Duration,
    pub priority: i32,
    pub actor: ActorId,
    pub kind: IntentKind,
    pub target: Option<NodeId>,
    pub source: Option<NodeId>,
    /// Free-form details. `source_ip` overrides the source node's address
    /// for blocklist checks.
    #[serde(default)]
    pub payload: Value,
}

impl Intent {
    fn new(time: Duration, priority: i32, actor: ActorId, kind: IntentKind) -> Self {
        Self {
            time,
            priority,
            actor,
            kind,
            target: None,
            source: None,
            payload: Value::Null,
        }
    }

    /// Perform `action` as `actor` at `time`.
    pub fn perform(time: Duration, actor: impl Into<ActorId>, action: Action) -> Self {
        Self::new(
            time,
            priority::ACTION,
            actor.into(),
            IntentKind::PerformAction { action },
        )
    }

    /// Planning turn for `actor` at `time`.
    pub fn decide(time: Duration, actor: impl Into<ActorId>) -> Self {
        Self::new(time, priority::DECISION, actor.into(), IntentKind::Decide)
    }

    /// Engine-issued replenishment at `time`.
    pub fn replenish(time: Duration) -> Self {
        Self::new(
            time,
            priority::SYSTEM,
            ActorId::system(),
            IntentKind::ReplenishActionPoints,
        )
    }

    pub fn targeting(mut self, node: impl Into<NodeId>) -> Self {
        self.target = Some(node.into());
        self
    }

    pub fn from_node(mut self, node: impl Into<NodeId>) -> Self {
        self.source = Some(node.into());
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    /// The action carried by a `PerformAction` intent.
    pub fn action(&self) -> Option<&Action> {
        match &self.kind {
            IntentKind::PerformAction { action } => Some(action),
            _ => None,
        }
    }

    /// Short human-readable label, e.g. `PerformAction(ScanNode)`.
    pub fn label(&self) -> String {
        match self.action() {
            Some(action) => format!("{}({})", self.kind.name(), action.profile().id),
            None => self.kind.name().to_string(),
        }
    }
}
