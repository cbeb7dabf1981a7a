//! Directed links between nodes.

use crate::{NodeId, Team};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Detection difficulty of an average link.
pub const DEFAULT_DETECTION_DIFFICULTY: u8 = 5;

/// Directed connection `source -> target`.
///
/// Bidirectional links are two edges. Both endpoints must exist in the
/// state store before the edge is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    /// Protocol descriptor, e.g. `HTTP/HTTPS` or `MySQL`.
    pub protocol: String,
    pub port: Option<u16>,
    pub red_traversable: bool,
    pub blue_traversable: bool,
    /// How hard malicious traffic on this link is to spot (1-10).
    pub detection_difficulty: u8,
}

impl Edge {
    /// Create an edge traversable by both teams.
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>, protocol: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            protocol: protocol.into(),
            port: None,
            red_traversable: true,
            blue_traversable: true,
            detection_difficulty: DEFAULT_DETECTION_DIFFICULTY,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Blue-only management path.
    pub fn blue_only(mut self) -> Self {
        self.red_traversable = false;
        self
    }

    pub fn with_detection_difficulty(mut self, difficulty: u8) -> Self {
        self.detection_difficulty = difficulty.clamp(1, 10);
        self
    }

    /// Whether members of `team` may use this edge.
    ///
    /// Neutral actors may use any edge either team may use.
    pub fn traversable_by(&self, team: Team) -> bool {
        match team {
            Team::Red => self.red_traversable,
            Team::Blue => self.blue_traversable,
            Team::Neutral => self.red_traversable || self.blue_traversable,
        }
    }

    /// Set the traversal flag for `team`. Neutral sets both.
    pub fn set_traversable(&mut self, team: Team, allowed: bool) {
        match team {
            Team::Red => self.red_traversable = allowed,
            Team::Blue => self.blue_traversable = allowed,
            Team::Neutral => {
                self.red_traversable = allowed;
                self.blue_traversable = allowed;
            }
        }
    }

    /// True if the edge touches `node` at either end.
    pub fn touches(&self, node: &NodeId) -> bool {
        &self.source == node || &self.target == node
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.source, self.target, self.protocol)
    }
}
