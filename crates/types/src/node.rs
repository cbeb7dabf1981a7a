//! Network nodes and their compromise lifecycle.

use crate::{ActorId, NodeId, VulnerabilityId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

/// Security posture of an average node.
pub const DEFAULT_SECURITY_POSTURE: f64 = 5.0;

/// Upper bound of the security posture scale.
pub const MAX_SECURITY_POSTURE: f64 = 10.0;

/// Node type reserved for the public internet / external origins.
pub const EXTERNAL_SOURCE_TYPE: &str = "external_source";

/// Operational status of a node.
///
/// The compromise lifecycle only moves forward:
///
/// ```text
/// Operational ──► CompromisedCovert ──► ConfirmedBreach
///      │                 │                    │
///      └─────────────────┴──────► Isolated ◄──┘
/// ```
///
/// `Isolated` is terminal; nothing in the action set recovers a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Operational,
    CompromisedCovert,
    ConfirmedBreach,
    Isolated,
}

impl NodeStatus {
    /// True for the variants that require a compromising actor.
    pub fn is_compromised(self) -> bool {
        matches!(
            self,
            NodeStatus::CompromisedCovert | NodeStatus::ConfirmedBreach
        )
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: NodeStatus) -> bool {
        use NodeStatus::*;
        match (self, next) {
            (Operational, CompromisedCovert) => true,
            (CompromisedCovert, ConfirmedBreach) => true,
            (Isolated, _) => false,
            (_, Isolated) => true,
            _ => false,
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeStatus::Operational => write!(f, "operational"),
            NodeStatus::CompromisedCovert => write!(f, "compromised_covert"),
            NodeStatus::ConfirmedBreach => write!(f, "confirmed_breach"),
            NodeStatus::Isolated => write!(f, "isolated"),
        }
    }
}

/// Rejected status change.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("node {node}: cannot move from {from} to {to}")]
pub struct TransitionError {
    pub node: NodeId,
    pub from: NodeStatus,
    pub to: NodeStatus,
}

/// A host in the simulated network.
///
/// `status` and `compromising_actor` are private so the invariant
/// "`compromising_actor` is set iff `status.is_compromised()`" holds for
/// every value of this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub node_type: String,
    pub address: String,
    status: NodeStatus,
    pub vulnerabilities: BTreeSet<VulnerabilityId>,
    security_posture: f64,
    pub services: BTreeSet<String>,
    pub known_by: BTreeSet<ActorId>,
    pub data_value: u32,
    compromising_actor: Option<ActorId>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Node {
    /// Create an operational node with average posture and no services.
    pub fn new(id: impl Into<NodeId>, node_type: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            address: address.into(),
            status: NodeStatus::Operational,
            vulnerabilities: BTreeSet::new(),
            security_posture: DEFAULT_SECURITY_POSTURE,
            services: BTreeSet::new(),
            known_by: BTreeSet::new(),
            data_value: 0,
            compromising_actor: None,
            metadata: BTreeMap::new(),
        }
    }

    /// Add a vulnerability reference.
    pub fn with_vulnerability(mut self, vuln: impl Into<VulnerabilityId>) -> Self {
        self.vulnerabilities.insert(vuln.into());
        self
    }

    /// Add a running service (e.g. `HTTP:80`).
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.services.insert(service.into());
        self
    }

    /// Set the security posture (clamped to `[0, 10]`).
    pub fn with_security_posture(mut self, posture: f64) -> Self {
        self.set_security_posture(posture);
        self
    }

    /// Set the data value.
    pub fn with_data_value(mut self, value: u32) -> Self {
        self.data_value = value;
        self
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn status(&self) -> NodeStatus {
        self.status
    }

    pub fn compromising_actor(&self) -> Option<&ActorId> {
        self.compromising_actor.as_ref()
    }

    pub fn security_posture(&self) -> f64 {
        self.security_posture
    }

    pub fn set_security_posture(&mut self, posture: f64) {
        // NaN collapses to the average rather than poisoning probabilities.
        self.security_posture = if posture.is_nan() {
            DEFAULT_SECURITY_POSTURE
        } else {
            posture.clamp(0.0, MAX_SECURITY_POSTURE)
        };
    }

    pub fn is_operational(&self) -> bool {
        self.status == NodeStatus::Operational
    }

    pub fn is_external_source(&self) -> bool {
        self.node_type == EXTERNAL_SOURCE_TYPE
    }

    pub fn has_vulnerability(&self, vuln: &VulnerabilityId) -> bool {
        self.vulnerabilities.contains(vuln)
    }

    /// Initial access: `Operational -> CompromisedCovert`.
    pub fn compromise(&mut self, by: ActorId) -> Result<(), TransitionError> {
        self.transition(NodeStatus::CompromisedCovert)?;
        self.compromising_actor = Some(by);
        Ok(())
    }

    /// Persistence / escalation: `CompromisedCovert -> ConfirmedBreach`.
    ///
    /// The compromising actor is kept.
    pub fn escalate(&mut self) -> Result<(), TransitionError> {
        self.transition(NodeStatus::ConfirmedBreach)
    }

    /// Containment: any non-isolated status `-> Isolated`.
    pub fn isolate(&mut self) -> Result<(), TransitionError> {
        self.transition(NodeStatus::Isolated)?;
        self.compromising_actor = None;
        Ok(())
    }

    fn transition(&mut self, next: NodeStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(next) {
            return Err(TransitionError {
                node: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
