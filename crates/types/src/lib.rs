//! Core types for the red/blue network simulation.
//!
//! These are plain data: the network graph ([`Node`], [`Edge`]), static
//! reference data ([`Vulnerability`], [`VulnerabilityRegistry`]) and the
//! agents acting on the graph ([`Actor`]). All mutation goes through the
//! state store in `redblue-state`.

mod actor;
mod edge;
mod identifiers;
mod node;
mod vulnerability;

pub use actor::{Actor, DEFAULT_ACTION_POINTS_PER_CYCLE};
pub use edge::{Edge, DEFAULT_DETECTION_DIFFICULTY};
pub use identifiers::{ActorId, NodeId, Team, VulnerabilityId};
pub use node::{
    Node, NodeStatus, TransitionError, DEFAULT_SECURITY_POSTURE, EXTERNAL_SOURCE_TYPE,
    MAX_SECURITY_POSTURE,
};
pub use vulnerability::{Category, Severity, Vulnerability, VulnerabilityRegistry, MIDPOINT_DIFFICULTY};
