//! Error types for state mutation and scenario loading.

use redblue_types::{ActorId, NodeId, TransitionError, VulnerabilityId};
use thiserror::Error;

/// Errors from individual state store operations.
///
/// At runtime these are lookup misses or rejected transitions: the caller
/// logs them and carries on.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("actor not found: {0}")]
    ActorNotFound(ActorId),

    #[error("edge not found: {from} -> {to}")]
    EdgeNotFound { from: NodeId, to: NodeId },

    #[error("edge {from} -> {to} references missing node {missing}")]
    DanglingReference {
        from: NodeId,
        to: NodeId,
        missing: NodeId,
    },

    #[error("node already exists: {0}")]
    DuplicateNode(NodeId),

    #[error("actor already exists: {0}")]
    DuplicateActor(ActorId),

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    #[error("global flag {key} could not be serialized: {cause}")]
    FlagSerialization {
        key: String,
        cause: serde_json::Error,
    },
}

/// Fatal configuration errors. A scenario that fails validation is
/// rejected as a whole; nothing is partially loaded.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("node registered without an id")]
    MissingNodeId,

    #[error("actor registered without an id")]
    MissingActorId,

    #[error("duplicate node id: {0}")]
    DuplicateNode(NodeId),

    #[error("duplicate actor id: {0}")]
    DuplicateActor(ActorId),

    #[error("edge {from} -> {to} references missing node {missing}")]
    DanglingEdge {
        from: NodeId,
        to: NodeId,
        missing: NodeId,
    },

    #[error("node {node} references unknown vulnerability {vulnerability}")]
    UnknownVulnerability {
        node: NodeId,
        vulnerability: VulnerabilityId,
    },

    #[error("actor {actor} starts with knowledge of unknown node {node}")]
    UnknownKnowledgeNode { actor: ActorId, node: NodeId },

    #[error("node {0} has a compromise status inconsistent with its compromising actor")]
    InconsistentNodeStatus(NodeId),

    #[error(transparent)]
    State(#[from] StateError),
}
