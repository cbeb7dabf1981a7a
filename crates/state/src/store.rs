//! # State Store
//!
//! Single source of truth for the simulated network.
//!
//! Uses `im` persistent collections so a clone is O(1) via structural
//! sharing. The runner relies on this twice: to publish consistent
//! point-in-time snapshots, and to roll back an action whose effect
//! application faults halfway through.

use crate::StateError;
use im::{OrdMap, OrdSet, Vector};
use redblue_types::{
    Actor, ActorId, Edge, Node, NodeId, Team, Vulnerability, VulnerabilityId,
    VulnerabilityRegistry,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, trace};

/// Typed node attribute update.
///
/// Status changes go through the node's lifecycle methods, so an update
/// that would break the compromise invariant is rejected rather than
/// applied.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeUpdate {
    /// `Operational -> CompromisedCovert`, recording the attacker.
    Compromise { by: ActorId },
    /// `CompromisedCovert -> ConfirmedBreach`.
    Escalate,
    /// Any non-isolated status `-> Isolated`.
    Isolate,
    SecurityPosture(f64),
    AddVulnerability(VulnerabilityId),
    RemoveVulnerability(VulnerabilityId),
    AddService(String),
    RemoveService(String),
    DataValue(u32),
}

/// Network graph, actor accounts and global flags.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StateStore {
    nodes: OrdMap<NodeId, Node>,
    edges: Vector<Edge>,
    actors: OrdMap<ActorId, Actor>,
    blocked_ips: OrdSet<String>,
    flags: OrdMap<String, Value>,
    #[serde(skip)]
    vulnerabilities: Arc<VulnerabilityRegistry>,
}

impl StateStore {
    /// Create an empty store backed by the given vulnerability registry.
    pub fn new(vulnerabilities: Arc<VulnerabilityRegistry>) -> Self {
        Self {
            vulnerabilities,
            ..Default::default()
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Nodes
    // ═══════════════════════════════════════════════════════════════════════

    pub fn get_node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// All nodes, ordered by id.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// First node (in id order) whose address is `address`.
    pub fn node_by_address(&self, address: &str) -> Option<&Node> {
        self.nodes.values().find(|node| node.address == address)
    }

    /// Insert a new node. Fails if the id is taken.
    pub fn add_node(&mut self, node: Node) -> Result<(), StateError> {
        if self.nodes.contains_key(&node.id) {
            return Err(StateError::DuplicateNode(node.id));
        }
        trace!(node = %node.id, "Adding node");
        self.nodes.insert(node.id.clone(), node);
        Ok(())
    }

    /// Apply a typed attribute update to a node.
    ///
    /// Fails with `NodeNotFound` if the node is absent and with
    /// `InvalidTransition` if a status change is not allowed. Either way
    /// the node is left untouched.
    pub fn update_node(&mut self, id: &NodeId, update: NodeUpdate) -> Result<(), StateError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| StateError::NodeNotFound(id.clone()))?;

        trace!(node = %id, ?update, "Updating node");
        match update {
            NodeUpdate::Compromise { by } => node.compromise(by)?,
            NodeUpdate::Escalate => node.escalate()?,
            NodeUpdate::Isolate => node.isolate()?,
            NodeUpdate::SecurityPosture(posture) => node.set_security_posture(posture),
            NodeUpdate::AddVulnerability(vuln) => {
                node.vulnerabilities.insert(vuln);
            }
            NodeUpdate::RemoveVulnerability(vuln) => {
                node.vulnerabilities.remove(&vuln);
            }
            NodeUpdate::AddService(service) => {
                node.services.insert(service);
            }
            NodeUpdate::RemoveService(service) => {
                node.services.remove(&service);
            }
            NodeUpdate::DataValue(value) => node.data_value = value,
        }
        Ok(())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Edges
    // ═══════════════════════════════════════════════════════════════════════

    /// Add a directed edge. Both endpoints must already exist.
    pub fn add_edge(&mut self, edge: Edge) -> Result<(), StateError> {
        for endpoint in [&edge.source, &edge.target] {
            if !self.nodes.contains_key(endpoint) {
                return Err(StateError::DanglingReference {
                    from: edge.source.clone(),
                    to: edge.target.clone(),
                    missing: endpoint.clone(),
                });
            }
        }
        trace!(%edge, "Adding edge");
        self.edges.push_back(edge);
        Ok(())
    }

    /// All edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// First edge `from -> to`, if any.
    pub fn edge(&self, from: &NodeId, to: &NodeId) -> Option<&Edge> {
        self.edges
            .iter()
            .find(|edge| &edge.source == from && &edge.target == to)
    }

    /// Edges leaving `node`.
    pub fn outgoing_edges<'a>(&'a self, node: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |edge| &edge.source == node)
    }

    /// Whether `team` can move directly from `from` to `to`.
    pub fn is_connected(&self, from: &NodeId, to: &NodeId, team: Team) -> bool {
        self.edges.iter().any(|edge| {
            &edge.source == from && &edge.target == to && edge.traversable_by(team)
        })
    }

    /// Set the traversal flag of every edge `from -> to` for `team`.
    pub fn set_edge_traversal(
        &mut self,
        from: &NodeId,
        to: &NodeId,
        team: Team,
        allowed: bool,
    ) -> Result<(), StateError> {
        let mut found = false;
        for edge in self.edges.iter_mut() {
            if &edge.source == from && &edge.target == to {
                edge.set_traversable(team, allowed);
                found = true;
            }
        }
        if found {
            Ok(())
        } else {
            Err(StateError::EdgeNotFound {
                from: from.clone(),
                to: to.clone(),
            })
        }
    }

    /// Set the traversal flag for `team` on every edge touching `node`.
    ///
    /// Returns how many edges changed.
    pub fn set_incident_traversal(&mut self, node: &NodeId, team: Team, allowed: bool) -> usize {
        let mut changed = 0;
        for edge in self.edges.iter_mut() {
            if edge.touches(node) && edge.traversable_by(team) != allowed {
                edge.set_traversable(team, allowed);
                changed += 1;
            }
        }
        changed
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Actors
    // ═══════════════════════════════════════════════════════════════════════

    /// Register an actor with empty knowledge; use
    /// [`grant_knowledge`](Self::grant_knowledge) to seed it.
    pub fn register_actor(&mut self, mut actor: Actor) -> Result<(), StateError> {
        if self.actors.contains_key(&actor.id) {
            return Err(StateError::DuplicateActor(actor.id));
        }
        actor.knowledge.clear();
        self.actors.insert(actor.id.clone(), actor);
        Ok(())
    }

    pub fn actor(&self, id: &ActorId) -> Option<&Actor> {
        self.actors.get(id)
    }

    /// All actors, ordered by id.
    pub fn actors(&self) -> impl Iterator<Item = &Actor> {
        self.actors.values()
    }

    pub fn actor_knows(&self, actor: &ActorId, node: &NodeId) -> bool {
        self.actors
            .get(actor)
            .map(|a| a.knows(node))
            .unwrap_or(false)
    }

    /// Make `actor` aware of `node`.
    ///
    /// Idempotent: returns `Ok(false)` if the actor already knew the node.
    /// Keeps `Actor::knowledge` and `Node::known_by` in step.
    pub fn grant_knowledge(&mut self, actor: &ActorId, node: &NodeId) -> Result<bool, StateError> {
        if !self.nodes.contains_key(node) {
            return Err(StateError::NodeNotFound(node.clone()));
        }
        let entry = self
            .actors
            .get_mut(actor)
            .ok_or_else(|| StateError::ActorNotFound(actor.clone()))?;
        if !entry.knowledge.insert(node.clone()) {
            return Ok(false);
        }
        if let Some(target) = self.nodes.get_mut(node) {
            target.known_by.insert(actor.clone());
        }
        debug!(%actor, %node, "Knowledge granted");
        Ok(true)
    }

    pub fn action_points(&self, actor: &ActorId) -> Option<u32> {
        self.actors.get(actor).map(|a| a.action_points)
    }

    /// Debit `amount` action points.
    ///
    /// Returns `false` and leaves the balance untouched if the actor is
    /// unknown or cannot afford it.
    pub fn spend_action_points(&mut self, actor: &ActorId, amount: u32) -> bool {
        match self.actors.get_mut(actor) {
            Some(entry) if entry.action_points >= amount => {
                entry.action_points -= amount;
                true
            }
            _ => false,
        }
    }

    /// Set an actor's balance to `amount`.
    pub fn reset_action_points(&mut self, actor: &ActorId, amount: u32) -> Result<(), StateError> {
        let entry = self
            .actors
            .get_mut(actor)
            .ok_or_else(|| StateError::ActorNotFound(actor.clone()))?;
        entry.action_points = amount;
        Ok(())
    }

    /// Restore every actor to its per-cycle allotment.
    pub fn replenish_all(&mut self) -> usize {
        let ids: Vec<ActorId> = self.actors.keys().cloned().collect();
        for id in &ids {
            if let Some(actor) = self.actors.get_mut(id) {
                actor.action_points = actor.action_points_per_cycle;
            }
        }
        ids.len()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Global state
    // ═══════════════════════════════════════════════════════════════════════

    pub fn is_blocked(&self, ip: &str) -> bool {
        self.blocked_ips.contains(ip)
    }

    /// Add `ip` to the blocklist. Returns `false` if it was already there.
    pub fn block_ip(&mut self, ip: impl Into<String>) -> bool {
        self.blocked_ips.insert(ip.into()).is_none()
    }

    /// Remove `ip` from the blocklist. Returns `false` if it was absent.
    pub fn unblock_ip(&mut self, ip: &str) -> bool {
        self.blocked_ips.remove(ip).is_some()
    }

    /// Blocked addresses in sorted order.
    pub fn blocked_ips(&self) -> impl Iterator<Item = &String> {
        self.blocked_ips.iter()
    }

    pub fn global_flag(&self, key: &str) -> Option<&Value> {
        self.flags.get(key)
    }

    /// Read a flag back into a concrete type. `None` if absent or of a
    /// different shape.
    pub fn global_flag_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.flags
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Set a flag to any serializable value.
    pub fn set_global_flag<T: Serialize>(&mut self, key: impl Into<String>, value: T) -> Result<(), StateError> {
        let key = key.into();
        let value = serde_json::to_value(value).map_err(|cause| StateError::FlagSerialization {
            key: key.clone(),
            cause,
        })?;
        self.flags.insert(key, value);
        Ok(())
    }

    /// All flags, ordered by key.
    pub fn global_flags(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.flags.iter()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Reference data
    // ═══════════════════════════════════════════════════════════════════════

    pub fn vulnerability(&self, id: &VulnerabilityId) -> Option<&Vulnerability> {
        self.vulnerabilities.get(id)
    }

    pub fn vulnerabilities(&self) -> &VulnerabilityRegistry {
        &self.vulnerabilities
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redblue_types::NodeStatus;

    fn store() -> StateStore {
        let mut store = StateStore::default();
        store
            .add_node(Node::new("Internet", "external_source", "0.0.0.0/0"))
            .unwrap();
        store
            .add_node(Node::new("Web_Server_01", "web_server", "172.16.0.10"))
            .unwrap();
        store
            .register_actor(Actor::new("RedTeam_Alpha", Team::Red).with_action_points(10))
            .unwrap();
        store
    }

    fn red() -> ActorId {
        ActorId::from("RedTeam_Alpha")
    }

    fn web() -> NodeId {
        NodeId::from("Web_Server_01")
    }

    #[test]
    fn test_add_edge_rejects_dangling_reference() {
        let mut store = store();
        let err = store
            .add_edge(Edge::new("Internet", "DB_Server_01", "MySQL"))
            .unwrap_err();
        match err {
            StateError::DanglingReference { missing, .. } => {
                assert_eq!(missing.as_str(), "DB_Server_01")
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(store.edge_count(), 0);
    }

    #[test]
    fn test_update_missing_node_is_not_found() {
        let mut store = store();
        let err = store
            .update_node(&NodeId::from("nope"), NodeUpdate::DataValue(3))
            .unwrap_err();
        assert!(matches!(err, StateError::NodeNotFound(_)));
    }

    #[test]
    fn test_invalid_transition_leaves_node_untouched() {
        let mut store = store();
        store.update_node(&web(), NodeUpdate::Isolate).unwrap();
        let err = store
            .update_node(&web(), NodeUpdate::Compromise { by: red() })
            .unwrap_err();
        assert!(matches!(err, StateError::InvalidTransition(_)));
        let node = store.get_node(&web()).unwrap();
        assert_eq!(node.status(), NodeStatus::Isolated);
        assert!(node.compromising_actor().is_none());
    }

    #[test]
    fn test_spend_action_points_is_all_or_nothing() {
        let mut store = store();
        assert!(store.spend_action_points(&red(), 4));
        assert_eq!(store.action_points(&red()), Some(6));

        assert!(!store.spend_action_points(&red(), 7));
        assert_eq!(store.action_points(&red()), Some(6));

        assert!(store.spend_action_points(&red(), 6));
        assert_eq!(store.action_points(&red()), Some(0));

        assert!(!store.spend_action_points(&ActorId::from("ghost"), 0));
    }

    #[test]
    fn test_reset_and_replenish_action_points() {
        let mut store = store();
        store.spend_action_points(&red(), 9);
        store.reset_action_points(&red(), 3).unwrap();
        assert_eq!(store.action_points(&red()), Some(3));
        assert_eq!(store.replenish_all(), 1);
        assert_eq!(store.action_points(&red()), Some(10));
        assert!(store
            .reset_action_points(&ActorId::from("ghost"), 1)
            .is_err());
    }

    #[test]
    fn test_grant_knowledge_is_idempotent() {
        let mut store = store();
        assert!(store.grant_knowledge(&red(), &web()).unwrap());
        let once = store.clone();
        assert!(!store.grant_knowledge(&red(), &web()).unwrap());

        assert!(store.actor_knows(&red(), &web()));
        assert_eq!(store.actor(&red()), once.actor(&red()));
        assert_eq!(store.get_node(&web()), once.get_node(&web()));
        assert!(store.get_node(&web()).unwrap().known_by.contains(&red()));
    }

    #[test]
    fn test_block_ip_is_idempotent() {
        let mut store = store();
        assert!(store.block_ip("5.6.7.8"));
        assert!(!store.block_ip("5.6.7.8"));
        assert_eq!(store.blocked_ips().count(), 1);
        assert!(store.is_blocked("5.6.7.8"));
        assert!(store.unblock_ip("5.6.7.8"));
        assert!(!store.unblock_ip("5.6.7.8"));
    }

    #[test]
    fn test_global_flags_round_trip_typed_values() {
        let mut store = store();
        store.set_global_flag("alert_level", 3u8).unwrap();
        store
            .set_global_flag("scenario", vec!["mvp", "basic"])
            .unwrap();
        assert_eq!(store.global_flag_as::<u8>("alert_level"), Some(3));
        assert_eq!(
            store.global_flag_as::<Vec<String>>("scenario").unwrap(),
            vec!["mvp", "basic"]
        );
        assert!(store.global_flag("missing").is_none());
    }

    #[test]
    fn test_clone_is_isolated_snapshot() {
        let mut store = store();
        let snapshot = store.clone();
        store.block_ip("1.2.3.4");
        store
            .update_node(&web(), NodeUpdate::Compromise { by: red() })
            .unwrap();
        assert!(!snapshot.is_blocked("1.2.3.4"));
        assert!(snapshot.get_node(&web()).unwrap().is_operational());
    }

    #[test]
    fn test_incident_traversal() {
        let mut store = store();
        store
            .add_edge(Edge::new("Internet", "Web_Server_01", "HTTP"))
            .unwrap();
        assert!(store.is_connected(&NodeId::from("Internet"), &web(), Team::Red));
        assert_eq!(store.set_incident_traversal(&web(), Team::Red, false), 1);
        assert_eq!(store.set_incident_traversal(&web(), Team::Red, false), 0);
        assert!(!store.is_connected(&NodeId::from("Internet"), &web(), Team::Red));
        assert!(store.is_connected(&NodeId::from("Internet"), &web(), Team::Blue));
    }
}
