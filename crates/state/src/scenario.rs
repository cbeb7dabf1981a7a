//! Scenario definitions and validated loading into a [`StateStore`].

use crate::{ScenarioError, StateStore};
use redblue_types::{Actor, Edge, Node, NodeId, Vulnerability, VulnerabilityRegistry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::info;

/// Complete description of a starting world.
///
/// `Actor::knowledge` is the actor's initial knowledge. `Node::known_by` is
/// derived from it on load and any value given here is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub name: String,
    pub vulnerabilities: VulnerabilityRegistry,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub actors: Vec<Actor>,
    pub flags: BTreeMap<String, Value>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_vulnerability(mut self, vuln: Vulnerability) -> Self {
        self.vulnerabilities.register(vuln);
        self
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn with_edge(mut self, edge: Edge) -> Self {
        self.edges.push(edge);
        self
    }

    pub fn with_actor(mut self, actor: Actor) -> Self {
        self.actors.push(actor);
        self
    }

    pub fn with_flag(mut self, key: impl Into<String>, value: Value) -> Self {
        self.flags.insert(key.into(), value);
        self
    }

    /// Check every cross-reference without building anything.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let mut node_ids = BTreeSet::new();
        for node in &self.nodes {
            if node.id.is_empty() {
                return Err(ScenarioError::MissingNodeId);
            }
            if !node_ids.insert(&node.id) {
                return Err(ScenarioError::DuplicateNode(node.id.clone()));
            }
            if node.status().is_compromised() != node.compromising_actor().is_some() {
                return Err(ScenarioError::InconsistentNodeStatus(node.id.clone()));
            }
            if let Some(vuln) = node
                .vulnerabilities
                .iter()
                .find(|v| !self.vulnerabilities.contains(v))
            {
                return Err(ScenarioError::UnknownVulnerability {
                    node: node.id.clone(),
                    vulnerability: vuln.clone(),
                });
            }
        }

        for edge in &self.edges {
            if let Some(missing) = [&edge.source, &edge.target]
                .into_iter()
                .find(|id| !node_ids.contains(id))
            {
                return Err(ScenarioError::DanglingEdge {
                    from: edge.source.clone(),
                    to: edge.target.clone(),
                    missing: missing.clone(),
                });
            }
        }

        let mut actor_ids = BTreeSet::new();
        for actor in &self.actors {
            if actor.id.is_empty() {
                return Err(ScenarioError::MissingActorId);
            }
            if !actor_ids.insert(&actor.id) {
                return Err(ScenarioError::DuplicateActor(actor.id.clone()));
            }
            if let Some(node) = actor.knowledge.iter().find(|n| !node_ids.contains(n)) {
                return Err(ScenarioError::UnknownKnowledgeNode {
                    actor: actor.id.clone(),
                    node: node.clone(),
                });
            }
        }

        Ok(())
    }
}

impl StateStore {
    /// Build a store from a scenario.
    ///
    /// The scenario is validated up front, so loading is all-or-nothing:
    /// on error no store exists at all.
    pub fn from_scenario(scenario: &Scenario) -> Result<Self, ScenarioError> {
        scenario.validate()?;

        let mut store = StateStore::new(Arc::new(scenario.vulnerabilities.clone()));
        for node in &scenario.nodes {
            let mut node = node.clone();
            node.known_by.clear();
            store.add_node(node)?;
        }
        for edge in &scenario.edges {
            store.add_edge(edge.clone())?;
        }
        for actor in &scenario.actors {
            store.register_actor(actor.clone())?;
            for node in &actor.knowledge {
                store.grant_knowledge(&actor.id, node)?;
            }
        }
        for (key, value) in &scenario.flags {
            store.set_global_flag(key.clone(), value)?;
        }

        info!(
            scenario = %scenario.name,
            nodes = store.node_count(),
            edges = store.edge_count(),
            actors = scenario.actors.len(),
            "Scenario loaded"
        );
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redblue_types::{Category, Severity, Team};
    use tracing_test::traced_test;

    fn scenario() -> Scenario {
        Scenario::new("unit")
            .with_vulnerability(Vulnerability::new(
                "SQLi_WebApp_Login_001",
                "SQL injection in login form",
                Severity::Critical,
                Category::DataManipulation,
            ))
            .with_node(Node::new("Internet", "external_source", "0.0.0.0/0"))
            .with_node(
                Node::new("Web_Server_01", "web_server", "172.16.0.10")
                    .with_vulnerability("SQLi_WebApp_Login_001"),
            )
            .with_edge(Edge::new("Internet", "Web_Server_01", "HTTP").with_port(80))
            .with_actor({
                let mut red = Actor::new("RedTeam_Alpha", Team::Red);
                red.knowledge.insert(NodeId::from("Internet"));
                red
            })
            .with_flag("alert_level", Value::from(0))
    }

    #[test]
    fn test_load_derives_known_by_from_knowledge() {
        let store = StateStore::from_scenario(&scenario()).unwrap();
        let internet = store.get_node(&NodeId::from("Internet")).unwrap();
        assert!(internet.known_by.iter().any(|a| a.as_str() == "RedTeam_Alpha"));
        assert!(store
            .get_node(&NodeId::from("Web_Server_01"))
            .unwrap()
            .known_by
            .is_empty());
        assert_eq!(store.global_flag_as::<u32>("alert_level"), Some(0));
        assert_eq!(store.vulnerabilities().len(), 1);
    }

    #[traced_test]
    #[test]
    fn test_load_logs_summary() {
        StateStore::from_scenario(&scenario()).unwrap();
        assert!(logs_contain("Scenario loaded"));
    }

    #[test]
    fn test_rejects_dangling_edge() {
        let bad = scenario().with_edge(Edge::new("Web_Server_01", "DB_Server_01", "MySQL"));
        match StateStore::from_scenario(&bad) {
            Err(ScenarioError::DanglingEdge { missing, .. }) => {
                assert_eq!(missing.as_str(), "DB_Server_01")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_unknown_vulnerability() {
        let bad = scenario()
            .with_node(Node::new("DB_Server_01", "database", "10.10.1.5").with_vulnerability("Nope_999"));
        assert!(matches!(
            bad.validate(),
            Err(ScenarioError::UnknownVulnerability { .. })
        ));
    }

    #[test]
    fn test_rejects_duplicates_and_missing_ids() {
        let dup = scenario().with_node(Node::new("Internet", "external_source", "1.1.1.1"));
        assert!(matches!(dup.validate(), Err(ScenarioError::DuplicateNode(_))));

        let dup_actor = scenario().with_actor(Actor::new("RedTeam_Alpha", Team::Red));
        assert!(matches!(
            dup_actor.validate(),
            Err(ScenarioError::DuplicateActor(_))
        ));

        let unnamed = scenario().with_node(Node::new("", "host", "10.0.0.1"));
        assert!(matches!(unnamed.validate(), Err(ScenarioError::MissingNodeId)));
    }

    #[test]
    fn test_rejects_knowledge_of_unknown_node() {
        let mut blue = Actor::new("BlueTeam_Delta", Team::Blue);
        blue.knowledge.insert(NodeId::from("Ghost"));
        assert!(matches!(
            scenario().with_actor(blue).validate(),
            Err(ScenarioError::UnknownKnowledgeNode { .. })
        ));
    }
}
