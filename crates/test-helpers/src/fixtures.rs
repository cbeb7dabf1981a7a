//! Scenario fixtures.

use crate::ids::{BLUE, BLUE_WS, DB, INTERNET, RED, SQLI, SSH_WEAK, WEB};
use redblue_state::{Scenario, StateStore};
use redblue_types::{Actor, Category, Edge, Node, NodeId, Severity, Team, Vulnerability};

/// Single node `WebServer` (posture 4) carrying `V1` (exploit difficulty 4).
///
/// An exploit of `V1` with base probability 0.7 resolves at 0.925.
pub fn web_server_scenario() -> Scenario {
    Scenario::new("single-webserver")
        .with_vulnerability(
            Vulnerability::new("V1", "Login form injection", Severity::Critical, Category::DataManipulation)
                .with_exploit_difficulty(4)
                .with_patch_difficulty(5),
        )
        .with_node(
            Node::new("WebServer", "web_server", "172.16.0.10")
                .with_vulnerability("V1")
                .with_security_posture(4.0),
        )
        .with_actor(Actor::new(RED, Team::Red).with_action_points(10))
        .with_actor(Actor::new(BLUE, Team::Blue).with_action_points(10))
}

/// Internet -> web -> database, plus a blue-team workstation.
pub fn network_scenario() -> Scenario {
    let mut red = Actor::new(RED, Team::Red)
        .with_action_points(10)
        .with_skill_level(6);
    red.knowledge.insert(NodeId::from(INTERNET));

    let mut blue = Actor::new(BLUE, Team::Blue)
        .with_action_points(10)
        .with_skill_level(7);
    for node in [WEB, DB, BLUE_WS] {
        blue.knowledge.insert(NodeId::from(node));
    }

    Scenario::new("three-tier")
        .with_vulnerability(
            Vulnerability::new(SQLI, "SQL injection in login form", Severity::Critical, Category::DataManipulation)
                .with_cvss(9.8)
                .with_exploit_difficulty(4)
                .with_patch_difficulty(7),
        )
        .with_vulnerability(
            Vulnerability::new(SSH_WEAK, "Weak SSH credentials", Severity::High, Category::AccessControlBypass)
                .with_cvss(7.5)
                .with_exploit_difficulty(2)
                .with_patch_difficulty(3),
        )
        .with_node(Node::new(INTERNET, "external_source", "0.0.0.0/0").with_security_posture(0.0))
        .with_node(
            Node::new(WEB, "web_server", "172.16.0.10")
                .with_vulnerability(SQLI)
                .with_service("HTTP:80")
                .with_service("HTTPS:443")
                .with_security_posture(4.0)
                .with_data_value(10),
        )
        .with_node(
            Node::new(DB, "database_server", "10.10.1.5")
                .with_vulnerability(SSH_WEAK)
                .with_service("MySQL:3306")
                .with_security_posture(6.0)
                .with_data_value(80),
        )
        .with_node(
            Node::new(BLUE_WS, "workstation", "192.168.1.100")
                .with_service("SSH:22")
                .with_security_posture(7.0),
        )
        .with_edge(Edge::new(INTERNET, WEB, "HTTPS").with_port(443))
        .with_edge(
            Edge::new(WEB, DB, "MySQL")
                .with_port(3306)
                .with_detection_difficulty(7),
        )
        .with_edge(Edge::new(BLUE_WS, WEB, "SSH").with_port(22).blue_only())
        .with_edge(Edge::new(BLUE_WS, DB, "SSH").with_port(22).blue_only())
        .with_actor(red)
        .with_actor(blue)
}

/// Load a fixture scenario. Fixtures are valid by construction.
pub fn load(scenario: &Scenario) -> StateStore {
    StateStore::from_scenario(scenario).expect("fixture scenario is valid")
}
