//! Built-in scenarios.

use redblue_core::{Action, Intent};
use redblue_state::Scenario;
use redblue_types::{Actor, Category, Edge, Node, NodeId, Severity, Team, Vulnerability};
use std::time::Duration;

/// Name of the minimal internet -> web -> database scenario.
pub const MVP: &str = "mvp";

pub const INTERNET: &str = "Internet";
pub const WEB_SERVER: &str = "Web_Server_01";
pub const DB_SERVER: &str = "DB_Server_01";
pub const BLUE_WORKSTATION: &str = "BlueTeam_Workstation_01";
pub const RED_ACTOR: &str = "RedTeam_Alpha";
pub const BLUE_ACTOR: &str = "BlueTeam_Delta";

pub const SQL_INJECTION: &str = "SQLi_WebApp_Login_001";
pub const WEB_SERVER_RCE: &str = "CVE-2023-0002_WebServer_RCE";
pub const SSH_WEAK_CREDENTIALS: &str = "Misconf_SSH_WeakCreds_003";
pub const DIRECTORY_LISTING: &str = "InfoLeak_WebServer_DirectoryListing_004";

/// Address the scripted blue response blocks.
pub const ATTACKER_IP: &str = "5.6.7.8";

/// Names accepted by [`by_name`].
pub fn names() -> &'static [&'static str] {
    &[MVP]
}

pub fn by_name(name: &str) -> Option<Scenario> {
    match name {
        MVP => Some(mvp()),
        _ => None,
    }
}

fn vulnerabilities() -> [Vulnerability; 4] {
    [
        Vulnerability::new(
            SQL_INJECTION,
            "SQL Injection in WebApp Login",
            Severity::Critical,
            Category::DataManipulation,
        )
        .with_cvss(9.8)
        .with_patch_difficulty(7)
        .with_exploit_difficulty(4),
        Vulnerability::new(
            WEB_SERVER_RCE,
            "Remote Code Execution in WebServer Service",
            Severity::Critical,
            Category::CodeExecution,
        )
        .with_cvss(10.0)
        .with_patch_difficulty(5)
        .with_exploit_difficulty(3),
        Vulnerability::new(
            SSH_WEAK_CREDENTIALS,
            "SSH Weak Credentials",
            Severity::High,
            Category::AccessControlBypass,
        )
        .with_cvss(7.5)
        .with_patch_difficulty(3)
        .with_exploit_difficulty(2),
        Vulnerability::new(
            DIRECTORY_LISTING,
            "Directory Listing Enabled on Web Server",
            Severity::Medium,
            Category::InformationDisclosure,
        )
        .with_cvss(5.3)
        .with_patch_difficulty(2)
        .with_exploit_difficulty(1),
    ]
}

/// Internet-facing web server in front of a database, watched over by a
/// blue-team workstation.
pub fn mvp() -> Scenario {
    let mut red = Actor::new(RED_ACTOR, Team::Red)
        .with_action_points(10)
        .with_skill_level(6);
    red.knowledge.insert(NodeId::from(INTERNET));

    let mut blue = Actor::new(BLUE_ACTOR, Team::Blue)
        .with_action_points(10)
        .with_skill_level(7);
    for node in [WEB_SERVER, DB_SERVER, BLUE_WORKSTATION] {
        blue.knowledge.insert(NodeId::from(node));
    }

    let mut scenario = Scenario::new(MVP);
    for vuln in vulnerabilities() {
        scenario = scenario.with_vulnerability(vuln);
    }

    scenario
        .with_node(
            Node::new(INTERNET, "external_source", "0.0.0.0/0")
                .with_security_posture(0.0)
                .with_metadata("description", "Public internet, origin of external actors"),
        )
        .with_node(
            Node::new(WEB_SERVER, "web_server", "172.16.0.10")
                .with_vulnerability(SQL_INJECTION)
                .with_vulnerability(DIRECTORY_LISTING)
                .with_service("HTTP:80")
                .with_service("HTTPS:443")
                .with_security_posture(4.0)
                .with_data_value(10)
                .with_metadata("os", "Linux Ubuntu 20.04"),
        )
        .with_node(
            Node::new(DB_SERVER, "database_server", "10.10.1.5")
                .with_service("MySQL:3306")
                .with_security_posture(6.0)
                .with_data_value(80)
                .with_metadata("os", "Linux CentOS 8"),
        )
        .with_node(
            Node::new(BLUE_WORKSTATION, "analyst_workstation", "192.168.1.100")
                .with_service("SSH:22")
                .with_service("RDP:3389")
                .with_security_posture(7.0)
                .with_metadata("os", "Windows 10 Pro"),
        )
        .with_edge(Edge::new(INTERNET, WEB_SERVER, "HTTP/HTTPS"))
        .with_edge(
            Edge::new(WEB_SERVER, DB_SERVER, "MySQL")
                .with_port(3306)
                .with_detection_difficulty(7),
        )
        .with_edge(Edge::new(BLUE_WORKSTATION, WEB_SERVER, "SSH/Management").blue_only())
        .with_edge(Edge::new(BLUE_WORKSTATION, DB_SERVER, "SSH/Management").blue_only())
        .with_edge(Edge::new(BLUE_WORKSTATION, INTERNET, "HTTPS").with_port(443))
        .with_actor(red)
        .with_actor(blue)
}

/// Scripted exchange: red breaks in and looks around, blue blocks and
/// isolates.
pub fn demo_intents() -> Vec<Intent> {
    vec![
        Intent::perform(Duration::from_secs(1), RED_ACTOR, Action::exploit(SQL_INJECTION))
            .targeting(WEB_SERVER)
            .from_node(INTERNET),
        Intent::perform(Duration::from_secs(4), RED_ACTOR, Action::scan())
            .targeting(DB_SERVER)
            .from_node(WEB_SERVER),
        Intent::perform(Duration::from_secs(5), BLUE_ACTOR, Action::block_ip(ATTACKER_IP)),
        Intent::perform(Duration::from_secs(8), BLUE_ACTOR, Action::isolate()).targeting(WEB_SERVER),
    ]
}
