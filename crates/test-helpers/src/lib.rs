//! Test helpers for the red/blue simulation.
//!
//! Small, fully-specified scenarios so tests in every crate agree on the
//! numbers they assert against.
//!
//! ```rust
//! use redblue_test_helpers::{fixtures, ids};
//!
//! let state = fixtures::load(&fixtures::network_scenario());
//! assert!(state.actor_knows(&ids::red(), &ids::internet()));
//! ```

pub mod fixtures;

/// Identifiers used by the fixtures.
pub mod ids {
    use redblue_types::{ActorId, NodeId, VulnerabilityId};

    pub const RED: &str = "RedTeam_Alpha";
    pub const BLUE: &str = "BlueTeam_Delta";
    pub const INTERNET: &str = "Internet";
    pub const WEB: &str = "Web_Server_01";
    pub const DB: &str = "DB_Server_01";
    pub const BLUE_WS: &str = "BlueTeam_Workstation_01";
    pub const SQLI: &str = "SQLi_WebApp_Login_001";
    pub const SSH_WEAK: &str = "Misconf_SSH_WeakCreds_003";

    pub fn red() -> ActorId {
        ActorId::from(RED)
    }

    pub fn blue() -> ActorId {
        ActorId::from(BLUE)
    }

    pub fn internet() -> NodeId {
        NodeId::from(INTERNET)
    }

    pub fn web() -> NodeId {
        NodeId::from(WEB)
    }

    pub fn db() -> NodeId {
        NodeId::from(DB)
    }

    pub fn blue_ws() -> NodeId {
        NodeId::from(BLUE_WS)
    }

    pub fn sqli() -> VulnerabilityId {
        VulnerabilityId::from(SQLI)
    }
}
