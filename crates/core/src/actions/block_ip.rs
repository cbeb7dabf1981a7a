//! Perimeter blocklisting.

use super::{success_probability, ActionContext, ActionError, ActionProfile, Effects, Resolve, StateChange, Unmet};
use redblue_state::StateStore;
use redblue_types::Team;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

pub(super) static PROFILE: ActionProfile = ActionProfile {
    id: "BlockIpAddress",
    name: "Block IP Address",
    team: Team::Blue,
    time_cost: Duration::from_secs(1),
    action_point_cost: 2,
    base_probability: 0.95,
    requires_target: false,
    requires_operational: false,
    prerequisites: &["an address to block"],
    effects: &["success: address is on the blocklist", "failure: nothing"],
};

/// Add `ip` to the global blocklist (MITRE D3FEND D3-IPBA).
///
/// Needs no target node. Blocking an address twice is harmless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockIpAddress {
    pub ip: String,
}

impl Resolve for BlockIpAddress {
    fn profile(&self) -> &'static ActionProfile {
        &PROFILE
    }

    fn check_specific(&self, _ctx: &ActionContext<'_>, _state: &StateStore) -> Result<(), Unmet> {
        if self.ip.trim().is_empty() {
            return Err(Unmet("no address to block".to_string()));
        }
        Ok(())
    }

    fn success_probability(&self, _ctx: &ActionContext<'_>, _state: &StateStore) -> f64 {
        success_probability(PROFILE.base_probability, None, None)
    }

    fn apply_success(
        &self,
        ctx: &ActionContext<'_>,
        state: &mut StateStore,
        effects: &mut Effects,
    ) -> Result<(), ActionError> {
        if state.block_ip(self.ip.clone()) {
            effects.change(StateChange::IpBlocked {
                ip: self.ip.clone(),
            });
            effects.log(
                format!("[{}] IP {} has been blocked", ctx.actor, self.ip),
                json!({ "ip": self.ip }),
            );
        } else {
            effects.log(
                format!("[{}] IP {} was already blocked", ctx.actor, self.ip),
                json!({ "ip": self.ip, "already_blocked": true }),
            );
        }
        Ok(())
    }

    fn apply_failure(
        &self,
        ctx: &ActionContext<'_>,
        _state: &mut StateStore,
        effects: &mut Effects,
    ) -> Result<(), ActionError> {
        effects.log(
            format!("[{}] could not block IP {}", ctx.actor, self.ip),
            json!({ "ip": self.ip }),
        );
        Ok(())
    }
}
