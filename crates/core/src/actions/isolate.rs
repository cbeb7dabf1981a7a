//! Network containment of a host.

use super::{success_probability, ActionContext, ActionError, ActionProfile, Effects, Resolve, StateChange, Unmet};
use redblue_state::{NodeUpdate, StateError, StateStore};
use redblue_types::{NodeStatus, Team};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

pub(super) static PROFILE: ActionProfile = ActionProfile {
    id: "IsolateHost",
    name: "Isolate Host",
    team: Team::Blue,
    time_cost: Duration::from_secs(2),
    action_point_cost: 4,
    base_probability: 0.9,
    requires_target: true,
    requires_operational: false,
    prerequisites: &["target is not already isolated"],
    effects: &[
        "success: target becomes isolated, loses its compromising actor, red can no longer traverse its edges",
        "failure: nothing",
    ],
};

/// Cut the target off from the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IsolateHost;

impl Resolve for IsolateHost {
    fn profile(&self) -> &'static ActionProfile {
        &PROFILE
    }

    fn check_specific(&self, ctx: &ActionContext<'_>, state: &StateStore) -> Result<(), Unmet> {
        match ctx.target.and_then(|t| state.get_node(t)) {
            Some(node) if node.status() == NodeStatus::Isolated => {
                Err(Unmet(format!("{} is already isolated", node.id)))
            }
            _ => Ok(()),
        }
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
        let target = ctx.require_target(PROFILE.id)?;
        let from = state
            .get_node(target)
            .map(|n| n.status())
            .ok_or_else(|| StateError::NodeNotFound(target.clone()))?;

        state.update_node(target, NodeUpdate::Isolate)?;
        effects.change(StateChange::NodeStatus {
            node: target.clone(),
            from,
            to: NodeStatus::Isolated,
        });

        let closed = state.set_incident_traversal(target, Team::Red, false);
        if closed > 0 {
            effects.change(StateChange::EdgesClosed {
                node: target.clone(),
                team: Team::Red,
                count: closed,
            });
        }

        effects.log(
            format!("[{}] isolated {} ({} edges closed to red)", ctx.actor, target, closed),
            json!({ "target": target, "previous_status": from, "edges_closed": closed }),
        );
        Ok(())
    }

    fn apply_failure(
        &self,
        ctx: &ActionContext<'_>,
        _state: &mut StateStore,
        effects: &mut Effects,
    ) -> Result<(), ActionError> {
        let target = ctx.require_target(PROFILE.id)?;
        effects.log(
            format!("[{}] isolation of {} failed", ctx.actor, target),
            json!({ "target": target }),
        );
        Ok(())
    }
}
