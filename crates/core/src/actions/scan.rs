//! Reconnaissance of a single node.

use super::{success_probability, ActionContext, ActionError, ActionProfile, Effects, Resolve, StateChange, Unmet};
use redblue_state::{StateError, StateStore};
use redblue_types::{NodeId, NodeStatus, Team};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

pub(super) static PROFILE: ActionProfile = ActionProfile {
    id: "ScanNode",
    name: "Scan Node",
    team: Team::Red,
    time_cost: Duration::from_secs(5),
    action_point_cost: 2,
    base_probability: 0.8,
    requires_target: true,
    requires_operational: false,
    prerequisites: &["target node exists", "target is not isolated"],
    effects: &[
        "success: actor learns the target and its directly reachable neighbours",
        "failure: nothing, the scan may have been noticed",
    ],
};

/// Enumerate services and vulnerabilities on the target.
///
/// Only the target's security posture affects the odds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanNode;

impl Resolve for ScanNode {
    fn profile(&self) -> &'static ActionProfile {
        &PROFILE
    }

    fn check_specific(&self, ctx: &ActionContext<'_>, state: &StateStore) -> Result<(), Unmet> {
        match ctx.target.and_then(|t| state.get_node(t)) {
            Some(node) if node.status() == NodeStatus::Isolated => {
                Err(Unmet(format!("target {} is isolated", node.id)))
            }
            _ => Ok(()),
        }
    }

    fn success_probability(&self, ctx: &ActionContext<'_>, state: &StateStore) -> f64 {
        let posture = ctx
            .target
            .and_then(|t| state.get_node(t))
            .map(|n| n.security_posture());
        success_probability(PROFILE.base_probability, None, posture)
    }

    fn apply_success(
        &self,
        ctx: &ActionContext<'_>,
        state: &mut StateStore,
        effects: &mut Effects,
    ) -> Result<(), ActionError> {
        let target = ctx.require_target(PROFILE.id)?;
        let node = state
            .get_node(target)
            .cloned()
            .ok_or_else(|| StateError::NodeNotFound(target.clone()))?;
        let team = state.actor(ctx.actor).map_or(PROFILE.team, |a| a.team);

        let neighbours: Vec<NodeId> = state
            .outgoing_edges(target)
            .filter(|edge| edge.traversable_by(team))
            .map(|edge| edge.target.clone())
            .collect();

        let mut discovered = Vec::new();
        for id in std::iter::once(target.clone()).chain(neighbours) {
            if state.grant_knowledge(ctx.actor, &id)? {
                effects.change(StateChange::KnowledgeGranted {
                    actor: ctx.actor.clone(),
                    node: id.clone(),
                });
                discovered.push(id);
            }
        }

        let services: Vec<&String> = node.services.iter().collect();
        let vulnerabilities: Vec<&str> = node.vulnerabilities.iter().map(|v| v.as_str()).collect();
        effects.log(
            format!(
                "[{}] {} discovered services {:?} and vulnerabilities {:?}",
                ctx.actor, target, services, vulnerabilities
            ),
            json!({
                "target": target,
                "services": services,
                "vulnerabilities": vulnerabilities,
                "discovered": discovered,
            }),
        );
        Ok(())
    }

    fn apply_failure(
        &self,
        ctx: &ActionContext<'_>,
        _state: &mut StateStore,
        effects: &mut Effects,
    ) -> Result<(), ActionError> {
        effects.log(
            format!(
                "[{}] scan of {} failed or was detected",
                ctx.actor,
                ctx.require_target(PROFILE.id)?
            ),
            json!({ "target": ctx.target }),
        );
        Ok(())
    }
}
