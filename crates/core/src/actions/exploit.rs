//! Initial access through a vulnerable internet-facing service.

use super::{success_probability, ActionContext, ActionError, ActionProfile, Effects, Resolve, StateChange, Unmet};
use crate::Intent;
use redblue_state::{NodeUpdate, StateError, StateStore};
use redblue_types::{NodeStatus, Team, VulnerabilityId};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

pub(super) static PROFILE: ActionProfile = ActionProfile {
    id: "ExploitPublicFacingApplication",
    name: "Exploit Public-Facing Application",
    team: Team::Red,
    time_cost: Duration::from_secs(3),
    action_point_cost: 3,
    base_probability: 0.7,
    requires_target: true,
    requires_operational: true,
    prerequisites: &[
        "target is operational",
        "target carries the vulnerability",
        "red-traversable edge from the source, if one is given",
        "source address is not blocked",
    ],
    effects: &[
        "success: target becomes compromised_covert, actor learns the target, actor gets a planning turn",
        "failure: nothing",
    ],
};

/// Exploit `vulnerability` on the target (MITRE T1190).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploitPublicFacingApplication {
    pub vulnerability: VulnerabilityId,
}

impl Resolve for ExploitPublicFacingApplication {
    fn profile(&self) -> &'static ActionProfile {
        &PROFILE
    }

    fn required_vulnerability(&self) -> Option<&VulnerabilityId> {
        Some(&self.vulnerability)
    }

    fn check_specific(&self, ctx: &ActionContext<'_>, state: &StateStore) -> Result<(), Unmet> {
        match ctx.target.and_then(|t| state.get_node(t)) {
            Some(node) if node.is_external_source() => {
                Err(Unmet(format!("{} is an external source", node.id)))
            }
            _ => Ok(()),
        }
    }

    fn success_probability(&self, ctx: &ActionContext<'_>, state: &StateStore) -> f64 {
        let difficulty = state
            .vulnerability(&self.vulnerability)
            .map(|v| v.exploit_difficulty);
        let posture = ctx
            .target
            .and_then(|t| state.get_node(t))
            .map(|n| n.security_posture());
        success_probability(PROFILE.base_probability, difficulty, posture)
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

        state.update_node(
            target,
            NodeUpdate::Compromise {
                by: ctx.actor.clone(),
            },
        )?;
        effects.change(StateChange::NodeStatus {
            node: target.clone(),
            from,
            to: NodeStatus::CompromisedCovert,
        });

        if state.grant_knowledge(ctx.actor, target)? {
            effects.change(StateChange::KnowledgeGranted {
                actor: ctx.actor.clone(),
                node: target.clone(),
            });
        }

        effects.schedule(Intent::decide(ctx.now.saturating_add(PROFILE.time_cost), ctx.actor.clone()));
        effects.log(
            format!(
                "[{}] gained covert access to {} via {}",
                ctx.actor, target, self.vulnerability
            ),
            json!({ "target": target, "vulnerability": self.vulnerability }),
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
            format!(
                "[{}] exploit of {} on {} did not land",
                ctx.actor, self.vulnerability, target
            ),
            json!({ "target": target, "vulnerability": self.vulnerability }),
        );
        Ok(())
    }
}
