//! Remediation of a known vulnerability.

use super::{success_probability, ActionContext, ActionError, ActionProfile, Effects, Resolve, StateChange};
use redblue_state::{NodeUpdate, StateStore};
use redblue_types::{Team, VulnerabilityId};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

pub(super) static PROFILE: ActionProfile = ActionProfile {
    id: "PatchVulnerability",
    name: "Patch Vulnerability",
    team: Team::Blue,
    time_cost: Duration::from_secs(4),
    action_point_cost: 3,
    base_probability: 0.85,
    requires_target: true,
    requires_operational: false,
    prerequisites: &["target carries the vulnerability"],
    effects: &["success: vulnerability removed from the target", "failure: nothing"],
};

/// Remove `vulnerability` from the target.
///
/// Odds depend on the vulnerability's patch difficulty, not on posture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchVulnerability {
    pub vulnerability: VulnerabilityId,
}

impl Resolve for PatchVulnerability {
    fn profile(&self) -> &'static ActionProfile {
        &PROFILE
    }

    fn required_vulnerability(&self) -> Option<&VulnerabilityId> {
        Some(&self.vulnerability)
    }

    fn success_probability(&self, _ctx: &ActionContext<'_>, state: &StateStore) -> f64 {
        let difficulty = state
            .vulnerability(&self.vulnerability)
            .map(|v| v.patch_difficulty);
        success_probability(PROFILE.base_probability, difficulty, None)
    }

    fn apply_success(
        &self,
        ctx: &ActionContext<'_>,
        state: &mut StateStore,
        effects: &mut Effects,
    ) -> Result<(), ActionError> {
        let target = ctx.require_target(PROFILE.id)?;
        state.update_node(
            target,
            NodeUpdate::RemoveVulnerability(self.vulnerability.clone()),
        )?;
        effects.change(StateChange::VulnerabilityRemoved {
            node: target.clone(),
            vulnerability: self.vulnerability.clone(),
        });
        effects.log(
            format!("[{}] patched {} on {}", ctx.actor, self.vulnerability, target),
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
                "[{}] patch for {} on {} did not apply",
                ctx.actor, self.vulnerability, target
            ),
            json!({ "target": target, "vulnerability": self.vulnerability }),
        );
        Ok(())
    }
}
