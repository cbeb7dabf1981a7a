//! The closed action set and its resolution protocol.
//!
//! Each variant of [`Action`] wraps a small struct holding only its own
//! immutable configuration and implementing [`Resolve`]. Resolution is the
//! same for every variant and lives in [`resolve`]:
//!
//! ```text
//! check_prerequisites ──fail──► 1 log line, no mutation, no draw
//!        │ ok
//!        ▼
//! debit action points ──► success_probability ──► draw once
//!                                                    │
//!                          draw < p ─────────────────┼──── otherwise
//!                              ▼                            ▼
//!                        apply_success                apply_failure
//! ```

mod block_ip;
mod exploit;
mod isolate;
mod patch;
mod scan;

pub use block_ip::BlockIpAddress;
pub use exploit::ExploitPublicFacingApplication;
pub use isolate::IsolateHost;
pub use patch::PatchVulnerability;
pub use scan::ScanNode;

use crate::{Intent, LogCategory, LogRecord};
use redblue_state::{RandomStream, StateError, StateStore};
use redblue_types::{ActorId, NodeId, NodeStatus, Team, VulnerabilityId, MIDPOINT_DIFFICULTY};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Largest shift the difficulty term can apply to a probability.
const MAX_DIFFICULTY_MODIFIER: f64 = 0.5;

/// Largest shift the security-posture term can apply to a probability.
const MAX_POSTURE_MODIFIER: f64 = 0.25;

/// Static description of an action type.
///
/// `prerequisites` and `effects` describe the behavior for humans and
/// tooling. They are not evaluated; the checks live in code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionProfile {
    pub id: &'static str,
    pub name: &'static str,
    pub team: Team,
    pub time_cost: Duration,
    pub action_point_cost: u32,
    pub base_probability: f64,
    pub requires_target: bool,
    pub requires_operational: bool,
    pub prerequisites: &'static [&'static str],
    pub effects: &'static [&'static str],
}

/// Everything an action may read about the intent being resolved.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    pub now: Duration,
    pub actor: &'a ActorId,
    pub target: Option<&'a NodeId>,
    pub source: Option<&'a NodeId>,
    pub payload: &'a Value,
}

impl<'a> ActionContext<'a> {
    pub fn from_intent(now: Duration, intent: &'a Intent) -> Self {
        Self {
            now,
            actor: &intent.actor,
            target: intent.target.as_ref(),
            source: intent.source.as_ref(),
            payload: &intent.payload,
        }
    }

    /// The target, or an error for actions that cannot run without one.
    ///
    /// Only reachable after prerequisites passed, so a miss here is a fault.
    pub fn require_target(&self, action: &'static str) -> Result<&'a NodeId, ActionError> {
        self.target.ok_or(ActionError::MissingTarget(action))
    }

    fn target_label(&self) -> String {
        self.target
            .map(|t| t.to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

/// Why an action's prerequisites were not met.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unmet(pub String);

impl fmt::Display for Unmet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Faults during effect application.
///
/// Prerequisite failures are not errors; these are. The runner rolls the
/// state back and logs `ACTION_ERROR` when one escapes [`resolve`].
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    State(#[from] StateError),

    #[error("actor {actor} could not pay {cost} action points after prerequisites passed")]
    ActionPoints { actor: ActorId, cost: u32 },

    #[error("{0} requires a target node")]
    MissingTarget(&'static str),
}

/// Result of resolving one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure,
    PrerequisitesUnmet,
}

/// A state mutation applied during resolution, kept for the log.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StateChange {
    ActionPointsSpent {
        actor: ActorId,
        amount: u32,
        remaining: u32,
    },
    NodeStatus {
        node: NodeId,
        from: NodeStatus,
        to: NodeStatus,
    },
    KnowledgeGranted {
        actor: ActorId,
        node: NodeId,
    },
    IpBlocked {
        ip: String,
    },
    VulnerabilityRemoved {
        node: NodeId,
        vulnerability: VulnerabilityId,
    },
    EdgesClosed {
        node: NodeId,
        team: Team,
        count: usize,
    },
    ActionPointsReplenished {
        actors: usize,
    },
}

impl StateChange {
    pub fn kind(&self) -> &'static str {
        match self {
            StateChange::ActionPointsSpent { .. } => "action_points_spent",
            StateChange::NodeStatus { .. } => "node_status",
            StateChange::KnowledgeGranted { .. } => "knowledge_granted",
            StateChange::IpBlocked { .. } => "ip_blocked",
            StateChange::VulnerabilityRemoved { .. } => "vulnerability_removed",
            StateChange::EdgesClosed { .. } => "edges_closed",
            StateChange::ActionPointsReplenished { .. } => "action_points_replenished",
        }
    }
}

/// Everything one resolution produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub action: &'static str,
    pub outcome: Outcome,
    /// `None` when prerequisites were not met.
    pub probability: Option<f64>,
    /// `None` when prerequisites were not met.
    pub draw: Option<f64>,
    pub intents: Vec<Intent>,
    pub changes: Vec<StateChange>,
    pub logs: Vec<LogRecord>,
}

/// Collects the output of an effect set.
#[derive(Debug)]
pub struct Effects {
    time: Duration,
    actor: ActorId,
    action: &'static str,
    intents: Vec<Intent>,
    changes: Vec<StateChange>,
    logs: Vec<LogRecord>,
}

impl Effects {
    fn new(ctx: &ActionContext<'_>, profile: &ActionProfile) -> Self {
        Self {
            time: ctx.now,
            actor: ctx.actor.clone(),
            action: profile.id,
            intents: Vec::new(),
            changes: Vec::new(),
            logs: Vec::new(),
        }
    }

    /// Add an `ACTION_LOG` line. `extra` object fields are merged into
    /// the standard actor/action details.
    pub fn log(&mut self, message: impl Into<String>, extra: Value) {
        let mut details = Map::new();
        details.insert("actor".into(), json!(self.actor));
        details.insert("action".into(), json!(self.action));
        if let Value::Object(extra) = extra {
            details.extend(extra);
        }
        self.logs.push(
            LogRecord::new(self.time, LogCategory::ActionLog, message)
                .with_details(Value::Object(details)),
        );
    }

    pub fn change(&mut self, change: StateChange) {
        self.changes.push(change);
    }

    pub fn schedule(&mut self, intent: Intent) {
        self.intents.push(intent);
    }

    fn into_resolution(self, outcome: Outcome, probability: Option<f64>, draw: Option<f64>) -> Resolution {
        Resolution {
            action: self.action,
            outcome,
            probability,
            draw,
            intents: self.intents,
            changes: self.changes,
            logs: self.logs,
        }
    }
}

/// Behavior shared by every action variant.
pub trait Resolve {
    fn profile(&self) -> &'static ActionProfile;

    /// Vulnerability that must be present on the target.
    fn required_vulnerability(&self) -> Option<&VulnerabilityId> {
        None
    }

    /// Checks specific to this action, run after the generic ones.
    fn check_specific(&self, _ctx: &ActionContext<'_>, _state: &StateStore) -> Result<(), Unmet> {
        Ok(())
    }

    /// Read-only. Generic checks first, then [`check_specific`](Self::check_specific).
    fn check_prerequisites(&self, ctx: &ActionContext<'_>, state: &StateStore) -> Result<(), Unmet> {
        check_generic(self, ctx, state)?;
        self.check_specific(ctx, state)
    }

    /// Probability of success in `[0, 1]`.
    fn success_probability(&self, ctx: &ActionContext<'_>, state: &StateStore) -> f64;

    fn apply_success(
        &self,
        ctx: &ActionContext<'_>,
        state: &mut StateStore,
        effects: &mut Effects,
    ) -> Result<(), ActionError>;

    fn apply_failure(
        &self,
        _ctx: &ActionContext<'_>,
        _state: &mut StateStore,
        _effects: &mut Effects,
    ) -> Result<(), ActionError> {
        Ok(())
    }
}

/// Combine a base probability with the difficulty and posture terms.
///
/// Easier vulnerabilities and weaker posture raise the probability. Each
/// term is clamped, as is the sum, so the result is always in `[0, 1]`.
pub fn success_probability(base: f64, difficulty: Option<u8>, posture: Option<f64>) -> f64 {
    let mut p = base;
    if let Some(difficulty) = difficulty {
        p += ((MIDPOINT_DIFFICULTY - f64::from(difficulty)) / 10.0)
            .clamp(-MAX_DIFFICULTY_MODIFIER, MAX_DIFFICULTY_MODIFIER);
    }
    if let Some(posture) = posture {
        if !posture.is_nan() {
            p += ((MIDPOINT_DIFFICULTY - posture) / 20.0)
                .clamp(-MAX_POSTURE_MODIFIER, MAX_POSTURE_MODIFIER);
        }
    }
    clamp_probability(p)
}

fn clamp_probability(p: f64) -> f64 {
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

fn check_generic<A: Resolve + ?Sized>(
    action: &A,
    ctx: &ActionContext<'_>,
    state: &StateStore,
) -> Result<(), Unmet> {
    let profile = action.profile();

    let actor = state
        .actor(ctx.actor)
        .ok_or_else(|| Unmet(format!("actor {} is not registered", ctx.actor)))?;
    if profile.team != Team::Neutral && actor.team != profile.team {
        return Err(Unmet(format!(
            "{} is a {} action but {} plays for {}",
            profile.name, profile.team, actor.id, actor.team
        )));
    }
    if actor.action_points < profile.action_point_cost {
        return Err(Unmet(format!(
            "insufficient action points (have {}, need {})",
            actor.action_points, profile.action_point_cost
        )));
    }

    if !profile.requires_target {
        return Ok(());
    }
    let target_id = ctx
        .target
        .ok_or_else(|| Unmet("no target node given".to_string()))?;
    let target = state
        .get_node(target_id)
        .ok_or_else(|| Unmet(format!("target node {target_id} does not exist")))?;
    if profile.requires_operational && !target.is_operational() {
        return Err(Unmet(format!("target {target_id} is {}", target.status())));
    }
    if let Some(vuln) = action.required_vulnerability() {
        if !target.has_vulnerability(vuln) {
            return Err(Unmet(format!("{target_id} does not have vulnerability {vuln}")));
        }
    }

    if let Some(source_id) = ctx.source {
        let source = state
            .get_node(source_id)
            .ok_or_else(|| Unmet(format!("source node {source_id} does not exist")))?;
        if !state.is_connected(source_id, target_id, actor.team) {
            return Err(Unmet(format!(
                "no {}-traversable edge {source_id} -> {target_id}",
                actor.team
            )));
        }
        let address = ctx
            .payload
            .get("source_ip")
            .and_then(Value::as_str)
            .unwrap_or(source.address.as_str());
        if state.is_blocked(address) {
            return Err(Unmet(format!("source address {address} is blocked")));
        }
    }

    Ok(())
}

/// Resolve `action` against `state`.
///
/// Prerequisites failing is a normal outcome: one log line, zero
/// mutations and no random draw. Otherwise action points are debited,
/// exactly one value is drawn and one of the effect sets is applied.
///
/// On `Err` the state may be partially mutated; the caller restores it.
pub fn resolve<A: Resolve + ?Sized>(
    action: &A,
    ctx: &ActionContext<'_>,
    state: &mut StateStore,
    rng: &mut RandomStream,
) -> Result<Resolution, ActionError> {
    let profile = action.profile();
    let mut effects = Effects::new(ctx, profile);

    if let Err(unmet) = action.check_prerequisites(ctx, state) {
        effects.log(
            format!(
                "[{}] {} on {} failed: prerequisites not met ({unmet})",
                ctx.actor,
                profile.name,
                ctx.target_label()
            ),
            json!({ "target": ctx.target, "reason": unmet.0 }),
        );
        return Ok(effects.into_resolution(Outcome::PrerequisitesUnmet, None, None));
    }

    let cost = profile.action_point_cost;
    if !state.spend_action_points(ctx.actor, cost) {
        return Err(ActionError::ActionPoints {
            actor: ctx.actor.clone(),
            cost,
        });
    }
    effects.change(StateChange::ActionPointsSpent {
        actor: ctx.actor.clone(),
        amount: cost,
        remaining: state.action_points(ctx.actor).unwrap_or(0),
    });

    let probability = clamp_probability(action.success_probability(ctx, state));
    let draw = rng.next_float();
    let succeeded = draw < probability;

    let (outcome, verdict) = if succeeded {
        (Outcome::Success, "SUCCESS")
    } else {
        (Outcome::Failure, "FAILED")
    };
    effects.log(
        format!(
            "[{}] {verdict}: {} on {} (p={probability:.3}, draw={draw:.3})",
            ctx.actor,
            profile.name,
            ctx.target_label()
        ),
        json!({
            "target": ctx.target,
            "source": ctx.source,
            "probability": probability,
            "draw": draw,
            "outcome": outcome,
        }),
    );

    if succeeded {
        action.apply_success(ctx, state, &mut effects)?;
    } else {
        action.apply_failure(ctx, state, &mut effects)?;
    }

    Ok(effects.into_resolution(outcome, Some(probability), Some(draw)))
}

/// The closed set of actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Action {
    ScanNode(ScanNode),
    ExploitPublicFacingApplication(ExploitPublicFacingApplication),
    BlockIpAddress(BlockIpAddress),
    PatchVulnerability(PatchVulnerability),
    IsolateHost(IsolateHost),
}

impl Action {
    pub fn scan() -> Self {
        Action::ScanNode(ScanNode)
    }

    pub fn exploit(vulnerability: impl Into<VulnerabilityId>) -> Self {
        Action::ExploitPublicFacingApplication(ExploitPublicFacingApplication {
            vulnerability: vulnerability.into(),
        })
    }

    pub fn block_ip(ip: impl Into<String>) -> Self {
        Action::BlockIpAddress(BlockIpAddress { ip: ip.into() })
    }

    pub fn patch(vulnerability: impl Into<VulnerabilityId>) -> Self {
        Action::PatchVulnerability(PatchVulnerability {
            vulnerability: vulnerability.into(),
        })
    }

    pub fn isolate() -> Self {
        Action::IsolateHost(IsolateHost)
    }

    /// Profiles of every action type.
    pub fn catalog() -> [&'static ActionProfile; 5] {
        [
            &scan::PROFILE,
            &exploit::PROFILE,
            &block_ip::PROFILE,
            &patch::PROFILE,
            &isolate::PROFILE,
        ]
    }

    fn variant(&self) -> &dyn Resolve {
        match self {
            Action::ScanNode(a) => a,
            Action::ExploitPublicFacingApplication(a) => a,
            Action::BlockIpAddress(a) => a,
            Action::PatchVulnerability(a) => a,
            Action::IsolateHost(a) => a,
        }
    }
}

impl Resolve for Action {
    fn profile(&self) -> &'static ActionProfile {
        self.variant().profile()
    }

    fn required_vulnerability(&self) -> Option<&VulnerabilityId> {
        self.variant().required_vulnerability()
    }

    fn check_specific(&self, ctx: &ActionContext<'_>, state: &StateStore) -> Result<(), Unmet> {
        self.variant().check_specific(ctx, state)
    }

    fn check_prerequisites(&self, ctx: &ActionContext<'_>, state: &StateStore) -> Result<(), Unmet> {
        self.variant().check_prerequisites(ctx, state)
    }

    fn success_probability(&self, ctx: &ActionContext<'_>, state: &StateStore) -> f64 {
        self.variant().success_probability(ctx, state)
    }

    fn apply_success(
        &self,
        ctx: &ActionContext<'_>,
        state: &mut StateStore,
        effects: &mut Effects,
    ) -> Result<(), ActionError> {
        self.variant().apply_success(ctx, state, effects)
    }

    fn apply_failure(
        &self,
        ctx: &ActionContext<'_>,
        state: &mut StateStore,
        effects: &mut Effects,
    ) -> Result<(), ActionError> {
        self.variant().apply_failure(ctx, state, effects)
    }
}
