//! Decision seam for actor planning turns.

use redblue_core::Intent;
use redblue_state::StateStore;
use redblue_types::ActorId;
use std::time::Duration;

/// Chooses what an actor does next when its `Decide` intent comes due.
///
/// Returned intents are scheduled as-is. Implementations must be
/// deterministic for runs to be reproducible.
pub trait Planner: Send {
    fn decide(&mut self, now: Duration, actor: &ActorId, state: &StateStore) -> Vec<Intent>;
}

/// Planner that never acts.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdlePlanner;

impl Planner for IdlePlanner {
    fn decide(&mut self, _now: Duration, _actor: &ActorId, _state: &StateStore) -> Vec<Intent> {
        Vec::new()
    }
}

impl<F> Planner for F
where
    F: FnMut(Duration, &ActorId, &StateStore) -> Vec<Intent> + Send,
{
    fn decide(&mut self, now: Duration, actor: &ActorId, state: &StateStore) -> Vec<Intent> {
        self(now, actor, state)
    }
}
