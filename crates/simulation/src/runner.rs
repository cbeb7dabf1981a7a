//! Deterministic simulation runner.
//!
//! One runner owns one [`SimulationContext`]. Intents are consumed in
//! [`EventKey`] order, either one at a time (stepped mode) or up to a
//! logical deadline derived from wall-clock time (paced mode). Given the
//! same seed, scenario and intents it produces identical results every run.

use crate::event_queue::EventKey;
use crate::{IdlePlanner, Planner, SimulationContext, Snapshot};
use redblue_core::{
    resolve, ActionContext, ActionError, HistoryBuffer, Intent, IntentKind, LogCategory,
    LogRecord, LogSink, Outcome, Resolve, StateChange, DEFAULT_HISTORY_CAPACITY,
};
use redblue_state::{Scenario, ScenarioError, StateError};
use serde::Serialize;
use serde_json::json;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Default cap on events resolved by one [`SimulationRunner::advance_by`] call.
pub const DEFAULT_MAX_EVENTS_PER_ADVANCE: usize = 10_000;

/// Runner configuration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Replenish every actor's action points at this interval.
    pub replenish_interval: Option<Duration>,
    /// Give every actor a planning turn this long after load.
    pub initial_decision: Option<Duration>,
    /// Upper bound on events resolved in one paced tick.
    pub max_events_per_advance: usize,
    /// Records kept in the in-memory history.
    pub history_capacity: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            replenish_interval: None,
            initial_decision: None,
            max_events_per_advance: DEFAULT_MAX_EVENTS_PER_ADVANCE,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl RunnerConfig {
    pub fn with_replenish_interval(mut self, interval: Duration) -> Self {
        self.replenish_interval = Some(interval).filter(|i| !i.is_zero());
        self
    }

    pub fn with_initial_decision(mut self, delay: Duration) -> Self {
        self.initial_decision = Some(delay);
        self
    }

    pub fn with_max_events_per_advance(mut self, max: usize) -> Self {
        self.max_events_per_advance = max.max(1);
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }
}

/// Statistics collected during simulation.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationStats {
    /// Total events processed.
    pub events_processed: u64,
    /// Intents added to the queue, including follow-ups.
    pub intents_scheduled: u64,
    pub actions_succeeded: u64,
    pub actions_failed: u64,
    pub prerequisites_unmet: u64,
    /// Actions rolled back after an error or panic.
    pub actions_faulted: u64,
    /// Faults caused by a missing node or actor.
    pub lookup_misses: u64,
    /// Events popped with a timestamp behind the clock.
    pub clock_skews: u64,
    pub decisions: u64,
    pub replenishments: u64,
}

impl SimulationStats {
    /// Actions that got past their prerequisites.
    pub fn actions_attempted(&self) -> u64 {
        self.actions_succeeded + self.actions_failed
    }

    /// Fraction of attempted actions that succeeded.
    pub fn success_rate(&self) -> f64 {
        let attempted = self.actions_attempted();
        if attempted == 0 {
            0.0
        } else {
            self.actions_succeeded as f64 / attempted as f64
        }
    }
}

/// Deterministic simulation runner.
///
/// Processes intents in deterministic order and resolves their actions
/// against the state store. All mutation happens on the caller's thread;
/// there is no interior locking.
pub struct SimulationRunner {
    ctx: SimulationContext,
    config: RunnerConfig,
    seed: u64,
    scenario: Scenario,
    planner: Box<dyn Planner>,
    history: HistoryBuffer,
    forward: Option<Box<dyn LogSink + Send>>,
    stats: SimulationStats,
}

impl std::fmt::Debug for SimulationRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationRunner")
            .field("scenario", &self.scenario.name)
            .field("seed", &self.seed)
            .field("now", &self.ctx.now)
            .field("pending_events", &self.ctx.scheduler.len())
            .finish()
    }
}

impl SimulationRunner {
    /// Load `scenario` with the default configuration.
    pub fn new(scenario: Scenario, seed: u64) -> Result<Self, ScenarioError> {
        Self::with_config(scenario, seed, RunnerConfig::default())
    }

    /// Load `scenario`. Fails without side effects if it does not validate.
    pub fn with_config(
        scenario: Scenario,
        seed: u64,
        config: RunnerConfig,
    ) -> Result<Self, ScenarioError> {
        let ctx = SimulationContext::new(&scenario, seed)?;
        let mut runner = Self {
            ctx,
            history: HistoryBuffer::with_capacity(config.history_capacity),
            config,
            seed,
            scenario,
            planner: Box::new(IdlePlanner),
            forward: None,
            stats: SimulationStats::default(),
        };
        runner.bootstrap();
        Ok(runner)
    }

    /// Route actor planning turns to `planner`.
    pub fn with_planner(mut self, planner: impl Planner + 'static) -> Self {
        self.planner = Box::new(planner);
        self
    }

    /// Forward every log record to `sink` in addition to the history.
    pub fn set_log_sink(&mut self, sink: impl LogSink + Send + 'static) {
        self.forward = Some(Box::new(sink));
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Inspection
    // ═══════════════════════════════════════════════════════════════════════

    /// Current logical time.
    pub fn now(&self) -> Duration {
        self.ctx.now
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn context(&self) -> &SimulationContext {
        &self.ctx
    }

    pub fn state(&self) -> &redblue_state::StateStore {
        &self.ctx.state
    }

    pub fn stats(&self) -> &SimulationStats {
        &self.stats
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn pending_events(&self) -> usize {
        self.ctx.scheduler.len()
    }

    /// Timestamp of the next intent due.
    pub fn next_event_time(&self) -> Option<Duration> {
        self.ctx.scheduler.peek_timestamp()
    }

    /// Consistent point-in-time view.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            time: self.ctx.now,
            pending_events: self.ctx.scheduler.len(),
            stats: self.stats.clone(),
            state: self.ctx.state.clone(),
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Scheduling
    // ═══════════════════════════════════════════════════════════════════════

    /// Enqueue an intent at its own timestamp.
    pub fn schedule(&mut self, intent: Intent) -> EventKey {
        let key = self.ctx.scheduler.schedule(intent);
        self.stats.intents_scheduled += 1;
        key
    }

    /// Enqueue an intent `delay` after the current logical time.
    pub fn schedule_after(&mut self, delay: Duration, mut intent: Intent) -> EventKey {
        intent.time = self.ctx.now.saturating_add(delay);
        self.schedule(intent)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Stepped mode
    // ═══════════════════════════════════════════════════════════════════════

    /// Resolve exactly one intent. Returns its key, or `None` if the queue
    /// is empty.
    pub fn advance_one_event(&mut self) -> Option<EventKey> {
        let (key, intent) = self.ctx.scheduler.pop_next()?;
        self.process(key, intent);
        Some(key)
    }

    /// Resolve every intent due at or before `end_time`, then move the
    /// clock to `end_time` if it is behind.
    pub fn run_until(&mut self, end_time: Duration) {
        trace!(end_time_secs = end_time.as_secs_f64(), "Running simulation step");
        self.log_control(
            format!("Running simulation until {:.3}s", end_time.as_secs_f64()),
            json!({ "until": end_time.as_secs_f64() }),
        );

        while let Some(next) = self.ctx.scheduler.peek_timestamp() {
            if next > end_time {
                debug!(
                    remaining_events = self.ctx.scheduler.len(),
                    "Time limit reached"
                );
                break;
            }
            self.advance_one_event();
        }

        // Always advance time to end_time, even if we ran out of events.
        if self.ctx.now < end_time {
            self.ctx.now = end_time;
        }

        self.log_control(
            format!("Run until {:.3}s complete", end_time.as_secs_f64()),
            json!({ "events_processed": self.stats.events_processed }),
        );
    }

    /// Resolve intents until only self-rescheduling system work remains.
    ///
    /// Periodic replenishment alone never ends a run, so it does not count
    /// as pending work.
    pub fn run_all(&mut self) {
        self.log_control("Running all scheduled events".to_string(), json!({}));
        while self.has_pending_work() {
            self.advance_one_event();
        }
        self.log_control(
            "All events processed".to_string(),
            json!({ "events_processed": self.stats.events_processed }),
        );
    }

    fn has_pending_work(&self) -> bool {
        self.ctx
            .scheduler
            .iter()
            .any(|(_, intent)| !matches!(intent.kind, IntentKind::ReplenishActionPoints))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Paced mode
    // ═══════════════════════════════════════════════════════════════════════

    /// One paced tick: advance logical time by `wall_delta * speed`.
    ///
    /// Resolves every intent due by the new logical time, including
    /// follow-ups scheduled during this tick. A speed of zero freezes the
    /// clock but still resolves anything already due. Returns the number
    /// of events resolved.
    pub fn advance_by(&mut self, wall_delta: Duration, speed: f64) -> usize {
        let speed = if speed.is_finite() { speed.max(0.0) } else { 0.0 };
        let delta = Duration::try_from_secs_f64(wall_delta.as_secs_f64() * speed)
            .unwrap_or(Duration::MAX);
        let target = self.ctx.now.saturating_add(delta);

        let mut processed = 0;
        while let Some(next) = self.ctx.scheduler.peek_timestamp() {
            if next > target {
                break;
            }
            if processed == self.config.max_events_per_advance {
                warn!(
                    processed,
                    remaining_events = self.ctx.scheduler.len(),
                    "Event budget for this tick exhausted"
                );
                // Leave the clock at the last resolved event.
                return processed;
            }
            self.advance_one_event();
            processed += 1;
        }

        self.ctx.now = self.ctx.now.max(target);
        processed
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Lifecycle
    // ═══════════════════════════════════════════════════════════════════════

    /// Replace the run with a fresh one: new state, new random stream,
    /// empty queue, clock at zero.
    ///
    /// A scenario that fails validation leaves the current run untouched.
    pub fn reset(&mut self, scenario: Scenario, seed: u64) -> Result<(), ScenarioError> {
        let ctx = SimulationContext::new(&scenario, seed)?;
        info!(scenario = %scenario.name, seed, "Resetting simulation");
        self.ctx = ctx;
        self.scenario = scenario;
        self.seed = seed;
        self.stats = SimulationStats::default();
        self.history.clear();
        self.bootstrap();
        Ok(())
    }

    fn bootstrap(&mut self) {
        let init = LogRecord::new(
            Duration::ZERO,
            LogCategory::EngineInit,
            format!("Simulation initialised with seed {}", self.seed),
        )
        .with_details(json!({ "seed": self.seed }));
        let state = &self.ctx.state;
        let loaded = LogRecord::new(
            Duration::ZERO,
            LogCategory::ScenarioLoaded,
            format!(
                "Scenario '{}' loaded: {} nodes, {} edges, {} actors",
                self.scenario.name,
                state.node_count(),
                state.edge_count(),
                state.actors().count()
            ),
        )
        .with_details(json!({
            "scenario": self.scenario.name,
            "nodes": state.node_count(),
            "edges": state.edge_count(),
            "actors": state.actors().map(|a| a.id.clone()).collect::<Vec<_>>(),
        }));
        self.emit(init);
        self.emit(loaded);

        if let Some(interval) = self.config.replenish_interval {
            self.schedule_logged(Intent::replenish(interval));
        }
        if let Some(delay) = self.config.initial_decision {
            let actors: Vec<_> = self.ctx.state.actors().map(|a| a.id.clone()).collect();
            for actor in actors {
                self.schedule_logged(Intent::decide(delay, actor));
            }
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Event processing
    // ═══════════════════════════════════════════════════════════════════════

    fn process(&mut self, key: EventKey, intent: Intent) {
        if key.time < self.ctx.now {
            self.stats.clock_skews += 1;
            self.emit(
                LogRecord::new(
                    self.ctx.now,
                    LogCategory::ClockSkew,
                    format!(
                        "Processing {} from the past: event at {:.3}s, clock at {:.3}s",
                        intent.label(),
                        key.time.as_secs_f64(),
                        self.ctx.now.as_secs_f64()
                    ),
                )
                .with_details(json!({
                    "event_time": key.time.as_secs_f64(),
                    "now": self.ctx.now.as_secs_f64(),
                    "sequence": key.sequence,
                })),
            );
        } else {
            self.ctx.now = key.time;
        }

        trace!(time = ?self.ctx.now, sequence = key.sequence, intent = %intent.label(), "Processing event");
        self.stats.events_processed += 1;
        self.emit(
            LogRecord::new(
                self.ctx.now,
                LogCategory::EventProcessingStart,
                format!("Processing {} for actor '{}'", intent.label(), intent.actor),
            )
            .with_details(json!({
                "sequence": key.sequence,
                "priority": key.priority,
                "actor": intent.actor,
                "target": intent.target,
                "source": intent.source,
                "kind": intent.kind.name(),
            })),
        );

        match &intent.kind {
            IntentKind::PerformAction { action } => self.perform(key, &intent, action),
            IntentKind::Decide => self.decide(&intent),
            IntentKind::ReplenishActionPoints => self.replenish(),
        }

        self.emit(
            LogRecord::new(
                self.ctx.now,
                LogCategory::EventProcessingEnd,
                format!("Finished processing {}", intent.label()),
            )
            .with_details(json!({ "sequence": key.sequence })),
        );
    }

    fn perform<A: Resolve + ?Sized>(&mut self, key: EventKey, intent: &Intent, action: &A) {
        let now = self.ctx.now;
        let action_ctx = ActionContext::from_intent(now, intent);
        let rollback = self.ctx.state.clone();

        let state = &mut self.ctx.state;
        let rng = &mut self.ctx.rng;
        let result = catch_unwind(AssertUnwindSafe(|| resolve(action, &action_ctx, state, rng)));

        let resolution = match result {
            Ok(Ok(resolution)) => resolution,
            Ok(Err(err)) => {
                self.ctx.state = rollback;
                self.fault(key, intent, action.profile().id, FaultCause::Error(err));
                return;
            }
            Err(panic) => {
                self.ctx.state = rollback;
                self.fault(key, intent, action.profile().id, FaultCause::Panic(panic));
                return;
            }
        };

        match resolution.outcome {
            Outcome::Success => self.stats.actions_succeeded += 1,
            Outcome::Failure => self.stats.actions_failed += 1,
            Outcome::PrerequisitesUnmet => self.stats.prerequisites_unmet += 1,
        }
        debug!(
            action = resolution.action,
            actor = %intent.actor,
            outcome = ?resolution.outcome,
            probability = ?resolution.probability,
            draw = ?resolution.draw,
            "Action resolved"
        );

        for record in resolution.logs {
            self.emit(record);
        }
        for change in &resolution.changes {
            self.emit_change(change);
        }
        for follow_up in resolution.intents {
            self.schedule_logged(follow_up);
        }
    }

    fn fault(&mut self, key: EventKey, intent: &Intent, action_id: &'static str, cause: FaultCause) {
        let lookup_miss = matches!(
            cause,
            FaultCause::Error(ActionError::State(
                StateError::NodeNotFound(_) | StateError::ActorNotFound(_)
            ))
        );
        let error = cause.to_string();

        if lookup_miss {
            self.stats.lookup_misses += 1;
            self.emit(
                LogRecord::new(
                    self.ctx.now,
                    LogCategory::LookupMiss,
                    format!("{action_id} for '{}' skipped: {error}", intent.actor),
                )
                .with_details(json!({ "action_id": action_id, "error": error })),
            );
        } else {
            self.stats.actions_faulted += 1;
            self.emit(
                LogRecord::new(
                    self.ctx.now,
                    LogCategory::ActionError,
                    format!("Error executing action '{action_id}': {error}"),
                )
                .with_details(json!({
                    "action_id": action_id,
                    "actor": intent.actor,
                    "sequence": key.sequence,
                    "error": error,
                })),
            );
        }
    }

    fn decide(&mut self, intent: &Intent) {
        if self.ctx.state.actor(&intent.actor).is_none() {
            self.stats.lookup_misses += 1;
            self.emit(
                LogRecord::new(
                    self.ctx.now,
                    LogCategory::LookupMiss,
                    format!("Decision turn for unknown actor '{}'", intent.actor),
                )
                .with_details(json!({ "actor": intent.actor })),
            );
            return;
        }

        self.stats.decisions += 1;
        self.emit(
            LogRecord::new(
                self.ctx.now,
                LogCategory::AiDecisionPhase,
                format!("Actor '{}' to decide next action", intent.actor),
            )
            .with_details(json!({ "actor": intent.actor })),
        );

        let intents = self
            .planner
            .decide(self.ctx.now, &intent.actor, &self.ctx.state);
        for next in intents {
            self.schedule_logged(next);
        }
    }

    fn replenish(&mut self) {
        let actors = self.ctx.state.replenish_all();
        self.stats.replenishments += 1;
        self.emit(
            LogRecord::new(
                self.ctx.now,
                LogCategory::ApReplenished,
                format!("Action points replenished for {actors} actors"),
            )
            .with_details(json!({ "actors": actors })),
        );
        self.emit_change(&StateChange::ActionPointsReplenished { actors });

        if let Some(interval) = self.config.replenish_interval {
            self.schedule_logged(Intent::replenish(self.ctx.now.saturating_add(interval)));
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Logging
    // ═══════════════════════════════════════════════════════════════════════

    fn schedule_logged(&mut self, intent: Intent) {
        let record = LogRecord::new(
            self.ctx.now,
            LogCategory::EventScheduled,
            format!(
                "Scheduled {} for actor '{}' at {:.3}s",
                intent.label(),
                intent.actor,
                intent.time.as_secs_f64()
            ),
        )
        .with_details(json!({
            "time": intent.time.as_secs_f64(),
            "priority": intent.priority,
            "actor": intent.actor,
            "target": intent.target,
        }));
        self.schedule(intent);
        self.emit(record);
    }

    fn emit_change(&mut self, change: &StateChange) {
        let details = serde_json::to_value(change).unwrap_or_default();
        self.emit(
            LogRecord::new(
                self.ctx.now,
                LogCategory::StateChange,
                format!("State change: {}", change.kind()),
            )
            .with_details(details),
        );
    }

    /// Record a lifecycle or control event in the domain log.
    pub fn log_control(&mut self, message: impl Into<String>, details: serde_json::Value) {
        let record = LogRecord::new(self.ctx.now, LogCategory::SimControl, message).with_details(details);
        self.emit(record);
    }

    fn emit(&mut self, record: LogRecord) {
        record.trace();
        if let Some(forward) = self.forward.as_mut() {
            forward.record(record.clone());
        }
        self.history.record(record);
    }
}

enum FaultCause {
    Error(ActionError),
    Panic(Box<dyn Any + Send>),
}

impl std::fmt::Display for FaultCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaultCause::Error(err) => write!(f, "{err}"),
            FaultCause::Panic(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .copied()
                    .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
                    .unwrap_or("unknown panic");
                write!(f, "panicked: {message}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redblue_core::Action;
    use redblue_test_helpers::{fixtures, ids};
    use tracing_test::traced_test;

    fn runner() -> SimulationRunner {
        SimulationRunner::new(fixtures::network_scenario(), 42).unwrap()
    }

    fn block(t: u64, ip: &str) -> Intent {
        Intent::perform(Duration::from_secs(t), ids::BLUE, Action::block_ip(ip))
    }

    #[test]
    fn test_run_until_advances_clock_without_events() {
        let mut runner = runner();
        runner.run_until(Duration::from_secs(30));
        assert_eq!(runner.now(), Duration::from_secs(30));
        assert_eq!(runner.stats().events_processed, 0);
    }

    #[test]
    fn test_run_until_stops_at_deadline() {
        let mut runner = runner();
        runner.schedule(block(5, "1.1.1.1"));
        runner.schedule(block(20, "2.2.2.2"));

        runner.run_until(Duration::from_secs(10));
        assert_eq!(runner.stats().events_processed, 1);
        assert_eq!(runner.pending_events(), 1);
        assert_eq!(runner.now(), Duration::from_secs(10));
    }

    #[test]
    fn test_advance_by_scales_with_speed() {
        let mut runner = runner();
        runner.schedule(block(3, "1.1.1.1"));

        assert_eq!(runner.advance_by(Duration::from_secs(1), 2.0), 0);
        assert_eq!(runner.now(), Duration::from_secs(2));

        assert_eq!(runner.advance_by(Duration::from_secs(1), 2.0), 1);
        assert_eq!(runner.now(), Duration::from_secs(4));
    }

    #[test]
    fn test_zero_speed_freezes_clock_but_resolves_due_events() {
        let mut runner = runner();
        runner.run_until(Duration::from_secs(5));
        runner.schedule(block(5, "1.1.1.1"));

        assert_eq!(runner.advance_by(Duration::from_secs(10), 0.0), 1);
        assert_eq!(runner.now(), Duration::from_secs(5));
        assert_eq!(runner.advance_by(Duration::from_secs(10), f64::NAN), 0);
        assert_eq!(runner.now(), Duration::from_secs(5));
    }

    #[test]
    fn test_huge_speed_saturates_clock() {
        let mut runner = runner();
        runner.schedule(block(5, "1.1.1.1"));

        assert_eq!(runner.advance_by(Duration::from_secs(1), 1e20), 1);
        assert_eq!(runner.now(), Duration::MAX);
        assert_eq!(runner.advance_by(Duration::from_secs(1), f64::MAX), 0);
        assert_eq!(runner.now(), Duration::MAX);
    }

    #[traced_test]
    #[test]
    fn test_advance_respects_event_budget() {
        let config = RunnerConfig::default().with_max_events_per_advance(2);
        let mut runner = SimulationRunner::with_config(fixtures::network_scenario(), 42, config).unwrap();
        for t in 1..=3 {
            runner.schedule(block(t, "1.1.1.1"));
        }

        assert_eq!(runner.advance_by(Duration::from_secs(10), 1.0), 2);
        assert_eq!(runner.now(), Duration::from_secs(2));
        assert!(logs_contain("Event budget for this tick exhausted"));
        assert_eq!(runner.advance_by(Duration::from_secs(1), 1.0), 1);
        assert_eq!(runner.now(), Duration::from_secs(3));
    }

    #[test]
    fn test_past_event_is_resolved_with_skew_warning() {
        let mut runner = runner();
        runner.run_until(Duration::from_secs(10));
        runner.schedule(block(3, "1.1.1.1"));

        runner.advance_one_event();

        assert_eq!(runner.now(), Duration::from_secs(10));
        assert_eq!(runner.stats().clock_skews, 1);
        assert_eq!(runner.stats().events_processed, 1);
        let skew: Vec<_> = runner.history().by_category(LogCategory::ClockSkew).collect();
        assert_eq!(skew.len(), 1);
        assert!(skew[0].message.contains("from the past"));
    }

    #[test]
    fn test_replenish_reschedules_itself() {
        let config = RunnerConfig::default().with_replenish_interval(Duration::from_secs(10));
        let mut runner = SimulationRunner::with_config(fixtures::network_scenario(), 42, config).unwrap();
        runner.schedule(Intent::perform(Duration::from_secs(1), ids::BLUE, Action::isolate()).targeting(ids::DB));

        runner.run_until(Duration::from_secs(25));
        assert_eq!(runner.stats().replenishments, 2);
        assert_eq!(runner.state().action_points(&ids::blue()), Some(10));
        assert_eq!(runner.next_event_time(), Some(Duration::from_secs(30)));

        // Replenishment alone is not pending work.
        runner.run_all();
        assert_eq!(runner.pending_events(), 1);
    }

    #[test]
    fn test_initial_decisions_reach_planner() {
        let config = RunnerConfig::default().with_initial_decision(Duration::from_secs(1));
        let planner = |now: Duration, actor: &redblue_types::ActorId, _state: &redblue_state::StateStore| {
            if actor.as_str() == ids::BLUE {
                vec![Intent::perform(now, actor.clone(), Action::block_ip("9.9.9.9"))]
            } else {
                Vec::new()
            }
        };
        let mut runner = SimulationRunner::with_config(fixtures::network_scenario(), 42, config)
            .unwrap()
            .with_planner(planner);

        runner.run_all();
        assert_eq!(runner.stats().decisions, 2);
        assert_eq!(runner.stats().actions_attempted() + runner.stats().prerequisites_unmet, 1);
        assert_eq!(runner.history().by_category(LogCategory::AiDecisionPhase).count(), 2);
    }

    static FAULTY: redblue_core::ActionProfile = redblue_core::ActionProfile {
        id: "Faulty",
        name: "Faulty",
        team: redblue_types::Team::Blue,
        time_cost: Duration::from_secs(1),
        action_point_cost: 1,
        base_probability: 1.0,
        requires_target: false,
        requires_operational: false,
        prerequisites: &[],
        effects: &[],
    };

    /// Blocks an address, then fails in one of several ways.
    enum Faulty {
        Error,
        MissingNode,
        Panic,
    }

    impl Resolve for Faulty {
        fn profile(&self) -> &'static redblue_core::ActionProfile {
            &FAULTY
        }

        fn success_probability(&self, _: &ActionContext<'_>, _: &redblue_state::StateStore) -> f64 {
            1.0
        }

        fn apply_success(
            &self,
            ctx: &ActionContext<'_>,
            state: &mut redblue_state::StateStore,
            _: &mut redblue_core::Effects,
        ) -> Result<(), ActionError> {
            state.block_ip("6.6.6.6");
            match self {
                Faulty::Error => Err(ActionError::MissingTarget("Faulty")),
                Faulty::MissingNode => Err(StateError::NodeNotFound("Ghost".into()).into()),
                Faulty::Panic => panic!("effect exploded for {}", ctx.actor),
            }
        }
    }

    fn run_faulty(runner: &mut SimulationRunner, action: Faulty) {
        let intent = Intent::perform(Duration::from_secs(1), ids::BLUE, Action::block_ip("unused"));
        let key = runner.schedule(intent.clone());
        runner.ctx.scheduler.pop_next();
        runner.perform(key, &intent, &action);
    }

    #[test]
    fn test_faulted_action_rolls_back_state() {
        let mut runner = runner();
        let before = serde_json::to_value(runner.state()).unwrap();

        run_faulty(&mut runner, Faulty::Error);
        run_faulty(&mut runner, Faulty::Panic);

        assert_eq!(serde_json::to_value(runner.state()).unwrap(), before);
        assert!(!runner.state().is_blocked("6.6.6.6"));
        assert_eq!(runner.stats().actions_faulted, 2);
        // The stream is not rolled back with the state.
        assert_eq!(runner.context().rng.draws(), 2);

        let errors: Vec<_> = runner.history().by_category(LogCategory::ActionError).collect();
        assert_eq!(errors.len(), 2);
        assert!(errors[1].message.contains("effect exploded"));
        assert_eq!(errors[0].details["action_id"], "Faulty");
    }

    #[test]
    fn test_missing_node_during_effects_is_lookup_miss() {
        let mut runner = runner();
        run_faulty(&mut runner, Faulty::MissingNode);

        assert!(!runner.state().is_blocked("6.6.6.6"));
        assert_eq!(runner.stats().lookup_misses, 1);
        assert_eq!(runner.stats().actions_faulted, 0);
        assert_eq!(runner.history().by_category(LogCategory::LookupMiss).count(), 1);
    }

    #[test]
    fn test_decision_for_unknown_actor_is_lookup_miss() {
        let mut runner = runner();
        runner.schedule(Intent::decide(Duration::from_secs(1), "Ghost"));
        runner.run_all();
        assert_eq!(runner.stats().lookup_misses, 1);
        assert_eq!(runner.history().by_category(LogCategory::LookupMiss).count(), 1);
    }

    #[test]
    fn test_reset_restores_initial_run() {
        let mut runner = runner();
        runner.schedule(block(1, "1.1.1.1"));
        runner.run_all();
        assert!(runner.now() > Duration::ZERO);

        runner.reset(fixtures::network_scenario(), 7).unwrap();
        assert_eq!(runner.now(), Duration::ZERO);
        assert_eq!(runner.pending_events(), 0);
        assert_eq!(runner.seed(), 7);
        assert_eq!(runner.stats(), &SimulationStats::default());
        assert!(!runner.state().is_blocked("1.1.1.1"));
        assert_eq!(runner.context().rng.draws(), 0);
    }

    #[test]
    fn test_invalid_reset_keeps_current_run() {
        let mut runner = runner();
        runner.schedule(block(1, "1.1.1.1"));
        let bad = fixtures::network_scenario().with_edge(redblue_types::Edge::new("Nowhere", ids::WEB, "SMB"));

        assert!(runner.reset(bad, 7).is_err());
        assert_eq!(runner.pending_events(), 1);
        assert_eq!(runner.seed(), 42);
    }
}
