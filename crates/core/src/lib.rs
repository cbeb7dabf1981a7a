//! Core vocabulary for the red/blue simulation.
//!
//! - [`Intent`]: a timestamped unit of work for the scheduler
//! - [`Action`]: the closed set of things an actor can do
//! - [`Resolve`] and [`resolve`]: the protocol turning an action into a
//!   deterministic state transition
//! - [`LogRecord`] and [`LogSink`]: the structured simulation log
//!
//! # Resolution
//!
//! ```text
//! Intent ──► ActionContext ──► resolve(action, ctx, &mut StateStore, &mut RandomStream)
//!                                    │
//!                                    ▼
//!                     Resolution { outcome, changes, intents, logs }
//! ```
//!
//! Resolution is synchronous and performs no I/O. Follow-up intents are
//! returned to the caller for scheduling; log records are returned for the
//! caller to route to its sink.

pub mod actions;
mod intent;
mod log;

pub use actions::{
    resolve, success_probability, Action, ActionContext, ActionError, ActionProfile, Effects,
    Outcome, Resolution, Resolve, StateChange, Unmet,
};
pub use intent::{priority, Intent, IntentKind};
pub use log::{HistoryBuffer, LogCategory, LogRecord, LogSink, DEFAULT_HISTORY_CAPACITY};
