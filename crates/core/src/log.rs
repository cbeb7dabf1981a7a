//! Structured simulation log.
//!
//! Every resolved event yields ordered [`LogRecord`]s. They are handed to a
//! [`LogSink`] and mirrored as `tracing` events, so the same stream is
//! available to the history consumer and to diagnostics.

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn, Level};

/// Default number of records kept by a [`HistoryBuffer`].
pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Record category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogCategory {
    EngineInit,
    ScenarioLoaded,
    SimControl,
    EventScheduled,
    EventProcessingStart,
    EventProcessingEnd,
    ActionLog,
    StateChange,
    AiDecisionPhase,
    ApReplenished,
    ActionError,
    ClockSkew,
    LookupMiss,
}

impl LogCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            LogCategory::EngineInit => "ENGINE_INIT",
            LogCategory::ScenarioLoaded => "SCENARIO_LOADED",
            LogCategory::SimControl => "SIM_CONTROL",
            LogCategory::EventScheduled => "EVENT_SCHEDULED",
            LogCategory::EventProcessingStart => "EVENT_PROCESSING_START",
            LogCategory::EventProcessingEnd => "EVENT_PROCESSING_END",
            LogCategory::ActionLog => "ACTION_LOG",
            LogCategory::StateChange => "STATE_CHANGE",
            LogCategory::AiDecisionPhase => "AI_DECISION_PHASE",
            LogCategory::ApReplenished => "AP_REPLENISHED",
            LogCategory::ActionError => "ACTION_ERROR",
            LogCategory::ClockSkew => "CLOCK_SKEW",
            LogCategory::LookupMiss => "LOOKUP_MISS",
        }
    }

    /// Level used when the record is mirrored to `tracing`.
    pub fn level(self) -> Level {
        match self {
            LogCategory::ActionError | LogCategory::ClockSkew | LogCategory::LookupMiss => {
                Level::WARN
            }
            LogCategory::EventScheduled
            | LogCategory::EventProcessingStart
            | LogCategory::EventProcessingEnd
            | LogCategory::StateChange => Level::DEBUG,
            _ => Level::INFO,
        }
    }
}

impl fmt::Display for LogCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the simulation log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    /// Logical time, serialized as fractional seconds.
    #[serde(serialize_with = "serialize_secs")]
    pub time: Duration,
    pub category: LogCategory,
    pub message: String,
    pub details: Value,
}

fn serialize_secs<S: Serializer>(time: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(time.as_secs_f64())
}

impl LogRecord {
    pub fn new(time: Duration, category: LogCategory, message: impl Into<String>) -> Self {
        Self {
            time,
            category,
            message: message.into(),
            details: Value::Null,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = details;
        self
    }

    /// Emit this record as a `tracing` event.
    pub fn trace(&self) {
        let time = self.time.as_secs_f64();
        let category = self.category.as_str();
        let level = self.category.level();
        if level == Level::WARN {
            warn!(time, category, details = %self.details, "{}", self.message);
        } else if level == Level::DEBUG {
            debug!(time, category, details = %self.details, "{}", self.message);
        } else {
            info!(time, category, "{}", self.message);
        }
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:>8.3}] {:<22} {}",
            self.time.as_secs_f64(),
            self.category.as_str(),
            self.message
        )
    }
}

/// Write-only consumer of log records. Must never block.
pub trait LogSink {
    fn record(&mut self, record: LogRecord);
}

impl LogSink for Vec<LogRecord> {
    fn record(&mut self, record: LogRecord) {
        self.push(record);
    }
}

impl LogSink for UnboundedSender<LogRecord> {
    fn record(&mut self, record: LogRecord) {
        // A dropped receiver only means nobody is listening.
        let _ = self.send(record);
    }
}

impl<S: LogSink + ?Sized> LogSink for Box<S> {
    fn record(&mut self, record: LogRecord) {
        (**self).record(record);
    }
}

/// Bounded FIFO of recent records. The oldest entry is evicted once the
/// capacity is reached.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<LogRecord>,
    capacity: usize,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl HistoryBuffer {
    /// Create a buffer holding at most `capacity` records (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_HISTORY_CAPACITY)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogRecord> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Records with `start <= time <= end`, keeping only the most recent
    /// `limit` of them when a limit is given.
    pub fn query(
        &self,
        start: Option<Duration>,
        end: Option<Duration>,
        limit: Option<usize>,
    ) -> Vec<&LogRecord> {
        let matching: Vec<&LogRecord> = self
            .entries
            .iter()
            .filter(|r| start.map_or(true, |s| r.time >= s))
            .filter(|r| end.map_or(true, |e| r.time <= e))
            .collect();
        match limit {
            Some(limit) if matching.len() > limit => matching[matching.len() - limit..].to_vec(),
            _ => matching,
        }
    }

    /// Records of one category, oldest first.
    pub fn by_category(&self, category: LogCategory) -> impl Iterator<Item = &LogRecord> {
        self.entries.iter().filter(move |r| r.category == category)
    }
}

impl LogSink for HistoryBuffer {
    fn record(&mut self, record: LogRecord) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(record);
    }
}
