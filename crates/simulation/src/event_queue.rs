//! Event queue with deterministic ordering.

use redblue_core::Intent;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::time::Duration;

/// Key for ordering events in the queue.
///
/// Events are ordered by:
/// 1. Time (earlier first)
/// 2. Priority (lower first)
/// 3. Sequence number (FIFO for same time/priority)
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct EventKey {
    /// When this event should be processed.
    pub time: Duration,
    /// Priority for ordering at same time.
    pub priority: i32,
    /// Sequence number for deterministic FIFO ordering.
    pub sequence: u64,
}

impl EventKey {
    /// Create a new event key for an [`Intent`].
    pub fn new(intent: &Intent, sequence: u64) -> Self {
        Self {
            time: intent.time,
            priority: intent.priority,
            sequence,
        }
    }
}

impl Ord for EventKey {
    fn cmp(&self, other: &Self) -> Ordering {
        // Order by time first
        match self.time.cmp(&other.time) {
            Ordering::Equal => {}
            ord => return ord,
        }

        // Then by priority
        match self.priority.cmp(&other.priority) {
            Ordering::Equal => {}
            ord => return ord,
        }

        // Finally by sequence (FIFO)
        self.sequence.cmp(&other.sequence)
    }
}

impl PartialOrd for EventKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordered queue of pending intents.
///
/// Every intent is consumed exactly once. There is no removal of a single
/// scheduled intent; [`clear`](Self::clear) drops them all.
#[derive(Debug, Clone, Default)]
pub struct EventScheduler {
    queue: BTreeMap<EventKey, Intent>,
    /// Sequence counter for deterministic ordering.
    sequence: u64,
}

impl EventScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an intent. Returns the key it was filed under.
    pub fn schedule(&mut self, intent: Intent) -> EventKey {
        self.sequence += 1;
        let key = EventKey::new(&intent, self.sequence);
        self.queue.insert(key, intent);
        key
    }

    /// Remove and return the earliest intent.
    pub fn pop_next(&mut self) -> Option<(EventKey, Intent)> {
        self.queue.pop_first()
    }

    /// Timestamp of the earliest intent.
    pub fn peek_timestamp(&self) -> Option<Duration> {
        self.queue.first_key_value().map(|(key, _)| key.time)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Drop every pending intent and restart the sequence counter.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.sequence = 0;
    }

    /// Pending intents in processing order.
    pub fn iter(&self) -> impl Iterator<Item = (&EventKey, &Intent)> {
        self.queue.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redblue_core::Action;

    fn key(time: u64, priority: i32, sequence: u64) -> EventKey {
        EventKey {
            time: Duration::from_secs(time),
            priority,
            sequence,
        }
    }

    #[test]
    fn test_event_key_ordering() {
        assert!(key(1, 5, 9) < key(2, -5, 1));
    }

    #[test]
    fn test_priority_ordering_at_same_time() {
        assert!(
            key(1, -1, 2) < key(1, 0, 1),
            "Lower priority value should process first"
        );
    }

    #[test]
    fn test_sequence_ordering_at_same_time_and_priority() {
        assert!(key(1, 0, 1) < key(1, 0, 2));
    }

    #[test]
    fn test_scheduler_resolution_order() {
        let mut scheduler = EventScheduler::new();
        let scan = |t: u64, p: i32, target: &str| {
            Intent::perform(Duration::from_secs(t), "RedTeam_Alpha", Action::scan())
                .targeting(target)
                .with_priority(p)
        };
        scheduler.schedule(scan(10, 0, "a"));
        scheduler.schedule(scan(5, -1, "b"));
        scheduler.schedule(scan(10, 0, "c"));
        scheduler.schedule(scan(10, 1, "d"));

        assert_eq!(scheduler.peek_timestamp(), Some(Duration::from_secs(5)));

        let mut order = Vec::new();
        while let Some((_, intent)) = scheduler.pop_next() {
            order.push(intent.target.unwrap().to_string());
        }
        assert_eq!(order, vec!["b", "a", "c", "d"]);
        assert!(scheduler.is_empty());
        assert_eq!(scheduler.peek_timestamp(), None);
    }

    #[test]
    fn test_clear_restarts_sequence() {
        let mut scheduler = EventScheduler::new();
        scheduler.schedule(Intent::replenish(Duration::from_secs(1)));
        scheduler.schedule(Intent::replenish(Duration::from_secs(2)));
        scheduler.clear();
        assert!(scheduler.is_empty());

        let key = scheduler.schedule(Intent::replenish(Duration::from_secs(3)));
        assert_eq!(key.sequence, 1);
    }
}
