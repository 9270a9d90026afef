//! Per-display debounce table for hotplug notifications.
//!
//! Every display id owns at most one pending event. Scheduling a new event
//! for an id replaces whatever was pending for it: an opposite-kind event
//! cancels the earlier one, a same-kind event restarts the delay.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::DisplayId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayEventKind {
    Added,
    Removed,
}

impl DisplayEventKind {
    pub fn opposite(self) -> Self {
        match self {
            Self::Added => Self::Removed,
            Self::Removed => Self::Added,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDisplayEvent {
    pub display_id: DisplayId,
    pub kind: DisplayEventKind,
    pub deadline: Instant,
    generation: u64,
}

/// What happened to the table when an event was scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// Nothing was pending for this display.
    Fresh,
    /// A same-kind event was pending; its timer was restarted.
    Restarted,
    /// An opposite-kind event was pending and has been cancelled.
    Superseded,
}

#[derive(Debug)]
pub struct DebounceTable {
    delay: Duration,
    pending: HashMap<DisplayId, PendingDisplayEvent>,
    next_generation: u64,
}

impl DebounceTable {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: HashMap::new(),
            next_generation: 0,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule(
        &mut self,
        display_id: DisplayId,
        kind: DisplayEventKind,
        now: Instant,
    ) -> ScheduleOutcome {
        self.next_generation += 1;
        let event = PendingDisplayEvent {
            display_id,
            kind,
            deadline: now + self.delay,
            generation: self.next_generation,
        };
        match self.pending.insert(display_id, event) {
            None => ScheduleOutcome::Fresh,
            Some(prev) if prev.kind == kind => ScheduleOutcome::Restarted,
            Some(_) => ScheduleOutcome::Superseded,
        }
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|e| e.deadline).min()
    }

    /// Remove and return every event whose deadline has passed, oldest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<PendingDisplayEvent> {
        let due_ids: Vec<DisplayId> = self
            .pending
            .iter()
            .filter(|(_, e)| e.deadline <= now)
            .map(|(id, _)| *id)
            .collect();
        let mut due: Vec<PendingDisplayEvent> = due_ids
            .into_iter()
            .filter_map(|id| self.pending.remove(&id))
            .collect();
        due.sort_by_key(|e| (e.deadline, e.generation));
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DELAY: Duration = Duration::from_millis(500);

    #[test]
    fn test_fires_once_after_delay() {
        let t0 = Instant::now();
        let mut table = DebounceTable::new(DELAY);
        assert_eq!(
            table.schedule(2, DisplayEventKind::Added, t0),
            ScheduleOutcome::Fresh
        );
        assert!(table.take_due(t0 + Duration::from_millis(499)).is_empty());
        let due = table.take_due(t0 + DELAY);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].kind, DisplayEventKind::Added);
        assert!(table.take_due(t0 + DELAY * 4).is_empty());
    }

    #[test]
    fn test_opposite_event_cancels_pending() {
        let t0 = Instant::now();
        let mut table = DebounceTable::new(DELAY);
        table.schedule(2, DisplayEventKind::Added, t0);
        let outcome = table.schedule(
            2,
            DisplayEventKind::Removed,
            t0 + Duration::from_millis(100),
        );
        assert_eq!(outcome, ScheduleOutcome::Superseded);

        // The add would have fired at t0+500; it must not.
        assert!(table.take_due(t0 + DELAY).is_empty());
        let due = table.take_due(t0 + Duration::from_millis(600));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].kind, DisplayEventKind::Removed);
    }

    #[test]
    fn test_same_kind_restarts_timer() {
        let t0 = Instant::now();
        let mut table = DebounceTable::new(DELAY);
        table.schedule(3, DisplayEventKind::Removed, t0);
        let t1 = t0 + Duration::from_millis(300);
        assert_eq!(
            table.schedule(3, DisplayEventKind::Removed, t1),
            ScheduleOutcome::Restarted
        );
        assert!(table.take_due(t0 + DELAY).is_empty());
        assert_eq!(table.take_due(t1 + DELAY).len(), 1);
    }

    #[test]
    fn test_ids_are_independent() {
        let t0 = Instant::now();
        let mut table = DebounceTable::new(DELAY);
        table.schedule(2, DisplayEventKind::Added, t0);
        table.schedule(3, DisplayEventKind::Removed, t0 + Duration::from_millis(10));
        assert_eq!(table.next_deadline(), Some(t0 + DELAY));
        let due = table.take_due(t0 + Duration::from_secs(1));
        let ids: Vec<_> = due.iter().map(|e| e.display_id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert!(table.is_empty());
    }

    fn arb_kind() -> impl Strategy<Value = DisplayEventKind> {
        prop_oneof![Just(DisplayEventKind::Added), Just(DisplayEventKind::Removed)]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn only_last_event_fires(
            events in prop::collection::vec((arb_kind(), 0u64..499), 1..40)
        ) {
            let t0 = Instant::now();
            let mut table = DebounceTable::new(DELAY);
            let mut now = t0;
            for (kind, gap) in &events {
                now += Duration::from_millis(*gap);
                table.schedule(7, *kind, now);
                // Nothing fires while events keep arriving inside the window.
                prop_assert!(table.take_due(now).is_empty());
            }
            let last_kind = events.last().map(|(k, _)| *k).unwrap();

            prop_assert!(table.take_due(now + DELAY - Duration::from_millis(1)).is_empty());
            let due = table.take_due(now + DELAY);
            prop_assert_eq!(due.len(), 1);
            prop_assert_eq!(due[0].kind, last_kind);
            prop_assert!(table.take_due(now + DELAY * 10).is_empty());
        }
    }
}
