//! Coordinator timers
//!
//! Single-shot deadlines, at most one per kind. Scheduling a pending kind
//! moves its deadline. Deadlines use `tokio::time::Instant` so a paused
//! test clock drives them.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

use crate::effect::TimerKind;

/// Pending timer deadlines
#[derive(Debug, Default)]
pub struct Timers {
    deadlines: HashMap<TimerKind, Instant>,
}

impl Timers {
    /// Create an empty timer set
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `kind`, replacing any pending deadline
    pub fn schedule(&mut self, kind: TimerKind, after: Duration) {
        self.deadlines.insert(kind, Instant::now() + after);
    }

    /// Cancel `kind` if pending
    pub fn cancel(&mut self, kind: TimerKind) {
        self.deadlines.remove(&kind);
    }

    /// Cancel everything
    pub fn cancel_all(&mut self) {
        self.deadlines.clear();
    }

    /// Check if `kind` is pending
    pub fn is_pending(&self, kind: TimerKind) -> bool {
        self.deadlines.contains_key(&kind)
    }

    /// Deadline of `kind`, if pending
    pub fn deadline(&self, kind: TimerKind) -> Option<Instant> {
        self.deadlines.get(&kind).copied()
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        self.deadlines.values().min().copied()
    }

    /// Remove and return the timers due at `now`, earliest first
    pub fn take_due(&mut self, now: Instant) -> Vec<TimerKind> {
        let mut due: Vec<(Instant, TimerKind)> = self
            .deadlines
            .iter()
            .filter(|(_, deadline)| **deadline <= now)
            .map(|(kind, deadline)| (*deadline, *kind))
            .collect();
        due.sort();

        for (_, kind) in &due {
            self.deadlines.remove(kind);
        }
        due.into_iter().map(|(_, kind)| kind).collect()
    }

    /// Check if no timer is pending
    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_reschedule_moves_deadline() {
        let mut timers = Timers::new();
        timers.schedule(TimerKind::NoteDebounce, Duration::from_secs(2));
        let first = timers.deadline(TimerKind::NoteDebounce).unwrap();

        tokio::time::advance(Duration::from_secs(1)).await;
        timers.schedule(TimerKind::NoteDebounce, Duration::from_secs(2));

        assert_eq!(
            timers.deadline(TimerKind::NoteDebounce).unwrap() - first,
            Duration::from_secs(1)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_take_due_in_deadline_order() {
        let mut timers = Timers::new();
        timers.schedule(TimerKind::LockExpiry, Duration::from_secs(1));
        timers.schedule(TimerKind::Republish, Duration::from_secs(2));
        timers.schedule(TimerKind::NoteDebounce, Duration::from_secs(5));

        assert!(timers.take_due(Instant::now()).is_empty());

        tokio::time::advance(Duration::from_secs(3)).await;
        assert_eq!(
            timers.take_due(Instant::now()),
            vec![TimerKind::LockExpiry, TimerKind::Republish]
        );
        assert!(timers.is_pending(TimerKind::NoteDebounce));
        assert_eq!(
            timers.next_deadline(),
            timers.deadline(TimerKind::NoteDebounce)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel() {
        let mut timers = Timers::new();
        timers.schedule(TimerKind::LockExpiry, Duration::from_secs(1));
        timers.schedule(TimerKind::Republish, Duration::from_secs(1));

        timers.cancel(TimerKind::LockExpiry);
        assert!(!timers.is_pending(TimerKind::LockExpiry));

        timers.cancel_all();
        assert!(timers.is_empty());
        assert!(timers.next_deadline().is_none());
    }
}
