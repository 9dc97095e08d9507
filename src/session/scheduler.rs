//! Timer queue driving combat turns
//!
//! Each (actor, kind) key holds at most one pending entry. Scheduling a key
//! again supersedes the earlier entry; superseded entries stay in the heap and
//! are skipped when they surface.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use ahash::AHashMap;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::types::{CombatantId, Seconds};

/// What a timer is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScheduleKind {
    /// The combatant's next combat decision
    CombatTurn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScheduleKey {
    pub actor: CombatantId,
    pub kind: ScheduleKind,
}

impl ScheduleKey {
    pub fn turn(actor: CombatantId) -> Self {
        Self {
            actor,
            kind: ScheduleKind::CombatTurn,
        }
    }
}

/// Timer service the engine drives turns with
pub trait Scheduler {
    fn now(&self) -> Seconds;

    /// Schedule `key` to fire `delay` seconds from now, replacing any pending entry
    fn add_schedule(&mut self, key: ScheduleKey, delay: Seconds);

    /// Push a pending entry back by `delay`, or schedule it if none is pending
    fn add_or_delay_schedule(&mut self, key: ScheduleKey, delay: Seconds);

    /// Cancel a pending entry; false if nothing was pending
    fn destroy(&mut self, key: ScheduleKey) -> bool;

    /// When `key` is due, if pending
    fn pending(&self, key: ScheduleKey) -> Option<Seconds>;

    /// Earliest pending due time
    fn next_due(&self) -> Option<Seconds>;

    /// Pop the earliest entry due at or before `until`, advancing the clock to it
    fn pop_due(&mut self, until: Seconds) -> Option<(ScheduleKey, Seconds)>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
struct Timer {
    due: OrderedFloat<f64>,
    seq: u64,
    key: ScheduleKey,
}

impl PartialEq for Timer {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Timer {}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timer {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.due.cmp(&other.due) {
            Ordering::Equal => self.seq.cmp(&other.seq),
            o => o,
        }
    }
}

/// Binary-heap scheduler with lazy removal of superseded entries
#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<Timer>>,
    /// Live entry per key: (seq, due)
    live: AHashMap<ScheduleKey, (u64, Seconds)>,
    now: Seconds,
    seq: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn schedule_at(&mut self, key: ScheduleKey, due: Seconds) {
        let seq = self.seq;
        self.seq = self.seq.saturating_add(1);
        self.live.insert(key, (seq, due));
        self.heap.push(Reverse(Timer {
            due: OrderedFloat(due),
            seq,
            key,
        }));
    }

    fn is_live(&self, timer: &Timer) -> bool {
        self.live
            .get(&timer.key)
            .is_some_and(|(seq, _)| *seq == timer.seq)
    }

    /// Drop superseded entries sitting at the top of the heap
    fn discard_stale(&mut self) {
        while let Some(Reverse(top)) = self.heap.peek() {
            if self.is_live(top) {
                break;
            }
            self.heap.pop();
        }
    }
}

impl Scheduler for TimerQueue {
    fn now(&self) -> Seconds {
        self.now
    }

    fn add_schedule(&mut self, key: ScheduleKey, delay: Seconds) {
        self.schedule_at(key, self.now + delay.max(0.0));
    }

    fn add_or_delay_schedule(&mut self, key: ScheduleKey, delay: Seconds) {
        let due = match self.live.get(&key) {
            Some((_, due)) => due + delay.max(0.0),
            None => self.now + delay.max(0.0),
        };
        self.schedule_at(key, due);
    }

    fn destroy(&mut self, key: ScheduleKey) -> bool {
        self.live.remove(&key).is_some()
    }

    fn pending(&self, key: ScheduleKey) -> Option<Seconds> {
        self.live.get(&key).map(|(_, due)| *due)
    }

    fn next_due(&self) -> Option<Seconds> {
        self.live.values().map(|(_, due)| OrderedFloat(*due)).min().map(|d| d.0)
    }

    fn pop_due(&mut self, until: Seconds) -> Option<(ScheduleKey, Seconds)> {
        self.discard_stale();
        let Reverse(top) = self.heap.peek()?;
        if top.due.0 > until {
            return None;
        }
        let Reverse(timer) = self.heap.pop()?;
        self.live.remove(&timer.key);
        self.now = self.now.max(timer.due.0);
        Some((timer.key, timer.due.0))
    }

    fn len(&self) -> usize {
        self.live.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(id: u64) -> ScheduleKey {
        ScheduleKey::turn(CombatantId(id))
    }

    #[test]
    fn test_pops_in_due_order() {
        let mut queue = TimerQueue::new();
        queue.add_schedule(key(1), 3.0);
        queue.add_schedule(key(2), 1.0);
        queue.add_schedule(key(3), 2.0);
        assert_eq!(queue.pop_due(f64::MAX), Some((key(2), 1.0)));
        assert_eq!(queue.now(), 1.0);
        assert_eq!(queue.pop_due(f64::MAX), Some((key(3), 2.0)));
        assert_eq!(queue.pop_due(f64::MAX), Some((key(1), 3.0)));
        assert!(queue.pop_due(f64::MAX).is_none());
    }

    #[test]
    fn test_reschedule_supersedes() {
        let mut queue = TimerQueue::new();
        queue.add_schedule(key(1), 1.0);
        queue.add_schedule(key(1), 5.0);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.pending(key(1)), Some(5.0));
        assert_eq!(queue.pop_due(f64::MAX), Some((key(1), 5.0)));
        assert!(queue.pop_due(f64::MAX).is_none());
    }

    #[test]
    fn test_destroy_cancels() {
        let mut queue = TimerQueue::new();
        queue.add_schedule(key(1), 1.0);
        queue.add_schedule(key(2), 2.0);
        assert!(queue.destroy(key(1)));
        assert!(!queue.destroy(key(1)));
        assert_eq!(queue.next_due(), Some(2.0));
        assert_eq!(queue.pop_due(f64::MAX).map(|(k, _)| k), Some(key(2)));
    }

    #[test]
    fn test_delay_pushes_back_pending_entry() {
        let mut queue = TimerQueue::new();
        queue.add_schedule(key(1), 2.0);
        queue.add_or_delay_schedule(key(1), 1.5);
        assert_eq!(queue.pending(key(1)), Some(3.5));
        queue.add_or_delay_schedule(key(2), 1.0);
        assert_eq!(queue.pending(key(2)), Some(1.0));
    }

    #[test]
    fn test_pop_respects_limit() {
        let mut queue = TimerQueue::new();
        queue.add_schedule(key(1), 4.0);
        assert!(queue.pop_due(3.0).is_none());
        assert_eq!(queue.now(), 0.0);
        assert!(queue.pop_due(4.0).is_some());
    }

    #[test]
    fn test_equal_due_times_fire_in_insertion_order() {
        let mut queue = TimerQueue::new();
        queue.add_schedule(key(7), 1.0);
        queue.add_schedule(key(3), 1.0);
        assert_eq!(queue.pop_due(f64::MAX).map(|(k, _)| k), Some(key(7)));
        assert_eq!(queue.pop_due(f64::MAX).map(|(k, _)| k), Some(key(3)));
    }
}
