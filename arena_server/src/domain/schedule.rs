// Scheduled-event table drained by the match loop.
//
// Timers are never cancelled. Each one carries enough context (ids, epochs)
// for its handler to notice it has gone stale and do nothing.

use super::{EntityId, PlayerId};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    Fuse { bomb_id: EntityId },
    ExplosionExpired { explosion_id: EntityId },
    BoostExpired { player_id: PlayerId, epoch: u64 },
    Respawn { player_id: PlayerId, life_epoch: u64 },
    CoinSpawn { generation: u64 },
    ShrinkStep,
}

#[derive(Debug)]
struct Scheduled<T> {
    at: f64,
    // Insertion order breaks ties so timers due together fire FIFO.
    seq: u64,
    timer: T,
}

impl<T> PartialEq for Scheduled<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Scheduled<T> {}

impl<T> PartialOrd for Scheduled<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Scheduled<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at
            .total_cmp(&other.at)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Min-heap of timers keyed by fire time (seconds of simulation time).
#[derive(Debug)]
pub struct Scheduler<T> {
    queue: BinaryHeap<Reverse<Scheduled<T>>>,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self {
            queue: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, at: f64, timer: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Scheduled { at, seq, timer }));
    }

    /// Pops the earliest timer whose fire time is `<= now`.
    pub fn pop_due(&mut self, now: f64) -> Option<T> {
        let due = self
            .queue
            .peek()
            .is_some_and(|Reverse(next)| next.at <= now);
        if !due {
            return None;
        }
        self.queue.pop().map(|Reverse(s)| s.timer)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pops_in_time_order_then_fifo() {
        let mut s = Scheduler::new();
        s.schedule(2.0, "late");
        s.schedule(1.0, "first");
        s.schedule(1.0, "second");

        assert_eq!(s.pop_due(0.5), None);
        assert_eq!(s.pop_due(1.0), Some("first"));
        assert_eq!(s.pop_due(1.0), Some("second"));
        assert_eq!(s.pop_due(1.5), None);
        assert_eq!(s.pop_due(5.0), Some("late"));
        assert!(s.is_empty());
    }

    #[test]
    fn timers_scheduled_while_draining_fire_in_the_same_pass() {
        let mut s = Scheduler::new();
        s.schedule(1.0, 1);

        let mut fired = Vec::new();
        while let Some(t) = s.pop_due(1.0) {
            fired.push(t);
            if t == 1 {
                s.schedule(1.0, 2);
            }
        }

        assert_eq!(fired, vec![1, 2]);
    }
}
