//! Discrete-event queue
//!
//! Min-heap of scheduled events keyed by `(event_time, insertion sequence)`.
//! The insertion sequence is the explicit tie-break: two events at the same
//! timestamp always pop in the order they were scheduled, which makes event
//! ordering — and therefore whole scenarios — deterministic for identical
//! seeds. Required for paired baseline/candidate comparison.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Events the simulator processes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimEvent {
    /// A passenger joins the queue at a stop; the handler schedules the
    /// chain's next arrival
    PassengerArrival { route_idx: usize, stop_pos: usize },

    /// A vehicle reaches its current stop: alight, board, dwell
    VehicleArrival { vehicle_idx: usize },

    /// A vehicle leaves its current stop toward the next one
    VehicleDeparture { vehicle_idx: usize },
}

/// An event with its scheduled time and tie-break sequence
#[derive(Debug, Clone)]
pub struct Scheduled {
    pub time_s: u64,
    pub seq: u64,
    pub event: SimEvent,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.time_s == other.time_s && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we need earliest-first
        (other.time_s, other.seq).cmp(&(self.time_s, self.seq))
    }
}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Priority queue of simulation events
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Scheduled>,
    next_seq: u64,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule an event at `time_s`
    pub fn push(&mut self, time_s: u64, event: SimEvent) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled { time_s, seq, event });
    }

    /// Pop the earliest event (ties by insertion order)
    pub fn pop(&mut self) -> Option<Scheduled> {
        self.heap.pop()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pops_in_time_order() {
        let mut queue = EventQueue::new();
        queue.push(30, SimEvent::VehicleArrival { vehicle_idx: 0 });
        queue.push(10, SimEvent::VehicleArrival { vehicle_idx: 1 });
        queue.push(20, SimEvent::VehicleArrival { vehicle_idx: 2 });

        let times: Vec<u64> = std::iter::from_fn(|| queue.pop().map(|s| s.time_s)).collect();
        assert_eq!(times, vec![10, 20, 30]);
    }

    #[test]
    fn test_simultaneous_events_pop_in_insertion_order() {
        let mut queue = EventQueue::new();
        for i in 0..10 {
            queue.push(100, SimEvent::VehicleArrival { vehicle_idx: i });
        }

        let order: Vec<usize> = std::iter::from_fn(|| {
            queue.pop().map(|s| match s.event {
                SimEvent::VehicleArrival { vehicle_idx } => vehicle_idx,
                _ => unreachable!(),
            })
        })
        .collect();

        assert_eq!(order, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_len_and_empty() {
        let mut queue = EventQueue::new();
        assert!(queue.is_empty());

        queue.push(5, SimEvent::PassengerArrival { route_idx: 0, stop_pos: 0 });
        assert_eq!(queue.len(), 1);

        queue.pop();
        assert!(queue.is_empty());
    }
}
