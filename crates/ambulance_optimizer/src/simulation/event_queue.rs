use std::{cmp::Reverse, collections::BinaryHeap};

use jiff::civil::DateTime;

use crate::error::SimulationError;

use super::event::Event;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledEvent {
    pub time: DateTime,
    sequence: u64,
    pub event: Event,
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.time
            .cmp(&other.time)
            .then(self.sequence.cmp(&other.sequence))
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Min-queue of events by time, events at the same time pop in insertion order.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Reverse<ScheduledEvent>>,
    next_sequence: u64,
    last_popped: Option<DateTime>,
}

impl EventQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
            next_sequence: 0,
            last_popped: None,
        }
    }

    pub fn push(&mut self, time: DateTime, event: Event) {
        self.heap.push(Reverse(ScheduledEvent {
            time,
            sequence: self.next_sequence,
            event,
        }));
        self.next_sequence += 1;
    }

    /// Fails when the next event precedes the last popped one.
    pub fn pop(&mut self) -> Result<Option<ScheduledEvent>, SimulationError> {
        let Some(Reverse(scheduled)) = self.heap.pop() else {
            return Ok(None);
        };

        if let Some(previous) = self.last_popped
            && scheduled.time < previous
        {
            return Err(SimulationError::EventOutOfOrder {
                previous,
                next: scheduled.time,
            });
        }

        self.last_popped = Some(scheduled.time);
        Ok(Some(scheduled))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
