//! Bounded, oldest-first event queue for a single recipient.

use crate::types::{Event, EventId};
use std::collections::VecDeque;
use std::sync::Arc;

/// Per-recipient event buffer. `push` enforces the capacity bound, so the
/// queue never holds more than `max_length` events.
#[derive(Debug)]
pub struct EventQueue {
    events: VecDeque<Arc<Event>>,
    max_length: usize,
}

impl EventQueue {
    pub fn new(max_length: usize) -> Self {
        Self {
            events: VecDeque::new(),
            max_length,
        }
    }

    /// Append an event, dropping the oldest first if the queue is full.
    /// Returns the dropped event, if any.
    pub fn push(&mut self, event: Arc<Event>) -> Option<Arc<Event>> {
        let evicted = if self.events.len() >= self.max_length {
            self.events.pop_front()
        } else {
            None
        };
        self.events.push_back(event);
        evicted
    }

    /// Events strictly after `last_seen`, or `None` when there is nothing
    /// to replay: the id is unknown (never seen or already evicted) or it
    /// names the newest event.
    pub fn events_after(&self, last_seen: &EventId) -> Option<Vec<Arc<Event>>> {
        let idx = self.events.iter().position(|e| &e.id == last_seen)?;
        if idx + 1 >= self.events.len() {
            return None;
        }
        Some(self.events.iter().skip(idx + 1).cloned().collect())
    }

    /// Discard every buffered event.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Snapshot of the buffered events, oldest first.
    pub fn snapshot(&self) -> Vec<Arc<Event>> {
        self.events.iter().cloned().collect()
    }
}
