//! Per-recipient state: queue, pending listeners and idle timer together.

use super::listeners::{ListenerFn, ListenerSet};
use super::queue::EventQueue;
use crate::eviction::{EvictionTimer, TimerOutcome};
use crate::types::{Event, EventId, ListenerId};
use std::sync::Arc;
use std::time::Instant;

/// Everything the cache tracks for one recipient. Always guarded by the
/// recipient's mutex, so each public cache operation sees it atomically.
#[derive(Debug)]
pub struct RecipientState {
    queue: EventQueue,
    listeners: ListenerSet,
    timer: Option<EvictionTimer>,
    /// Generation of the reaper entry currently tracking this recipient.
    tracked_by: Option<u64>,
    generation: u64,
}

/// Result of appending an event.
pub(crate) struct Pushed {
    /// Listeners consumed by this push.
    pub notify: Vec<(ListenerId, ListenerFn)>,
    /// Event dropped to make room.
    pub evicted: Option<Arc<Event>>,
    /// Timer to hand to the reaper, when none is tracking this recipient yet.
    pub schedule: Option<EvictionTimer>,
}

impl RecipientState {
    pub fn new(max_length: usize) -> Self {
        Self {
            queue: EventQueue::new(max_length),
            listeners: ListenerSet::new(),
            timer: None,
            tracked_by: None,
            generation: 0,
        }
    }

    /// Clear the queue if its idle deadline passed before this access.
    /// Returns the number of events discarded.
    pub fn refresh(&mut self, now: Instant) -> usize {
        match self.timer {
            Some(timer) if timer.is_expired(now) => {
                let dropped = self.queue.len();
                self.queue.clear();
                self.timer = None;
                dropped
            }
            _ => 0,
        }
    }

    /// Append `event`, rearm the idle timer for `deadline` and take every
    /// pending listener.
    pub(crate) fn push(&mut self, event: Arc<Event>, deadline: Instant) -> Pushed {
        let evicted = self.queue.push(event);
        let schedule = self.rearm(deadline);
        Pushed {
            notify: self.listeners.drain(),
            evicted,
            schedule,
        }
    }

    fn rearm(&mut self, deadline: Instant) -> Option<EvictionTimer> {
        self.generation += 1;
        let timer = EvictionTimer {
            generation: self.generation,
            deadline,
        };
        self.timer = Some(timer);

        if self.tracked_by.is_some() {
            None
        } else {
            self.tracked_by = Some(timer.generation);
            Some(timer)
        }
    }

    /// Called by the reaper when the entry scheduled for generation `entry`
    /// comes due.
    pub fn on_timer_due(&mut self, entry: u64, now: Instant) -> TimerOutcome {
        if self.tracked_by != Some(entry) {
            return TimerOutcome::Stale;
        }
        match self.timer {
            Some(timer) if timer.is_expired(now) => {
                let dropped = self.queue.len();
                self.queue.clear();
                self.timer = None;
                self.tracked_by = None;
                TimerOutcome::Evicted(dropped)
            }
            Some(timer) => TimerOutcome::Rescheduled(timer.deadline),
            None => {
                self.tracked_by = None;
                TimerOutcome::Stale
            }
        }
    }

    /// Events buffered after `last_seen`, if there is anything to replay.
    pub fn replay_after(&self, last_seen: &EventId) -> Option<Vec<Arc<Event>>> {
        self.queue.events_after(last_seen)
    }

    pub fn add_listener(&mut self, callback: ListenerFn) -> ListenerId {
        self.listeners.insert(callback)
    }

    pub fn remove_listener(&mut self, id: &ListenerId) -> bool {
        self.listeners.remove(id)
    }

    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    pub fn listeners(&self) -> &ListenerSet {
        &self.listeners
    }

    pub fn timer(&self) -> Option<EvictionTimer> {
        self.timer
    }
}
