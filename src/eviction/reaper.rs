//! Background thread that clears idle recipient queues.

use super::timer::{EvictionTimer, TimerOutcome};
use crate::error::Result;
use crate::recipients::RecipientState;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::{Arc, Weak};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, trace};

/// A pending check of one recipient's idle deadline.
struct Scheduled {
    deadline: Instant,
    entry: u64,
    recipient: Weak<Mutex<RecipientState>>,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deadline
            .cmp(&other.deadline)
            .then(self.entry.cmp(&other.entry))
    }
}

/// Owns the reaper thread. Dropping it stops the thread.
pub struct IdleReaper {
    sender: Option<Sender<Scheduled>>,
    handle: Option<JoinHandle<()>>,
}

impl IdleReaper {
    /// Spawn the reaper thread.
    pub fn start() -> Result<Self> {
        let (sender, receiver) = unbounded();
        let handle = thread::Builder::new()
            .name("event-cache-reaper".to_string())
            .spawn(move || run(receiver))?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Ask the reaper to check `recipient` when `timer` comes due.
    pub fn schedule(&self, timer: EvictionTimer, recipient: &Arc<Mutex<RecipientState>>) {
        let scheduled = Scheduled {
            deadline: timer.deadline,
            entry: timer.generation,
            recipient: Arc::downgrade(recipient),
        };
        if let Some(sender) = &self.sender {
            // Only fails once the thread is gone, which happens on drop.
            let _ = sender.send(scheduled);
        }
    }
}

impl Drop for IdleReaper {
    fn drop(&mut self) {
        // Disconnecting the channel ends the loop.
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run(receiver: Receiver<Scheduled>) {
    let mut pending: BinaryHeap<Reverse<Scheduled>> = BinaryHeap::new();

    loop {
        let next_deadline = pending.peek().map(|Reverse(next)| next.deadline);
        let received = match next_deadline {
            Some(deadline) => {
                let now = Instant::now();
                if deadline <= now {
                    if let Some(Reverse(due)) = pending.pop() {
                        if let Some(again) = fire(due, now) {
                            pending.push(Reverse(again));
                        }
                    }
                    continue;
                }
                receiver.recv_timeout(deadline - now)
            }
            None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(scheduled) => pending.push(Reverse(scheduled)),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    trace!(abandoned = pending.len(), "idle reaper stopped");
}

/// Handle a due entry. Returns it again when the recipient was rearmed.
fn fire(due: Scheduled, now: Instant) -> Option<Scheduled> {
    let recipient = due.recipient.upgrade()?;
    let outcome = recipient.lock().on_timer_due(due.entry, now);

    match outcome {
        TimerOutcome::Evicted(dropped) => {
            debug!(dropped, "cleared idle recipient queue");
            None
        }
        TimerOutcome::Rescheduled(deadline) => Some(Scheduled { deadline, ..due }),
        TimerOutcome::Stale => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Event;
    use serde_json::json;
    use std::time::Duration;

    fn shared_with_event(deadline: Instant) -> (Arc<Mutex<RecipientState>>, EvictionTimer) {
        let state = Arc::new(Mutex::new(RecipientState::new(8)));
        let timer = state
            .lock()
            .push(Arc::new(Event::new("test", json!(1))), deadline)
            .schedule
            .unwrap();
        (state, timer)
    }

    #[test]
    fn test_reaper_clears_queue_after_deadline() {
        let reaper = IdleReaper::start().unwrap();
        let (state, timer) = shared_with_event(Instant::now() + Duration::from_millis(30));
        reaper.schedule(timer, &state);

        thread::sleep(Duration::from_millis(200));

        let state = state.lock();
        assert!(state.queue().is_empty());
        assert!(state.timer().is_none());
    }

    #[test]
    fn test_reaper_follows_rearmed_deadline() {
        let reaper = IdleReaper::start().unwrap();
        let (state, timer) = shared_with_event(Instant::now() + Duration::from_millis(30));
        reaper.schedule(timer, &state);

        // Rearm well past the first deadline.
        let rearm = state.lock().push(
            Arc::new(Event::new("test", json!(2))),
            Instant::now() + Duration::from_millis(400),
        );
        assert!(rearm.schedule.is_none());

        thread::sleep(Duration::from_millis(150));
        assert_eq!(state.lock().queue().len(), 2);

        thread::sleep(Duration::from_millis(500));
        assert!(state.lock().queue().is_empty());
    }

    #[test]
    fn test_reaper_ignores_dropped_recipient() {
        let reaper = IdleReaper::start().unwrap();
        let (state, timer) = shared_with_event(Instant::now());
        reaper.schedule(timer, &state);
        drop(state);

        thread::sleep(Duration::from_millis(50));
        drop(reaper);
    }
}
