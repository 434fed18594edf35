//! Idle-eviction timer handle stored per recipient.

use std::time::Instant;

/// The single pending idle eviction for a recipient. Rearming replaces it,
/// which cancels the previous one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EvictionTimer {
    /// Bumped on every rearm.
    pub generation: u64,
    /// When the recipient's queue is cleared unless rearmed first.
    pub deadline: Instant,
}

impl EvictionTimer {
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.deadline
    }
}

/// What the reaper should do after a scheduled entry comes due.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerOutcome {
    /// The queue was cleared; carries the number of events dropped.
    Evicted(usize),
    /// The timer was rearmed since scheduling; check again at this deadline.
    Rescheduled(Instant),
    /// The entry no longer tracks this recipient.
    Stale,
}
