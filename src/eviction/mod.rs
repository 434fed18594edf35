//! Idle eviction of recipient queues.
//!
//! Each recipient holds at most one [`EvictionTimer`]; every push replaces
//! it. A single [`IdleReaper`] thread per cache watches the deadlines and
//! clears a recipient's queue once its current timer expires. Listener sets
//! and recipient entries are never touched by eviction.

mod reaper;
mod timer;

pub use reaper::IdleReaper;
pub use timer::{EvictionTimer, TimerOutcome};
