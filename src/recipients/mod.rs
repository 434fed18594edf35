//! Per-recipient buffering.
//!
//! A recipient owns a bounded [`EventQueue`], a [`ListenerSet`] of single-use
//! callbacks and an idle-eviction timer, all inside one [`RecipientState`].

mod listeners;
mod queue;
mod state;

pub use listeners::{ListenerFn, ListenerSet};
pub use queue::EventQueue;
pub use state::RecipientState;
