//! Channel-based subscriptions for transports.
//!
//! Long-poll and SSE handlers usually want to block on (or select over) the
//! next batch rather than hand the cache a callback. A
//! [`SubscriptionHandle`] wraps a single-use listener around a
//! `crossbeam-channel` receiver:
//!
//! ```ignore
//! let handle = cache.subscribe(&user_id, last_event_id.as_ref());
//! match handle.recv_timeout(Duration::from_secs(25)) {
//!     Ok(batch) => respond(batch),
//!     Err(_) => {
//!         if let Some(id) = &handle.listener_id {
//!             cache.remove_event_listener(&user_id, id);
//!         }
//!     }
//! }
//! ```

mod handle;

pub use handle::{Batch, SubscriptionHandle};
