//! # Event Cache
//!
//! An in-process, per-recipient event buffer for long-polling and
//! Server-Sent-Events endpoints: live push delivery to waiting listeners,
//! plus replay for consumers that reconnect after a gap.
//!
//! ## Core Concepts
//!
//! - **Recipients**: Opaque keys under which events are buffered
//! - **Queue**: Bounded, oldest-first; the oldest event is dropped when full
//! - **Listeners**: Single-use callbacks fired by the next push
//! - **Catch-up**: Synchronous replay of events after a last-seen id
//! - **Idle eviction**: A recipient's queue is cleared after a period
//!   without pushes
//!
//! ## Example
//!
//! ```ignore
//! use event_cache::{CacheConfig, EventCache, Listen};
//!
//! let cache: EventCache<u64> = EventCache::new(CacheConfig::default())?;
//!
//! // A transport handler waits for the next event for user 7
//! let listen = cache.add_event_listener(&7, |events| send_frames(events), last_event_id.as_ref());
//!
//! // A producer pushes; the waiting listener fires once with this event
//! cache.push(&7, "message", json!({ "text": "Hello" }));
//! ```

pub mod cache;
pub mod error;
pub mod eviction;
pub mod recipients;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use cache::{CacheConfig, EventCache, Listen, MAX_LIFE_TIME};
pub use error::{CacheError, Result};
pub use eviction::{EvictionTimer, IdleReaper};
pub use recipients::{EventQueue, ListenerSet, RecipientState};
pub use subscriptions::{Batch, SubscriptionHandle};
pub use types::*;
