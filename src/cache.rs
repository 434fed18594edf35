//! The event cache facade tying recipients, listeners and eviction together.

use crate::error::{CacheError, Result};
use crate::eviction::IdleReaper;
use crate::recipients::RecipientState;
use crate::subscriptions::SubscriptionHandle;
use crate::types::{Event, EventId, ListenerId};
use crossbeam_channel::bounded;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Longest accepted idle lifetime.
pub const MAX_LIFE_TIME: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Cache configuration. Fixed for the lifetime of a cache.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a recipient may go without a push before its queue is
    /// cleared. Default: 5 minutes
    #[serde(rename = "life_time_ms", with = "duration_ms")]
    pub life_time: Duration,

    /// Maximum buffered events per recipient.
    /// Default: 50
    pub max_length: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            life_time: Duration::from_secs(5 * 60),
            max_length: 50,
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_length == 0 {
            return Err(CacheError::InvalidConfig(
                "max_length must be at least 1".to_string(),
            ));
        }
        if self.life_time > MAX_LIFE_TIME {
            return Err(CacheError::InvalidConfig(format!(
                "life_time must not exceed {}s",
                MAX_LIFE_TIME.as_secs()
            )));
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Outcome of [`EventCache::add_event_listener`].
#[derive(Debug, PartialEq)]
pub enum Listen<R> {
    /// Missed events were replayed synchronously. Carries the callback's
    /// return value; no listener was registered.
    Replayed(R),
    /// The callback will fire once, on the next push for the recipient.
    Registered(ListenerId),
}

impl<R> Listen<R> {
    /// Listener id, if the callback was registered for live delivery.
    pub fn listener_id(&self) -> Option<&ListenerId> {
        match self {
            Listen::Registered(id) => Some(id),
            Listen::Replayed(_) => None,
        }
    }
}

type SharedRecipient = Arc<Mutex<RecipientState>>;

/// In-process, per-recipient event buffer.
///
/// Provides:
/// - Pushing events to a recipient, notifying its pending listeners
/// - Catch-up replay of events after a last-seen id
/// - Single-use listener registration and removal
/// - Idle clearing of recipient queues
///
/// Construct one per process and share it (e.g. behind an `Arc`) with every
/// producer and transport handler.
pub struct EventCache<K> {
    config: CacheConfig,

    /// Recipient states, created on first touch and never removed.
    recipients: RwLock<HashMap<K, SharedRecipient>>,

    reaper: IdleReaper,
}

impl<K> EventCache<K>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    /// Create a cache and start its idle reaper.
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        let reaper = IdleReaper::start()?;

        Ok(Self {
            config,
            recipients: RwLock::new(HashMap::new()),
            reaper,
        })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Look up a recipient, creating its state on first touch.
    fn recipient(&self, key: &K) -> SharedRecipient {
        if let Some(state) = self.recipients.read().get(key) {
            return Arc::clone(state);
        }

        let mut recipients = self.recipients.write();
        let state = recipients.entry(key.clone()).or_insert_with(|| {
            debug!(recipient = ?key, "created recipient state");
            Arc::new(Mutex::new(RecipientState::new(self.config.max_length)))
        });
        Arc::clone(state)
    }

    fn existing(&self, key: &K) -> Option<SharedRecipient> {
        self.recipients.read().get(key).map(Arc::clone)
    }

    /// Apply any overdue idle eviction.
    fn refresh(key: &K, state: &mut RecipientState, now: Instant) {
        let dropped = state.refresh(now);
        if dropped > 0 {
            trace!(recipient = ?key, dropped, "discarded stale events on access");
        }
    }

    // --- Producer API ---

    /// Push an event to `recipient`.
    ///
    /// The event is buffered (dropping the oldest if the queue is full), the
    /// recipient's idle timer is rearmed, and every pending listener is
    /// invoked with just this event and then forgotten.
    pub fn push(
        &self,
        recipient: &K,
        event_type: impl Into<String>,
        data: serde_json::Value,
    ) -> EventId {
        let event = Arc::new(Event::new(event_type, data));
        let state = self.recipient(recipient);
        let now = Instant::now();

        let pushed = {
            let mut guard = state.lock();
            Self::refresh(recipient, &mut *guard, now);
            let pushed = guard.push(Arc::clone(&event), now + self.config.life_time);
            if let Some(timer) = pushed.schedule {
                self.reaper.schedule(timer, &state);
            }
            pushed
        };

        if let Some(evicted) = &pushed.evicted {
            trace!(recipient = ?recipient, evicted = %evicted.id, "queue full, dropped oldest event");
        }
        debug!(
            recipient = ?recipient,
            event = %event.id,
            event_type = %event.event_type,
            listeners = pushed.notify.len(),
            "pushed event"
        );

        // Listeners were taken under the lock; invoke them outside it so a
        // callback can re-register.
        for (_, listener) in pushed.notify {
            listener(vec![Arc::clone(&event)]);
        }

        event.id.clone()
    }

    // --- Consumer API ---

    /// Listen for events for `recipient`.
    ///
    /// When `last_event_id` is still buffered and is not the newest event,
    /// `callback` is invoked right away with every event after it and its
    /// result is returned as [`Listen::Replayed`]. Otherwise (no id, unknown
    /// or evicted id, or nothing newer) the callback is registered to fire
    /// once on the next push, and [`Listen::Registered`] carries its id.
    pub fn add_event_listener<F, R>(
        &self,
        recipient: &K,
        callback: F,
        last_event_id: Option<&EventId>,
    ) -> Listen<R>
    where
        F: FnOnce(Vec<Arc<Event>>) -> R + Send + 'static,
        R: 'static,
    {
        let state = self.recipient(recipient);
        let mut guard = state.lock();
        Self::refresh(recipient, &mut *guard, Instant::now());

        if let Some(missed) = last_event_id.and_then(|last| guard.replay_after(last)) {
            drop(guard);
            debug!(recipient = ?recipient, replayed = missed.len(), "catch-up replay");
            return Listen::Replayed(callback(missed));
        }

        let id = guard.add_listener(Box::new(move |events| {
            let _ = callback(events);
        }));
        trace!(recipient = ?recipient, listener = %id, "registered listener");
        Listen::Registered(id)
    }

    /// Cancel a pending listener. Unknown recipients or ids are a no-op.
    /// Returns whether a listener was removed.
    pub fn remove_event_listener(&self, recipient: &K, listener_id: &ListenerId) -> bool {
        let state = self.recipient(recipient);
        let mut guard = state.lock();
        Self::refresh(recipient, &mut *guard, Instant::now());

        let removed = guard.remove_listener(listener_id);
        if removed {
            trace!(recipient = ?recipient, listener = %listener_id, "removed listener");
        }
        removed
    }

    /// Channel-backed variant of [`add_event_listener`](Self::add_event_listener).
    ///
    /// The returned handle yields exactly one batch: the replayed events, or
    /// the next pushed event.
    pub fn subscribe(&self, recipient: &K, last_event_id: Option<&EventId>) -> SubscriptionHandle {
        let (sender, receiver) = bounded(1);
        let listen = self.add_event_listener(
            recipient,
            move |events| {
                // The receiver may already be gone; nothing to deliver to.
                let _ = sender.try_send(events);
            },
            last_event_id,
        );

        SubscriptionHandle {
            listener_id: listen.listener_id().cloned(),
            receiver,
        }
    }

    // --- Introspection ---

    /// Number of recipients ever touched.
    pub fn recipient_count(&self) -> usize {
        self.recipients.read().len()
    }

    /// Buffered event count. Does not create state for unknown recipients.
    pub fn queue_len(&self, recipient: &K) -> usize {
        self.with_existing(recipient, |state| state.queue().len())
            .unwrap_or(0)
    }

    /// Pending listener count.
    pub fn listener_count(&self, recipient: &K) -> usize {
        self.with_existing(recipient, |state| state.listeners().len())
            .unwrap_or(0)
    }

    /// Snapshot of the buffered events, oldest first.
    pub fn buffered(&self, recipient: &K) -> Vec<Arc<Event>> {
        self.with_existing(recipient, |state| state.queue().snapshot())
            .unwrap_or_default()
    }

    fn with_existing<T>(&self, recipient: &K, f: impl FnOnce(&RecipientState) -> T) -> Option<T> {
        let state = self.existing(recipient)?;
        let mut guard = state.lock();
        Self::refresh(recipient, &mut *guard, Instant::now());
        Some(f(&*guard))
    }
}

impl<K> fmt::Debug for EventCache<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventCache")
            .field("config", &self.config)
            .field("recipients", &self.recipients.read().len())
            .finish()
    }
}
