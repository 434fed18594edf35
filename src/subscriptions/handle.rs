//! Channel-backed subscription handle.

use crate::types::{Event, ListenerId};
use crossbeam_channel::{Receiver, RecvError, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

/// A batch of events delivered to one listener.
pub type Batch = Vec<Arc<Event>>;

/// Handle returned by [`EventCache::subscribe`](crate::EventCache::subscribe).
///
/// Yields a single batch. When `listener_id` is `None` the batch (a
/// catch-up replay) is already waiting; otherwise it arrives with the next
/// push, and the id can be passed to `remove_event_listener` if the
/// consumer goes away first.
#[derive(Debug)]
pub struct SubscriptionHandle {
    pub listener_id: Option<ListenerId>,
    /// Channel to receive the batch.
    pub receiver: Receiver<Batch>,
}

impl SubscriptionHandle {
    /// Whether this handle waits for a live push rather than a replay.
    pub fn is_live(&self) -> bool {
        self.listener_id.is_some()
    }

    /// Receive the batch (blocking).
    pub fn recv(&self) -> Result<Batch, RecvError> {
        self.receiver.recv()
    }

    /// Try to receive the batch (non-blocking).
    pub fn try_recv(&self) -> Result<Batch, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Batch, RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}
