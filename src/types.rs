//! Core types for the event cache.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Microseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp(duration.as_micros() as i64)
    }

    /// Milliseconds since Unix epoch.
    pub fn as_millis(&self) -> i64 {
        self.0 / 1000
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// Time prefix plus random suffix, e.g. `1700000000000_9f0c...`.
fn generate_token(now: Timestamp) -> String {
    format!("{}_{}", now.as_millis(), Uuid::new_v4().simple())
}

/// Unique identifier for a buffered event.
///
/// Ids are not ordered; only a recipient's queue order is meaningful.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    /// Generate a fresh id.
    pub fn generate() -> Self {
        EventId(generate_token(Timestamp::now()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        EventId(s.to_string())
    }
}

impl From<String> for EventId {
    fn from(s: String) -> Self {
        EventId(s)
    }
}

/// Identifier for a registered listener, used to cancel it.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListenerId(pub String);

impl ListenerId {
    pub fn generate() -> Self {
        ListenerId(generate_token(Timestamp::now()))
    }
}

impl fmt::Debug for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerId({})", self.0)
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single buffered event. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier (assigned on push).
    pub id: EventId,

    /// Application-defined type tag (e.g., "message", "typing").
    #[serde(rename = "type")]
    pub event_type: String,

    /// Application-defined payload, never interpreted by the cache.
    pub data: serde_json::Value,

    /// When the event was pushed.
    pub timestamp: Timestamp,
}

impl Event {
    /// Create a new event with a freshly generated id.
    pub fn new(event_type: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            id: EventId::generate(),
            event_type: event_type.into(),
            data,
            timestamp: Timestamp::now(),
        }
    }
}
