//! Single-use listener registrations for a recipient.

use crate::types::{Event, ListenerId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Callback stored for a pending listener. Consumed by the push that
/// notifies it.
pub type ListenerFn = Box<dyn FnOnce(Vec<Arc<Event>>) + Send + 'static>;

/// Pending listeners keyed by id.
#[derive(Default)]
pub struct ListenerSet {
    listeners: HashMap<ListenerId, ListenerFn>,
}

impl ListenerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback under a fresh id.
    pub fn insert(&mut self, callback: ListenerFn) -> ListenerId {
        let id = ListenerId::generate();
        self.listeners.insert(id.clone(), callback);
        id
    }

    /// Remove a listener. Returns whether it was registered.
    pub fn remove(&mut self, id: &ListenerId) -> bool {
        self.listeners.remove(id).is_some()
    }

    /// Take every pending listener, leaving the set empty.
    pub fn drain(&mut self) -> Vec<(ListenerId, ListenerFn)> {
        self.listeners.drain().collect()
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.listeners.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> ListenerFn {
        Box::new(|_| {})
    }

    #[test]
    fn test_insert_remove() {
        let mut set = ListenerSet::new();
        let id = set.insert(noop());
        assert_eq!(set.len(), 1);

        assert!(set.remove(&id));
        assert!(!set.remove(&id));
        assert!(set.is_empty());
    }

    #[test]
    fn test_drain_empties_set() {
        let mut set = ListenerSet::new();
        let a = set.insert(noop());
        let b = set.insert(noop());
        assert_ne!(a, b);

        let drained = set.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(set.len(), 0);
    }
}
