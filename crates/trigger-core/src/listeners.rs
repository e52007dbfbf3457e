//! Zone Listeners
//!
//! Per-zone multicast lists of callbacks. Each registration hands back a
//! generational key so it can be revoked later without touching the other
//! listeners of the zone.

use slotmap::{new_key_type, SlotMap};
use trigger_events::{TriggerEvent, ZoneId};

/// Callback invoked with every Entering/Leaving event of a zone.
pub type Listener = Box<dyn FnMut(&TriggerEvent)>;

new_key_type! {
    /// Handle of one registered listener within its zone.
    pub struct ListenerKey;
}

/// Revocation token returned by `TriggerSystem::add_callback`.
///
/// A connection names the build it was made in; once that build is destroyed
/// the token no longer matches anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    pub(crate) zone: ZoneId,
    pub(crate) key: ListenerKey,
    pub(crate) build: u64,
}

impl Connection {
    pub fn zone(&self) -> ZoneId {
        self.zone
    }
}

/// The listeners registered on one zone.
#[derive(Default)]
pub struct ListenerList {
    listeners: SlotMap<ListenerKey, Listener>,
    /// Live keys in registration order
    order: Vec<ListenerKey>,
}

impl ListenerList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, listener: Listener) -> ListenerKey {
        let key = self.listeners.insert(listener);
        self.order.push(key);
        key
    }

    /// Removes a listener. Returns false for stale or unknown keys.
    pub fn disconnect(&mut self, key: ListenerKey) -> bool {
        if self.listeners.remove(key).is_none() {
            return false;
        }
        self.order.retain(|&k| k != key);
        true
    }

    /// Calls every live listener in registration order.
    pub fn dispatch(&mut self, event: &TriggerEvent) {
        for &key in &self.order {
            if let Some(listener) = self.listeners.get_mut(key) {
                listener(event);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for ListenerList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerList")
            .field("live", &self.len())
            .finish()
    }
}
