//! Listener dispatch registry.
//!
//! One registry exists per native object class (media, media player,
//! renderer discoverer), owned by the [`crate::Instance`] and handed to the
//! wrappers that need it. It maps a native object to the ordered list of
//! listeners registered for it and fans native callbacks out to them.
//!
//! Native callbacks arrive on threads owned by libvlc, concurrently with
//! caller threads registering and unregistering listeners. Dispatch takes a
//! snapshot of the listener list under a read lock and invokes listeners
//! outside of it, so registration edits never block on a slow listener and
//! become visible to the next dispatch rather than the one in flight.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use parking_lot::RwLock;

/// Identity of a native object, derived from its handle address.
///
/// The registry never dereferences handles, so a key stays usable (and
/// removable) even while the owning wrapper is being torn down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

impl ObjectId {
    pub(crate) fn from_ptr<T>(ptr: *const T) -> Self {
        ObjectId(ptr as usize)
    }
}

/// Ordered, identity-keyed listener registry for one object class.
pub struct EventRegistry<L: ?Sized> {
    listeners: RwLock<HashMap<ObjectId, Vec<Arc<L>>>>,
}

impl<L: ?Sized> EventRegistry<L> {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
        }
    }

    /// Appends a listener for `id`. Duplicate registrations are allowed and
    /// each one is invoked separately, in registration order.
    pub fn register(&self, id: ObjectId, listener: Arc<L>) {
        let mut map = self.listeners.write();
        let entry = map.entry(id).or_default();
        entry.push(listener);
        tracing::debug!(?id, count = entry.len(), "listener registered");
    }

    /// Removes the first registration of `listener` (by `Arc` identity).
    /// No-op if the listener is not registered for `id`.
    pub fn unregister(&self, id: ObjectId, listener: &Arc<L>) {
        let mut map = self.listeners.write();
        if let Some(entry) = map.get_mut(&id) {
            if let Some(pos) = entry.iter().position(|l| Arc::ptr_eq(l, listener)) {
                entry.remove(pos);
                tracing::debug!(?id, count = entry.len(), "listener unregistered");
            }
            if entry.is_empty() {
                map.remove(&id);
            }
        }
    }

    /// Drops every registration for `id`. Called when the owning wrapper
    /// releases its native handle.
    pub fn remove_object(&self, id: ObjectId) {
        if self.listeners.write().remove(&id).is_some() {
            tracing::debug!(?id, "all listeners removed");
        }
    }

    /// Number of current registrations for `id`.
    pub fn listener_count(&self, id: ObjectId) -> usize {
        self.listeners.read().get(&id).map_or(0, Vec::len)
    }

    /// Invokes `notify` for every listener registered for `id`, in
    /// registration order, synchronously on the calling thread.
    ///
    /// A panicking listener is isolated and logged; listeners after it in
    /// the same dispatch still run. Zero registered listeners is a legal,
    /// silent no-op.
    pub fn dispatch<E>(&self, id: ObjectId, event: &E, notify: impl Fn(&L, &E)) {
        let snapshot: Vec<Arc<L>> = match self.listeners.read().get(&id) {
            Some(entry) => entry.clone(),
            None => return,
        };
        for listener in &snapshot {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| notify(listener, event)));
            if outcome.is_err() {
                tracing::error!(?id, "event listener panicked; continuing with remaining listeners");
            }
        }
    }
}

impl<L: ?Sized> Default for EventRegistry<L> {
    fn default() -> Self {
        Self::new()
    }
}
