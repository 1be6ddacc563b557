use crate::backend::store::{BackendStore, Diff, DiffValue, ExternalChange, ListenerGuard};
use crate::errors::BackendError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

struct RemoteInner {
    initial: Value,
    slot: RwLock<Value>,
    listeners: Mutex<HashMap<usize, ExternalChange>>,
    next_listener_id: AtomicUsize,
}

/// An in-memory mock of a remote key-value service.
///
/// Holds a single slot: reads answer with whatever was last written, or the
/// construction-time value. There is no network, no persistence, and no
/// retry; the store exists so the synchronization path can be exercised
/// end to end.
///
/// Two mutation paths are deliberately distinct:
/// - [`BackendStore::write`] is the synchronization path; it updates the slot
///   silently.
/// - [`RemoteStore::set`] models an out-of-process change (another client
///   pushing data) and fires `listen` callbacks.
///
/// Clones share the same slot, so a handle can be kept for external mutation
/// while another is registered with an item.
pub struct RemoteStore {
    name: String,
    inner: Arc<RemoteInner>,
}

impl RemoteStore {
    /// Create a store seeded with an initial value.
    pub fn new<N: Into<String>>(name: N, initial: Value) -> Self {
        Self {
            name: name.into(),
            inner: Arc::new(RemoteInner {
                slot: RwLock::new(initial.clone()),
                initial,
                listeners: Mutex::new(HashMap::new()),
                next_listener_id: AtomicUsize::new(0),
            }),
        }
    }

    /// The current slot contents.
    pub fn get(&self) -> Value {
        self.inner.slot.read().unwrap().clone()
    }

    /// Replace the slot from outside the synchronization subsystem.
    ///
    /// Fires every registered `listen` callback with no item key (the slot is
    /// not keyed; listeners decide whether the value concerns them).
    pub fn set(&self, value: Value) {
        *self.inner.slot.write().unwrap() = value.clone();

        let listeners: Vec<ExternalChange> = {
            let listeners = self.inner.listeners.lock().unwrap();
            listeners.values().cloned().collect()
        };
        for listener in listeners {
            listener(None, Some(&value));
        }
    }
}

impl Clone for RemoteStore {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl BackendStore for RemoteStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self, _item_key: &str) -> Result<Option<Value>, BackendError> {
        // Single slot: every item key reads the same value. The item's
        // validator filters out shapes that don't belong to it.
        Ok(Some(self.inner.slot.read().unwrap().clone()))
    }

    fn write(&self, diff: &Diff) -> Result<(), BackendError> {
        for entry in diff.values() {
            let mut slot = self.inner.slot.write().unwrap();
            match entry {
                DiffValue::Set(value) => *slot = value.clone(),
                DiffValue::Reset => *slot = self.inner.initial.clone(),
            }
        }
        Ok(())
    }

    fn listen(&self, on_change: ExternalChange) -> Option<ListenerGuard> {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::SeqCst);
        self.inner.listeners.lock().unwrap().insert(id, on_change);

        let inner = Arc::downgrade(&self.inner);
        Some(ListenerGuard::new(move || {
            if let Some(inner) = inner.upgrade() {
                inner.listeners.lock().unwrap().remove(&id);
            }
        }))
    }
}
