use crate::backend::{ExternalChange, ListenerGuard};
use crate::errors::SyncError;
use crate::sync::{self, Item};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, Weak};
use tracing::warn;

type Subscriber<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct AtomInner<T> {
    value: RwLock<T>,
    subscribers: RwLock<HashMap<usize, Subscriber<T>>>,
    next_subscriber_id: AtomicUsize,
}

impl<T: Clone> AtomInner<T> {
    fn notify(&self) {
        let value = self.value.read().unwrap().clone();
        let subscribers: Vec<Subscriber<T>> = {
            let subscribers = self.subscribers.read().unwrap();
            subscribers.values().cloned().collect()
        };
        for subscriber in subscribers {
            subscriber(&value);
        }
    }
}

/// An observable state container kept synchronized with an item's backends.
///
/// Construction seeds the in-memory value via the coordinator before any
/// reader can observe it, then registers a `listen` callback with every
/// backend that supports one. External changes are validated and, if valid,
/// adopted in memory and announced to subscribers; they are not committed
/// back (the data is already in its store of origin, writing it back would
/// only echo). Listener registrations are released when the last handle to
/// the atom is dropped.
///
/// Clones share the same value and subscriber list.
pub struct Atom<T> {
    item: Arc<Item<T>>,
    inner: Arc<AtomInner<T>>,
    _listeners: Arc<Vec<ListenerGuard>>,
}

impl<T: Clone + Send + Sync + 'static> Atom<T> {
    /// Create an atom for a declared item, seeding it from the item's
    /// backends in resolution order.
    pub fn new(item: Item<T>) -> Self {
        let seed = sync::resolve_initial(&item);
        let item = Arc::new(item);
        let inner = Arc::new(AtomInner {
            value: RwLock::new(seed),
            subscribers: RwLock::new(HashMap::new()),
            next_subscriber_id: AtomicUsize::new(0),
        });

        let mut listeners = Vec::new();
        for backend in item.backends() {
            let callback: ExternalChange = {
                let inner = Arc::clone(&inner);
                let item = Arc::clone(&item);
                let backend_name = backend.name().to_string();

                Arc::new(move |key, raw| {
                    if let Some(key) = key {
                        if key != item.key() {
                            return;
                        }
                    }
                    match raw {
                        Some(raw) => match item.validator().check(raw) {
                            Some(value) => {
                                *inner.value.write().unwrap() = value;
                                inner.notify();
                            }
                            None => {
                                let err = SyncError::Validation {
                                    backend: backend_name.clone(),
                                    key: item.key().to_string(),
                                };
                                warn!(%err, "ignoring external change");
                            }
                        },
                        // Value removed at the source: fall back to default.
                        None => {
                            *inner.value.write().unwrap() = item.default_value();
                            inner.notify();
                        }
                    }
                })
            };

            if let Some(guard) = backend.listen(callback) {
                listeners.push(guard);
            }
        }

        Self {
            item,
            inner,
            _listeners: Arc::new(listeners),
        }
    }

    /// The key of the item this atom synchronizes.
    pub fn key(&self) -> &str {
        self.item.key()
    }

    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.inner.value.read().unwrap().clone()
    }

    /// Read the value with a function without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let value = self.inner.value.read().unwrap();
        f(&value)
    }

    /// Set a new value, committing it to every registered backend.
    pub fn set(&self, new_value: T)
    where
        T: Serialize,
    {
        *self.inner.value.write().unwrap() = new_value.clone();
        sync::commit(&self.item, &new_value);
        self.inner.notify();
    }

    /// Update the value in place, then commit the result.
    pub fn update<F>(&self, f: F)
    where
        T: Serialize,
        F: FnOnce(&mut T),
    {
        let value = {
            let mut value = self.inner.value.write().unwrap();
            f(&mut value);
            value.clone()
        };
        sync::commit(&self.item, &value);
        self.inner.notify();
    }

    /// Restore the item's default and push an explicit reset to every
    /// backend, dropping their stored overrides.
    pub fn reset(&self) {
        *self.inner.value.write().unwrap() = self.item.default_value();
        sync::reset(&self.item);
        self.inner.notify();
    }

    /// Subscribe to value changes.
    ///
    /// The listener runs after every adopted change, local or external.
    /// Dropping the returned guard removes the subscription.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionGuard
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.inner.next_subscriber_id.fetch_add(1, Ordering::SeqCst);
        self.inner
            .subscribers
            .write()
            .unwrap()
            .insert(id, Arc::new(listener));

        let inner: Weak<AtomInner<T>> = Arc::downgrade(&self.inner);
        SubscriptionGuard {
            release: Some(Box::new(move || {
                if let Some(inner) = inner.upgrade() {
                    inner.subscribers.write().unwrap().remove(&id);
                }
            })),
        }
    }
}

impl<T> Clone for Atom<T> {
    fn clone(&self) -> Self {
        Self {
            item: Arc::clone(&self.item),
            inner: Arc::clone(&self.inner),
            _listeners: Arc::clone(&self._listeners),
        }
    }
}

/// RAII guard for atom subscriptions. Dropping it removes the listener.
pub struct SubscriptionGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}
