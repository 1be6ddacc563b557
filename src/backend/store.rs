use crate::errors::BackendError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// The set of item-key/value pairs pushed to backends on a state write.
pub type Diff = BTreeMap<String, DiffValue>;

/// A single diff entry: either a new raw value or an explicit reset.
///
/// Backends receiving [`DiffValue::Reset`] must treat it as the absence of an
/// override, not as literal data: the URL store removes the query parameter,
/// the remote store restores its construction-time value.
#[derive(Debug, Clone, PartialEq)]
pub enum DiffValue {
    /// Adopt this raw value for the item.
    Set(Value),
    /// Reset the item to its default; drop any stored override.
    Reset,
}

/// Callback invoked when a backend's underlying data changes for reasons
/// outside this process (another tab editing the URL, a remote push).
///
/// The first argument is the affected item key, or `None` when the change is
/// not attributable to a single key (the remote store's single slot). The
/// second is the new raw value, or `None` when the value was removed.
pub type ExternalChange = Arc<dyn Fn(Option<&str>, Option<&Value>) + Send + Sync>;

/// An external source of truth for one or more items.
///
/// Values cross this boundary as raw `serde_json::Value`s; shape validation
/// is the registry's job, not the store's.
pub trait BackendStore: Send + Sync {
    /// Stable identifier used in logs and error reports.
    fn name(&self) -> &str;

    /// Read the raw value for an item.
    ///
    /// "Not found" is `Ok(None)`, never an error. `Err` is reserved for hard
    /// failures (the store itself could not answer).
    fn read(&self, item_key: &str) -> Result<Option<Value>, BackendError>;

    /// Apply a diff to the store, best-effort.
    ///
    /// The default implementation ignores the diff, so read-only stores
    /// accept writes as a no-op without erroring.
    fn write(&self, _diff: &Diff) -> Result<(), BackendError> {
        Ok(())
    }

    /// Register a callback for externally-triggered changes.
    ///
    /// Stores without an external change source return `None` (the default).
    /// The returned guard cancels the registration when dropped.
    fn listen(&self, _on_change: ExternalChange) -> Option<ListenerGuard> {
        None
    }
}

/// RAII cancellation handle for a `listen` registration.
///
/// Dropping the guard releases the registration; the callback is never
/// invoked afterwards.
pub struct ListenerGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl ListenerGuard {
    /// Create a guard that runs `release` exactly once, on drop.
    pub fn new<F>(release: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            release: Some(Box::new(release)),
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}
