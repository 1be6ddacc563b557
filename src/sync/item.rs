use crate::backend::BackendStore;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// A pure check turning a raw backend value into a validated `T`.
///
/// Returning `None` means the raw value does not have the item's shape; the
/// coordinator then treats the backend as absent and moves on.
pub struct Validator<T>(Arc<dyn Fn(&Value) -> Option<T> + Send + Sync>);

impl<T> Validator<T> {
    /// Wrap a custom validation function.
    pub fn new<F>(check: F) -> Self
    where
        F: Fn(&Value) -> Option<T> + Send + Sync + 'static,
    {
        Self(Arc::new(check))
    }

    /// Run the check against a raw value.
    pub fn check(&self, raw: &Value) -> Option<T> {
        (self.0)(raw)
    }
}

impl<T: DeserializeOwned> Validator<T> {
    /// The standard validator: accept exactly the values that deserialize
    /// into `T`.
    pub fn json() -> Self {
        Self::new(|raw| serde_json::from_value(raw.clone()).ok())
    }
}

impl<T> Clone for Validator<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

/// A named, independently synchronized piece of state.
///
/// Declared once at composition time and kept for the process lifetime. The
/// backend list is ordered: it is the fixed priority in which stores are
/// consulted to seed the initial value, and the order writes fan out in.
pub struct Item<T> {
    key: String,
    default: T,
    validator: Validator<T>,
    backends: Vec<Arc<dyn BackendStore>>,
}

impl<T> Item<T> {
    /// Start declaring an item with its key and default value.
    pub fn builder<K: Into<String>>(key: K, default: T) -> ItemBuilder<T> {
        ItemBuilder {
            key: key.into(),
            default,
            validator: None,
            backends: Vec::new(),
        }
    }

    /// The item's unique key.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub(crate) fn validator(&self) -> &Validator<T> {
        &self.validator
    }

    pub(crate) fn backends(&self) -> &[Arc<dyn BackendStore>] {
        &self.backends
    }
}

impl<T: Clone> Item<T> {
    /// A clone of the item's declared default.
    pub fn default_value(&self) -> T {
        self.default.clone()
    }
}

/// Builder collecting an item's validator and ordered backend list.
pub struct ItemBuilder<T> {
    key: String,
    default: T,
    validator: Option<Validator<T>>,
    backends: Vec<Arc<dyn BackendStore>>,
}

impl<T> ItemBuilder<T> {
    /// Use a custom validator instead of the standard serde one.
    pub fn validator(mut self, validator: Validator<T>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Append a backend store. Declaration order is resolution order.
    pub fn backend(mut self, store: Arc<dyn BackendStore>) -> Self {
        self.backends.push(store);
        self
    }
}

impl<T: DeserializeOwned> ItemBuilder<T> {
    /// Finish the declaration, falling back to [`Validator::json`] when no
    /// custom validator was supplied.
    pub fn build(self) -> Item<T> {
        Item {
            key: self.key,
            default: self.default,
            validator: self.validator.unwrap_or_else(Validator::json),
            backends: self.backends,
        }
    }
}
