use crate::backend::store::BackendStore;
use crate::errors::BackendError;
use serde_json::Value;
use std::collections::BTreeMap;

/// A read-only store whose values are fixed at construction.
///
/// Models state handed in by the embedding environment (component properties,
/// launch configuration). Writes are accepted and ignored via the trait's
/// default no-op, so committing an item registered against a `PropsStore`
/// never errors.
pub struct PropsStore {
    name: String,
    props: BTreeMap<String, Value>,
}

impl PropsStore {
    /// Create a store from a set of item-key/value pairs.
    pub fn new<N, I>(name: N, props: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (String, Value)>,
    {
        Self {
            name: name.into(),
            props: props.into_iter().collect(),
        }
    }

    /// Convenience constructor for a store holding a single item.
    pub fn single<N, K>(name: N, item_key: K, value: Value) -> Self
    where
        N: Into<String>,
        K: Into<String>,
    {
        Self::new(name, [(item_key.into(), value)])
    }
}

impl BackendStore for PropsStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self, item_key: &str) -> Result<Option<Value>, BackendError> {
        Ok(self.props.get(item_key).cloned())
    }
}
