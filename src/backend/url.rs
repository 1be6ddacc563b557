use crate::backend::store::{BackendStore, Diff, DiffValue, ExternalChange, ListenerGuard};
use crate::errors::BackendError;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tracing::debug;
use url::Url;

struct UrlInner {
    url: RwLock<Url>,
    listeners: Mutex<HashMap<usize, ExternalChange>>,
    next_listener_id: AtomicUsize,
}

/// A store that round-trips item values through a URL query string.
///
/// Each item key maps to one query parameter; the value is JSON-serialized
/// and percent-encoded by the `url` crate's query serializer, so
/// `read` after `write` yields the original value for every valid input.
/// Malformed query values read as absent, never as errors.
///
/// Clones share the same URL, so a handle can be kept for inspection and
/// [`UrlStore::navigate`] while another is registered with an item.
pub struct UrlStore {
    name: String,
    inner: Arc<UrlInner>,
}

impl UrlStore {
    /// Create a store backed by the given URL.
    pub fn new<N: Into<String>>(name: N, url: Url) -> Self {
        Self {
            name: name.into(),
            inner: Arc::new(UrlInner {
                url: RwLock::new(url),
                listeners: Mutex::new(HashMap::new()),
                next_listener_id: AtomicUsize::new(0),
            }),
        }
    }

    /// The current URL, query string included.
    pub fn current(&self) -> Url {
        self.inner.url.read().unwrap().clone()
    }

    /// Replace the URL from outside the synchronization subsystem,
    /// modeling an external navigation (another tab, a pasted link).
    ///
    /// Fires `listen` callbacks once per query parameter whose value
    /// changed; a removed or malformed parameter is reported as absent.
    pub fn navigate(&self, new_url: Url) {
        let old_params = {
            let mut url = self.inner.url.write().unwrap();
            let old = query_map(&url);
            *url = new_url.clone();
            old
        };
        let new_params = query_map(&new_url);

        let listeners: Vec<ExternalChange> = {
            let listeners = self.inner.listeners.lock().unwrap();
            listeners.values().cloned().collect()
        };

        let mut keys: Vec<&String> = old_params.keys().chain(new_params.keys()).collect();
        keys.sort();
        keys.dedup();

        for key in keys {
            if old_params.get(key) == new_params.get(key) {
                continue;
            }
            let value = new_params.get(key).and_then(|raw| parse_param(key, raw));
            for listener in &listeners {
                listener(Some(key.as_str()), value.as_ref());
            }
        }
    }
}

impl Clone for UrlStore {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl BackendStore for UrlStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn read(&self, item_key: &str) -> Result<Option<Value>, BackendError> {
        let url = self.inner.url.read().unwrap();
        let raw = url
            .query_pairs()
            .find(|(key, _)| key == item_key)
            .map(|(_, value)| value.into_owned());

        Ok(raw.and_then(|raw| parse_param(item_key, &raw)))
    }

    fn write(&self, diff: &Diff) -> Result<(), BackendError> {
        let mut url = self.inner.url.write().unwrap();
        let mut params = query_map(&url);

        for (key, entry) in diff {
            match entry {
                DiffValue::Set(value) => {
                    params.insert(key.clone(), serde_json::to_string(value)?);
                }
                DiffValue::Reset => {
                    params.remove(key);
                }
            }
        }

        if params.is_empty() {
            url.set_query(None);
        } else {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            for (key, value) in &params {
                pairs.append_pair(key, value);
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

fn query_map(url: &Url) -> BTreeMap<String, String> {
    url.query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

/// Decode one query parameter as JSON. Malformed values are absent, not errors.
fn parse_param(item_key: &str, raw: &str) -> Option<Value> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(err) => {
            debug!(key = item_key, %err, "ignoring malformed query value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> UrlStore {
        UrlStore::new("url", Url::parse("https://example.com/app").unwrap())
    }

    fn write_one(store: &UrlStore, key: &str, entry: DiffValue) {
        let mut diff = Diff::new();
        diff.insert(key.to_string(), entry);
        store.write(&diff).unwrap();
    }

    #[test]
    fn round_trips_nested_objects() {
        let store = store();
        let value = json!({"name": "n", "nested": {"description": "", "count": 3}});

        write_one(&store, "profile", DiffValue::Set(value.clone()));
        assert_eq!(store.read("profile").unwrap(), Some(value));
    }

    #[test]
    fn round_trips_empty_strings() {
        let store = store();
        write_one(&store, "profile", DiffValue::Set(json!("")));
        assert_eq!(store.read("profile").unwrap(), Some(json!("")));
    }

    #[test]
    fn absent_param_reads_as_none() {
        assert_eq!(store().read("profile").unwrap(), None);
    }

    #[test]
    fn malformed_param_reads_as_none() {
        let url = Url::parse("https://example.com/app?profile=%7Bnot-json").unwrap();
        let store = UrlStore::new("url", url);
        assert_eq!(store.read("profile").unwrap(), None);
    }

    #[test]
    fn reset_removes_the_parameter() {
        let store = store();
        write_one(&store, "profile", DiffValue::Set(json!("x")));
        write_one(&store, "profile", DiffValue::Reset);

        assert_eq!(store.read("profile").unwrap(), None);
        assert_eq!(store.current().query(), None);
    }

    #[test]
    fn untouched_params_survive_writes() {
        let url = Url::parse("https://example.com/app?other=1").unwrap();
        let store = UrlStore::new("url", url);

        write_one(&store, "profile", DiffValue::Set(json!("x")));

        let query = query_map(&store.current());
        assert_eq!(query.get("other").map(String::as_str), Some("1"));
        assert_eq!(query.get("profile").map(String::as_str), Some("\"x\""));
    }

    #[test]
    fn navigate_reports_changed_params() {
        let store = store();
        let seen: Arc<Mutex<Vec<(String, Option<Value>)>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let _guard = store.listen(Arc::new(move |key, value| {
            seen_clone
                .lock()
                .unwrap()
                .push((key.unwrap_or("").to_string(), value.cloned()));
        }));

        let next = Url::parse("https://example.com/app?profile=%22pushed%22").unwrap();
        store.navigate(next);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0], ("profile".to_string(), Some(json!("pushed"))));
    }

    #[test]
    fn navigate_reports_removed_params_as_absent() {
        let url = Url::parse("https://example.com/app?profile=%22x%22").unwrap();
        let store = UrlStore::new("url", url);
        let seen: Arc<Mutex<Vec<Option<Value>>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let _guard = store.listen(Arc::new(move |_, value| {
            seen_clone.lock().unwrap().push(value.cloned());
        }));

        store.navigate(Url::parse("https://example.com/app").unwrap());

        let seen = seen.lock().unwrap();
        assert_eq!(seen.as_slice(), &[None]);
    }
}
