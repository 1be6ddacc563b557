use crate::backend::{Diff, DiffValue};
use crate::errors::SyncError;
use crate::sync::item::Item;
use serde::Serialize;
use tracing::{debug, warn};

/// Resolve an item's initial value from its backends.
///
/// Backends are consulted in declaration order; the first that answers with
/// a present, valid value wins. Read failures and invalid values are both
/// treated as absent, so resolution degrades to the next backend and finally
/// to the item's declared default. No backend is mutated.
pub fn resolve_initial<T: Clone>(item: &Item<T>) -> T {
    for backend in item.backends() {
        match backend.read(item.key()) {
            Ok(Some(raw)) => {
                if let Some(value) = item.validator().check(&raw) {
                    debug!(backend = backend.name(), key = item.key(), "resolved initial value");
                    return value;
                }
                let err = SyncError::Validation {
                    backend: backend.name().to_string(),
                    key: item.key().to_string(),
                };
                warn!(%err, "treating invalid backend value as absent");
            }
            Ok(None) => {}
            Err(source) => {
                let err = SyncError::BackendUnavailable {
                    backend: backend.name().to_string(),
                    key: item.key().to_string(),
                    source,
                };
                warn!(%err, "treating unavailable backend as absent");
            }
        }
    }

    debug!(key = item.key(), "no backend answered; using default");
    item.default_value()
}

/// Push a new value to every backend registered for the item.
///
/// All backends receive the diff, in declaration order, regardless of
/// earlier failures; a failing backend is logged and skipped, never rolled
/// back or retried. A value that cannot be serialized aborts the commit
/// with a log line and leaves every backend untouched.
pub fn commit<T: Serialize>(item: &Item<T>, value: &T) {
    let raw = match serde_json::to_value(value) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(key = item.key(), %err, "value not serializable; commit dropped");
            return;
        }
    };
    fan_out(item, DiffValue::Set(raw));
}

/// Push an explicit reset-to-default to every backend registered for the
/// item. Backends drop their stored override rather than storing a literal.
pub fn reset<T>(item: &Item<T>) {
    fan_out(item, DiffValue::Reset);
}

fn fan_out<T>(item: &Item<T>, entry: DiffValue) {
    let mut diff = Diff::new();
    diff.insert(item.key().to_string(), entry);

    for backend in item.backends() {
        if let Err(source) = backend.write(&diff) {
            let err = SyncError::WriteFailure {
                backend: backend.name().to_string(),
                key: item.key().to_string(),
                source,
            };
            warn!(%err, "continuing write fan-out");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendStore, PropsStore, RemoteStore};
    use crate::errors::BackendError;
    use serde::{Deserialize, Serialize};
    use serde_json::{json, Value};
    use std::sync::Arc;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct Profile {
        name: String,
    }

    fn profile(name: &str) -> Profile {
        Profile { name: name.to_string() }
    }

    struct FailingStore;

    impl BackendStore for FailingStore {
        fn name(&self) -> &str {
            "failing"
        }

        fn read(&self, _item_key: &str) -> Result<Option<Value>, BackendError> {
            Err(BackendError::Unavailable("down".to_string()))
        }

        fn write(&self, _diff: &Diff) -> Result<(), BackendError> {
            Err(BackendError::Unavailable("down".to_string()))
        }
    }

    #[test]
    fn first_valid_backend_wins() {
        let first = Arc::new(PropsStore::single("first", "profile", json!({"name": "a"})));
        let second = Arc::new(PropsStore::single("second", "profile", json!({"name": "b"})));

        let item = Item::builder("profile", profile("default"))
            .backend(first)
            .backend(second)
            .build();

        assert_eq!(resolve_initial(&item), profile("a"));
    }

    #[test]
    fn invalid_value_falls_through_to_next_backend() {
        let invalid = Arc::new(PropsStore::single("invalid", "profile", json!(42)));
        let valid = Arc::new(PropsStore::single("valid", "profile", json!({"name": "b"})));

        let item = Item::builder("profile", profile("default"))
            .backend(invalid)
            .backend(valid)
            .build();

        assert_eq!(resolve_initial(&item), profile("b"));
    }

    #[test]
    fn unavailable_backend_falls_through() {
        let valid = Arc::new(PropsStore::single("valid", "profile", json!({"name": "b"})));

        let item = Item::builder("profile", profile("default"))
            .backend(Arc::new(FailingStore))
            .backend(valid)
            .build();

        assert_eq!(resolve_initial(&item), profile("b"));
    }

    #[test]
    fn all_absent_yields_default() {
        let empty = Arc::new(PropsStore::new("empty", []));

        let item = Item::builder("profile", profile("default"))
            .backend(empty)
            .build();

        assert_eq!(resolve_initial(&item), profile("default"));
    }

    #[test]
    fn commit_reaches_backends_after_a_failure() {
        let remote = RemoteStore::new("remote", json!(null));

        let item = Item::builder("profile", profile("default"))
            .backend(Arc::new(FailingStore))
            .backend(Arc::new(remote.clone()))
            .build();

        commit(&item, &profile("committed"));
        assert_eq!(remote.get(), json!({"name": "committed"}));
    }

    #[test]
    fn commit_then_resolve_round_trips() {
        let remote = RemoteStore::new("remote", json!(null));

        let item = Item::builder("profile", profile("default"))
            .backend(Arc::new(remote))
            .build();

        commit(&item, &profile("v"));
        assert_eq!(resolve_initial(&item), profile("v"));
    }

    #[test]
    fn reset_restores_defaults_everywhere() {
        let remote = RemoteStore::new("remote", json!({"name": "seed"}));

        let item = Item::builder("profile", profile("default"))
            .backend(Arc::new(remote.clone()))
            .build();

        commit(&item, &profile("override"));
        reset(&item);

        assert_eq!(remote.get(), json!({"name": "seed"}));
    }
}
