//! Error types for the synchronization subsystem.
//!
//! Nothing here is fatal: the coordinator classifies failures with
//! [`SyncError`], reports them through `tracing`, and degrades to the next
//! backend or the item's default value.

use thiserror::Error;

/// A hard failure surfaced by a backend store.
///
/// "Not found" is never an error; backends signal it with `Ok(None)` from
/// `read`. `BackendError` is reserved for the cases where the store itself
/// could not answer.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backing resource could not be reached or refused the operation.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// A value could not be serialized or deserialized on the way in or out
    /// of the store.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Classification of a swallowed synchronization failure.
///
/// These are constructed by the coordinator purely for reporting; none of
/// them propagate to callers.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A backend answered with data that failed the item's validator.
    /// Treated as absent; resolution continues with the next backend.
    #[error("backend '{backend}' returned an invalid value for item '{key}'")]
    Validation { backend: String, key: String },

    /// A backend read failed outright. Treated as absent.
    #[error("backend '{backend}' unavailable while reading item '{key}'")]
    BackendUnavailable {
        backend: String,
        key: String,
        #[source]
        source: BackendError,
    },

    /// A backend write failed. Logged; never blocks writes to other backends.
    #[error("write to backend '{backend}' failed for item '{key}'")]
    WriteFailure {
        backend: String,
        key: String,
        #[source]
        source: BackendError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_error_display_names_backend_and_item() {
        let err = SyncError::Validation {
            backend: "remote".to_string(),
            key: "profile".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("remote"));
        assert!(message.contains("profile"));
    }

    #[test]
    fn write_failure_carries_source() {
        use std::error::Error;

        let err = SyncError::WriteFailure {
            backend: "url".to_string(),
            key: "profile".to_string(),
            source: BackendError::Unavailable("gone".to_string()),
        };
        assert!(err.source().is_some());
    }
}
