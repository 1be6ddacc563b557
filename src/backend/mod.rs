//! Backend stores: external sources of truth for synchronized state.
//!
//! This module provides the store abstraction and three concrete stores:
//! - `PropsStore`: read-only values fixed at construction
//! - `RemoteStore`: an in-memory mock of a remote key-value service
//! - `UrlStore`: values round-tripped through a URL query string

mod props;
mod remote;
mod store;
mod url;

pub use props::PropsStore;
pub use remote::RemoteStore;
pub use store::{BackendStore, Diff, DiffValue, ExternalChange, ListenerGuard};
pub use url::UrlStore;
