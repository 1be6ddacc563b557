//! # Tether
//!
//! Multi-backend state synchronization for Rust.
//!
//! Tether keeps an observable piece of state (an "atom") consistent with an
//! ordered list of external backend stores:
//!
//! ## Backends (external sources of truth)
//!
//! - `PropsStore` - read-only values fixed at construction
//! - `RemoteStore` - an in-memory mock of a remote key-value service
//! - `UrlStore` - values round-tripped through a URL query string
//! - `BackendStore` - the trait to implement for your own stores
//!
//! ## Synchronization
//!
//! - `Item<T>` - a keyed piece of state with a default, a validator, and an
//!   ordered backend list
//! - `resolve_initial` / `commit` / `reset` - seed from the first backend
//!   with a valid value, fan writes out to all of them
//! - `Atom<T>` - the observable container wiring it together, with
//!   subscriptions and external-change listening

pub mod atom;
pub mod backend;
pub mod errors;
pub mod sync;

// Re-export main types for convenience
pub use atom::{Atom, SubscriptionGuard};
pub use backend::{BackendStore, Diff, DiffValue, ListenerGuard, PropsStore, RemoteStore, UrlStore};
pub use errors::{BackendError, SyncError};
pub use sync::{commit, reset, resolve_initial, Item, ItemBuilder, Validator};
