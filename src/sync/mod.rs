//! Item registry and synchronization coordinator.
//!
//! An [`Item`] associates a keyed piece of state with an ordered list of
//! backend stores and a validator. The coordinator resolves an item's
//! initial value from its backends ([`resolve_initial`]) and fans writes
//! out to all of them ([`commit`], [`reset`]).

mod coordinator;
mod item;

pub use coordinator::{commit, reset, resolve_initial};
pub use item::{Item, ItemBuilder, Validator};
