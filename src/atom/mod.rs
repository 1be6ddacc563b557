//! Observable state containers synchronized with backend stores.

mod atom;

pub use atom::{Atom, SubscriptionGuard};
