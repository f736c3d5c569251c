//! The store: one state value, one reducer, and the listeners watching it.
//!
//! A [`Store`] is built from a reducer and changes only through
//! [`Store::dispatch`]. Listeners registered with [`Store::subscribe`] run
//! synchronously after every dispatch and are removed through the returned
//! [`Subscription`].

mod config;
mod store;
mod subscription;

pub use config::{ListenerFailures, StoreConfig};
pub use store::Store;
pub use subscription::{Subscription, SubscriptionGuard};
