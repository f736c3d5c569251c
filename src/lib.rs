//! # Reflux
//!
//! An observable state container driven by reducers.
//!
//! A [`Store`] holds a single state value. The value is never mutated in
//! place: each [`Store::dispatch`] feeds an action through a pure
//! [`Reducer`], installs the state it returns and then notifies every
//! subscribed listener, synchronously and in subscription order.
//!
//! ## Reducers
//!
//! - Any `Fn(&S, &A) -> S` with `S: Default` is a [`Reducer`]
//! - [`reducer::fallible`] and [`reducer::from_fn`] cover reducers that can
//!   fail or that start from a custom state
//! - [`combine_reducers!`] and [`reducer::Combine`] compose slice reducers
//!   into one reducer over a record or a keyed map
//!
//! ## Store
//!
//! - `get_state` hands out the current state as a shared `Arc`
//! - `subscribe` returns a [`Subscription`] whose `unsubscribe` is idempotent
//! - `dispatch` either completes fully or, on [`StoreError`], changes nothing
//!
//! # Examples
//!
//! ```
//! use reflux::Store;
//!
//! #[derive(Debug)]
//! enum Action {
//!     Push(&'static str),
//!     Pop,
//! }
//!
//! fn stack(state: &Vec<&'static str>, action: &Action) -> Vec<&'static str> {
//!     let mut next = state.clone();
//!     match action {
//!         Action::Push(item) => next.push(*item),
//!         Action::Pop => {
//!             next.pop();
//!         }
//!     }
//!     next
//! }
//!
//! let store = Store::new(stack);
//! store.dispatch(Action::Push("a")).unwrap();
//! store.dispatch(Action::Push("b")).unwrap();
//! store.dispatch(Action::Pop).unwrap();
//! assert_eq!(*store.get_state(), vec!["a"]);
//! ```

pub mod error;
pub mod reducer;
pub mod store;

// Re-export main types for convenience
pub use error::StoreError;
pub use reducer::Reducer;
pub use store::{ListenerFailures, Store, StoreConfig, Subscription, SubscriptionGuard};
