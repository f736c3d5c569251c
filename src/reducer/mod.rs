//! Reducers: pure functions from `(state, action)` to the next state.
//!
//! Plain functions and closures of shape `Fn(&S, &A) -> S` are reducers
//! as long as `S: Default`. Fallible reducers go through [`fallible`], and
//! reducers with a custom initial state through [`from_fn`].
//!
//! Composite state is built from slice reducers, either with the
//! [`combine_reducers!`](crate::combine_reducers) macro for typed records or
//! with [`Combine`] for keyed maps.

mod combine;
mod reducer;

pub use combine::Combine;
pub use reducer::{fallible, from_fn, Fallible, FromFn, Reducer};
