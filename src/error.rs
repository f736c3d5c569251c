//! Errors surfaced by [`Store::dispatch`](crate::Store::dispatch).

use thiserror::Error;

/// Why a dispatch did not take effect.
///
/// When `dispatch` returns an error, the state was not replaced and no
/// listener was notified.
#[derive(Debug, Error)]
pub enum StoreError<E> {
    /// The reducer refused the action.
    #[error("reducer failed")]
    Reducer(#[source] E),

    /// `dispatch` was called while the reducer was still computing.
    #[error("reducers may not dispatch actions")]
    DispatchInReducer,
}

impl<E> StoreError<E> {
    /// Returns the reducer's own error, if that is what failed.
    pub fn into_reducer_error(self) -> Option<E> {
        match self {
            StoreError::Reducer(err) => Some(err),
            StoreError::DispatchInReducer => None,
        }
    }
}
