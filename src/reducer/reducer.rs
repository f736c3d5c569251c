use std::convert::Infallible;

/// A pure state transition.
///
/// A reducer supplies the state a store starts from and computes each next
/// state from the current one and an action. Actions it does not recognize
/// must come back unchanged, so that reducers composed side by side ignore
/// actions meant for their siblings.
///
/// # Examples
///
/// ```
/// use reflux::Reducer;
///
/// enum Counter {
///     Increment,
///     Reset,
/// }
///
/// fn counter(state: &u32, action: &Counter) -> u32 {
///     match action {
///         Counter::Increment => state + 1,
///         Counter::Reset => 0,
///     }
/// }
///
/// assert_eq!(Reducer::<u32, Counter>::initial_state(&counter), 0);
/// assert_eq!(counter.reduce(&41, &Counter::Increment), Ok(42));
/// ```
pub trait Reducer<S, A> {
    /// Failure reported by [`reduce`](Reducer::reduce).
    type Error;

    /// The state used when there is no current state yet.
    fn initial_state(&self) -> S;

    /// Computes the state that follows `state` once `action` is applied.
    fn reduce(&self, state: &S, action: &A) -> Result<S, Self::Error>;
}

impl<S, A, F> Reducer<S, A> for F
where
    F: Fn(&S, &A) -> S,
    S: Default,
{
    type Error = Infallible;

    fn initial_state(&self) -> S {
        S::default()
    }

    fn reduce(&self, state: &S, action: &A) -> Result<S, Infallible> {
        Ok(self(state, action))
    }
}

/// Reducer built from a function that may reject an action.
///
/// Created by [`fallible`].
#[derive(Debug, Clone, Copy)]
pub struct Fallible<F> {
    reduce: F,
}

/// Wraps `Fn(&S, &A) -> Result<S, E>` as a reducer starting from `S::default()`.
///
/// # Examples
///
/// ```
/// use reflux::reducer::{fallible, Reducer};
///
/// let checked = fallible(|state: &u8, step: &u8| state.checked_add(*step).ok_or("overflow"));
///
/// assert_eq!(checked.reduce(&250, &5), Ok(255));
/// assert_eq!(checked.reduce(&250, &6), Err("overflow"));
/// ```
pub fn fallible<S, A, E, F>(reduce: F) -> Fallible<F>
where
    F: Fn(&S, &A) -> Result<S, E>,
    S: Default,
{
    Fallible { reduce }
}

impl<S, A, E, F> Reducer<S, A> for Fallible<F>
where
    F: Fn(&S, &A) -> Result<S, E>,
    S: Default,
{
    type Error = E;

    fn initial_state(&self) -> S {
        S::default()
    }

    fn reduce(&self, state: &S, action: &A) -> Result<S, E> {
        (self.reduce)(state, action)
    }
}

/// Reducer assembled from an initial-state function and a fallible step.
///
/// Created by [`from_fn`].
#[derive(Debug, Clone, Copy)]
pub struct FromFn<I, F> {
    initial: I,
    reduce: F,
}

/// Builds a reducer whose initial state comes from `initial`.
///
/// Useful when the state type has no meaningful `Default`.
pub fn from_fn<S, A, E, I, F>(initial: I, reduce: F) -> FromFn<I, F>
where
    I: Fn() -> S,
    F: Fn(&S, &A) -> Result<S, E>,
{
    FromFn { initial, reduce }
}

impl<S, A, E, I, F> Reducer<S, A> for FromFn<I, F>
where
    I: Fn() -> S,
    F: Fn(&S, &A) -> Result<S, E>,
{
    type Error = E;

    fn initial_state(&self) -> S {
        (self.initial)()
    }

    fn reduce(&self, state: &S, action: &A) -> Result<S, E> {
        (self.reduce)(state, action)
    }
}
