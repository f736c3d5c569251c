use super::Reducer;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;

type SliceReducer<V, A, E> = Box<dyn Reducer<V, A, Error = E> + Send + Sync>;

/// Reducer over a keyed map of slices, one slice reducer per key.
///
/// Every action is handed, unchanged, to every slice reducer, each of which
/// sees only its own slice. A key missing from the current state starts
/// from its reducer's initial state. Entries without a registered reducer
/// are dropped from the next state.
///
/// # Examples
///
/// ```
/// use reflux::reducer::{Combine, Reducer};
///
/// enum Tally {
///     Hit,
///     Miss,
/// }
///
/// fn hits(state: &u32, action: &Tally) -> u32 {
///     match action {
///         Tally::Hit => state + 1,
///         Tally::Miss => *state,
///     }
/// }
///
/// fn misses(state: &u32, action: &Tally) -> u32 {
///     match action {
///         Tally::Miss => state + 1,
///         Tally::Hit => *state,
///     }
/// }
///
/// let score: Combine<&str, u32, Tally> = Combine::new().slice("hits", hits).slice("misses", misses);
/// let state = score.reduce(&score.initial_state(), &Tally::Hit).unwrap();
///
/// assert_eq!(state["hits"], 1);
/// assert_eq!(state["misses"], 0);
/// ```
pub struct Combine<K, V, A, E = Infallible> {
    slices: BTreeMap<K, SliceReducer<V, A, E>>,
}

impl<K: Ord, V, A, E> Combine<K, V, A, E> {
    /// Create a combinator with no slices.
    pub fn new() -> Self {
        Self {
            slices: BTreeMap::new(),
        }
    }

    /// Register `reducer` for the slice named `key`, replacing any previous one.
    pub fn slice<R>(mut self, key: impl Into<K>, reducer: R) -> Self
    where
        R: Reducer<V, A, Error = E> + Send + Sync + 'static,
    {
        self.slices.insert(key.into(), Box::new(reducer));
        self
    }

    /// Number of registered slices.
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// Whether no slice is registered.
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }
}

impl<K: Ord, V, A, E> Default for Combine<K, V, A, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, V, A, E> fmt::Debug for Combine<K, V, A, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Combine")
            .field("slices", &self.slices.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<K, V, A, E> Reducer<BTreeMap<K, V>, A> for Combine<K, V, A, E>
where
    K: Ord + Clone,
{
    type Error = E;

    fn initial_state(&self) -> BTreeMap<K, V> {
        self.slices
            .iter()
            .map(|(key, reducer)| (key.clone(), reducer.initial_state()))
            .collect()
    }

    fn reduce(&self, state: &BTreeMap<K, V>, action: &A) -> Result<BTreeMap<K, V>, E> {
        self.slices
            .iter()
            .map(|(key, reducer)| {
                let next = match state.get(key) {
                    Some(slice) => reducer.reduce(slice, action)?,
                    None => reducer.reduce(&reducer.initial_state(), action)?,
                };
                Ok((key.clone(), next))
            })
            .collect()
    }
}

/// Builds one reducer over a record type from one reducer per field.
///
/// Each field's reducer receives that field of the current state and every
/// action, unchanged. The initial state is assembled from each field
/// reducer's initial state.
///
/// The two-argument form requires infallible field reducers. Passing an
/// error type as the third argument accepts fallible field reducers whose
/// errors convert into it with `From`.
///
/// # Examples
///
/// ```
/// use reflux::{combine_reducers, Store};
///
/// #[derive(Debug)]
/// enum Action {
///     Add(String),
///     Clear,
/// }
///
/// #[derive(Debug)]
/// struct State {
///     items: Vec<String>,
///     edits: usize,
/// }
///
/// fn items(state: &Vec<String>, action: &Action) -> Vec<String> {
///     match action {
///         Action::Add(item) => state.iter().cloned().chain([item.clone()]).collect(),
///         Action::Clear => Vec::new(),
///     }
/// }
///
/// fn edits(state: &usize, _action: &Action) -> usize {
///     state + 1
/// }
///
/// let store = Store::new(combine_reducers!(State, Action => {
///     items: items,
///     edits: edits,
/// }));
///
/// store.dispatch(Action::Add("milk".into())).unwrap();
/// assert_eq!(store.get_state().items, vec!["milk".to_string()]);
/// assert_eq!(store.get_state().edits, 1);
/// ```
#[macro_export]
macro_rules! combine_reducers {
    ($state:ident, $action:ty => { $($field:ident : $reducer:expr),+ $(,)? }) => {
        $crate::combine_reducers!($state, $action, ::std::convert::Infallible => {
            $($field: $reducer),+
        })
    };
    ($state:ident, $action:ty, $err:ty => { $($field:ident : $reducer:expr),+ $(,)? }) => {{
        let reducers = ::std::sync::Arc::new(($($reducer,)+));
        let initial = {
            let reducers = ::std::sync::Arc::clone(&reducers);
            move || -> $state {
                let ($($field,)+) = &*reducers;
                $state {
                    $($field: <_ as $crate::Reducer<_, $action>>::initial_state($field),)+
                }
            }
        };
        let reduce = move |state: &$state, action: &$action| -> ::std::result::Result<$state, $err> {
            let ($($field,)+) = &*reducers;
            ::std::result::Result::Ok($state {
                $($field: <_ as $crate::Reducer<_, $action>>::reduce($field, &state.$field, action)
                    .map_err(<$err>::from)?,)+
            })
        };
        $crate::reducer::from_fn(initial, reduce)
    }};
}
