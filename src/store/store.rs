use super::config::{ListenerFailures, StoreConfig};
use super::subscription::{Listener, Registry, Subscription};
use crate::error::StoreError;
use crate::reducer::Reducer;
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::any::Any;
use std::convert::Infallible;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

type BoxedReducer<S, A, E> = Box<dyn Reducer<S, A, Error = E> + Send + Sync>;

struct StoreInner<S, A, E> {
    config: StoreConfig,
    name: Arc<str>,
    reducer: BoxedReducer<S, A, E>,
    state: RwLock<Arc<S>>,
    listeners: Arc<Mutex<Registry>>,
    // Serializes dispatches across threads; re-entry from a listener on the
    // same thread is allowed.
    dispatching: ReentrantMutex<()>,
    reducing: AtomicBool,
    dispatches: AtomicU64,
}

/// A thread-safe store holding one state value that changes only through
/// its reducer.
///
/// The state is initialized eagerly from [`Reducer::initial_state`] when
/// the store is built. Every [`dispatch`](Store::dispatch) runs the reducer,
/// installs the result as the new state and then calls every listener, in
/// subscription order, before returning.
///
/// Listeners are snapshotted before each notification pass: a listener
/// subscribed during a pass first runs on the next dispatch, and one
/// unsubscribed during a pass still runs for that pass.
///
/// Cloning a store yields another handle to the same state and listeners.
///
/// # Examples
///
/// ```
/// use reflux::Store;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// enum Counter {
///     Add(u32),
/// }
///
/// fn counter(state: &u32, action: &Counter) -> u32 {
///     match action {
///         Counter::Add(n) => state + n,
///     }
/// }
///
/// let store = Store::new(counter);
/// let calls = Arc::new(AtomicUsize::new(0));
/// let subscription = store.subscribe({
///     let calls = calls.clone();
///     move || {
///         calls.fetch_add(1, Ordering::SeqCst);
///     }
/// });
///
/// store.dispatch(Counter::Add(2)).unwrap();
/// assert_eq!(*store.get_state(), 2);
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
///
/// subscription.unsubscribe();
/// store.dispatch(Counter::Add(3)).unwrap();
/// assert_eq!(*store.get_state(), 5);
/// assert_eq!(calls.load(Ordering::SeqCst), 1);
/// ```
pub struct Store<S, A, E = Infallible> {
    inner: Arc<StoreInner<S, A, E>>,
}

impl<S, A, E> Store<S, A, E> {
    /// Create a store with the default configuration.
    pub fn new<R>(reducer: R) -> Self
    where
        R: Reducer<S, A, Error = E> + Send + Sync + 'static,
    {
        Self::with_config(reducer, StoreConfig::default())
    }

    /// Create a store with the given configuration.
    pub fn with_config<R>(reducer: R, config: StoreConfig) -> Self
    where
        R: Reducer<S, A, Error = E> + Send + Sync + 'static,
    {
        let state = Arc::new(reducer.initial_state());
        let name = config.shared_name();
        log::debug!(
            "[{}] store created, listener failures: {:?}",
            name,
            config.listener_failures()
        );

        Self {
            inner: Arc::new(StoreInner {
                config,
                name,
                reducer: Box::new(reducer),
                state: RwLock::new(state),
                listeners: Arc::new(Mutex::new(Registry::default())),
                dispatching: ReentrantMutex::new(()),
                reducing: AtomicBool::new(false),
                dispatches: AtomicU64::new(0),
            }),
        }
    }

    /// Current state.
    ///
    /// This is a shared handle, not a copy; the store never mutates a value
    /// it has handed out, it only replaces it.
    pub fn get_state(&self) -> Arc<S> {
        Arc::clone(&*self.inner.state.read())
    }

    /// Read the current state through a closure.
    pub fn with_state<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&S) -> R,
    {
        let state = self.get_state();
        f(&state)
    }

    /// Register a listener to run after every dispatch.
    ///
    /// The same callback may be registered several times; each registration
    /// runs and is removed independently.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let listener: Listener = Arc::new(listener);
        let id = self.inner.listeners.lock().insert(listener);
        log::debug!("[{}] listener {} subscribed", self.inner.name, id);

        Subscription::new(
            id,
            Arc::downgrade(&self.inner.listeners),
            Arc::clone(&self.inner.name),
        )
    }

    /// Run `action` through the reducer, replace the state, and notify.
    ///
    /// On error nothing changes: the state stays as it was and no listener
    /// runs. A listener may dispatch again; that dispatch completes,
    /// notifications included, before the outer notification pass resumes.
    ///
    /// A reducer dispatching to its own store on the same thread gets
    /// [`StoreError::DispatchInReducer`]. Handing that dispatch to another
    /// thread and waiting for it blocks forever: the other thread waits for
    /// the running dispatch to finish.
    pub fn dispatch(&self, action: A) -> Result<(), StoreError<E>> {
        let inner = &*self.inner;
        let _dispatching = inner.dispatching.lock();

        if inner.reducing.load(Ordering::Acquire) {
            log::warn!("[{}] dispatch refused while the reducer is running", inner.name);
            return Err(StoreError::DispatchInReducer);
        }

        let current = self.get_state();
        let next = {
            let _reducing = ReducingFlag::raise(&inner.reducing);
            inner.reducer.reduce(&current, &action).map_err(StoreError::Reducer)?
        };
        *inner.state.write() = Arc::new(next);

        let sequence = inner.dispatches.fetch_add(1, Ordering::Relaxed) + 1;
        let listeners = inner.listeners.lock().snapshot();
        log::trace!(
            "[{}] dispatch #{} applied, notifying {} listener(s)",
            inner.name,
            sequence,
            listeners.len()
        );

        self.notify(&listeners);
        Ok(())
    }

    fn notify(&self, listeners: &[Listener]) {
        match self.inner.config.listener_failures() {
            ListenerFailures::Propagate => {
                for listener in listeners {
                    listener();
                }
            }
            ListenerFailures::Isolate => {
                for (position, listener) in listeners.iter().enumerate() {
                    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| listener())) {
                        log::error!(
                            "[{}] listener at position {} panicked: {}",
                            self.inner.name,
                            position,
                            panic_message(&*payload)
                        );
                    }
                }
            }
        }
    }

    /// Number of currently registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.lock().len()
    }

    /// Number of dispatches that replaced the state.
    pub fn dispatch_count(&self) -> u64 {
        self.inner.dispatches.load(Ordering::Relaxed)
    }

    /// Configuration the store was built with.
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }
}

impl<S, A, E> Clone for Store<S, A, E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: fmt::Debug, A, E> fmt::Debug for Store<S, A, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.inner.name)
            .field("state", &self.get_state())
            .field("listeners", &self.listener_count())
            .field("dispatches", &self.dispatch_count())
            .finish()
    }
}

/// Marks the reducer as running; cleared on drop, including on unwind.
struct ReducingFlag<'a>(&'a AtomicBool);

impl<'a> ReducingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::Release);
        Self(flag)
    }
}

impl Drop for ReducingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "<non-string panic payload>"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reducer::fallible;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[derive(Debug, Clone, PartialEq)]
    enum Counter {
        Increment,
        Add(i64),
        Noop,
    }

    fn counter(state: &i64, action: &Counter) -> i64 {
        match action {
            Counter::Increment => state + 1,
            Counter::Add(n) => state + n,
            Counter::Noop => *state,
        }
    }

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn counting(calls: &Arc<AtomicUsize>) -> impl Fn() + Send + Sync + 'static {
        let calls = Arc::clone(calls);
        move || {
            calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn state_is_initialized_eagerly() {
        let store = Store::new(counter);
        assert_eq!(*store.get_state(), 0);
        assert_eq!(store.dispatch_count(), 0);
    }

    #[test]
    fn dispatch_installs_reducer_output() {
        init_logging();
        let store = Store::new(counter);
        store.dispatch(Counter::Add(40)).unwrap();

        let before = store.get_state();
        store.dispatch(Counter::Add(2)).unwrap();

        assert_eq!(*store.get_state(), counter(&before, &Counter::Add(2)));
        assert_eq!(*store.get_state(), 42);
        assert_eq!(store.dispatch_count(), 2);
    }

    #[test]
    fn handed_out_state_is_never_mutated() {
        let store = Store::new(counter);
        let before = store.get_state();
        store.dispatch(Counter::Increment).unwrap();

        assert_eq!(*before, 0);
        assert_eq!(*store.get_state(), 1);
    }

    #[test]
    fn listeners_run_in_subscription_order_after_replacement() {
        let store = Store::new(counter);
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            let reader = store.clone();
            store.subscribe(move || seen.lock().push((tag, *reader.get_state())));
        }

        store.dispatch(Counter::Add(7)).unwrap();
        assert_eq!(
            *seen.lock(),
            vec![("first", 7), ("second", 7), ("third", 7)]
        );
    }

    #[test]
    fn dispatch_with_no_listeners_still_applies() {
        let store = Store::new(counter);
        store.dispatch(Counter::Increment).unwrap();
        assert_eq!(store.listener_count(), 0);
        assert_eq!(*store.get_state(), 1);
    }

    #[test]
    fn unrecognized_action_still_notifies() {
        let store = Store::new(counter);
        let calls = Arc::new(AtomicUsize::new(0));
        store.subscribe(counting(&calls));

        store.dispatch(Counter::Add(3)).unwrap();
        store.dispatch(Counter::Noop).unwrap();

        assert_eq!(*store.get_state(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn duplicate_registrations_are_independent() {
        let store = Store::new(counter);
        let calls = Arc::new(AtomicUsize::new(0));
        let listener = Arc::new(counting(&calls));

        let first = store.subscribe({
            let listener = Arc::clone(&listener);
            move || listener()
        });
        store.subscribe({
            let listener = Arc::clone(&listener);
            move || listener()
        });

        store.dispatch(Counter::Increment).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        first.unsubscribe();
        store.dispatch(Counter::Increment).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn reducer_failure_changes_nothing() {
        let store = Store::new(fallible(|state: &i64, action: &Counter| match action {
            Counter::Add(n) if *n < 0 => Err(format!("cannot add {}", n)),
            other => Ok(counter(state, other)),
        }));
        let calls = Arc::new(AtomicUsize::new(0));
        store.subscribe(counting(&calls));
        store.dispatch(Counter::Add(5)).unwrap();

        let err = store.dispatch(Counter::Add(-1)).unwrap_err();

        assert_eq!(err.into_reducer_error(), Some("cannot add -1".to_string()));
        assert_eq!(*store.get_state(), 5);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.dispatch_count(), 1);
        assert_eq!(store.listener_count(), 1);
    }

    #[test]
    fn reducer_cannot_dispatch() {
        init_logging();
        let slot: Arc<Mutex<Option<Store<i64, Counter>>>> = Arc::new(Mutex::new(None));
        let refused = Arc::new(AtomicBool::new(false));

        let store = Store::new({
            let slot = Arc::clone(&slot);
            let refused = Arc::clone(&refused);
            move |state: &i64, action: &Counter| {
                let store = slot.lock().clone();
                if let Some(store) = store {
                    let result = store.dispatch(Counter::Increment);
                    refused.store(
                        matches!(result, Err(StoreError::DispatchInReducer)),
                        Ordering::SeqCst,
                    );
                }
                counter(state, action)
            }
        });
        *slot.lock() = Some(store.clone());

        store.dispatch(Counter::Add(10)).unwrap();

        assert!(refused.load(Ordering::SeqCst));
        assert_eq!(*store.get_state(), 10);
        assert_eq!(store.dispatch_count(), 1);

        // The flag is cleared again once the reducer returns.
        slot.lock().take();
        store.dispatch(Counter::Increment).unwrap();
        assert_eq!(*store.get_state(), 11);
    }

    #[test]
    fn unsubscribe_during_notification_uses_snapshot() {
        let store = Store::new(counter);
        let victim_calls = Arc::new(AtomicUsize::new(0));
        let victim: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        store.subscribe({
            let victim = Arc::clone(&victim);
            move || {
                if let Some(subscription) = victim.lock().as_ref() {
                    subscription.unsubscribe();
                }
            }
        });
        *victim.lock() = Some(store.subscribe(counting(&victim_calls)));

        store.dispatch(Counter::Increment).unwrap();
        assert_eq!(victim_calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.listener_count(), 1);

        store.dispatch(Counter::Increment).unwrap();
        assert_eq!(victim_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn subscribe_during_notification_waits_for_next_dispatch() {
        let store = Store::new(counter);
        let late_calls = Arc::new(AtomicUsize::new(0));

        let subscribed = AtomicBool::new(false);
        store.subscribe({
            let store = store.clone();
            let late_calls = Arc::clone(&late_calls);
            move || {
                if !subscribed.swap(true, Ordering::SeqCst) {
                    store.subscribe(counting(&late_calls));
                }
            }
        });

        store.dispatch(Counter::Increment).unwrap();
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);

        store.dispatch(Counter::Increment).unwrap();
        assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unsubscribing_a_listener_that_owns_a_guard_returns() {
        let store = Store::new(counter);
        let inner_calls = Arc::new(AtomicUsize::new(0));
        let inner = store.subscribe(counting(&inner_calls)).guard();
        let owner = store.subscribe(move || {
            let _ = inner.subscription();
        });

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        thread::spawn(move || {
            done_tx.send(owner.unsubscribe()).unwrap();
        });

        let removed = done_rx
            .recv_timeout(std::time::Duration::from_secs(3))
            .expect("unsubscribe blocked on the registry lock");
        assert!(removed);
        assert_eq!(store.listener_count(), 0);

        store.dispatch(Counter::Increment).unwrap();
        assert_eq!(inner_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn reentrant_dispatch_completes_before_outer_pass_resumes() {
        let store = Store::new(counter);
        let seen = Arc::new(Mutex::new(Vec::new()));

        store.subscribe({
            let store = store.clone();
            let seen = Arc::clone(&seen);
            move || {
                let state = *store.get_state();
                seen.lock().push(format!("outer:{}", state));
                if state == 1 {
                    store.dispatch(Counter::Increment).unwrap();
                }
            }
        });
        store.subscribe({
            let store = store.clone();
            let seen = Arc::clone(&seen);
            move || seen.lock().push(format!("second:{}", *store.get_state()))
        });

        store.dispatch(Counter::Increment).unwrap();

        assert_eq!(
            *seen.lock(),
            vec!["outer:1", "outer:2", "second:2", "second:2"]
        );
        assert_eq!(store.dispatch_count(), 2);
    }

    #[test]
    fn isolated_listener_panic_does_not_stop_the_rest() {
        init_logging();
        let store = Store::new(counter);
        let calls = Arc::new(AtomicUsize::new(0));
        store.subscribe(|| panic!("listener exploded"));
        store.subscribe(counting(&calls));

        assert!(store.dispatch(Counter::Increment).is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*store.get_state(), 1);
    }

    #[test]
    fn propagated_listener_panic_leaves_store_usable() {
        let config = StoreConfig::new()
            .with_name("propagating")
            .with_listener_failures(ListenerFailures::Propagate);
        let store = Store::with_config(counter, config);
        let calls = Arc::new(AtomicUsize::new(0));
        let exploding = store.subscribe(|| panic!("listener exploded"));
        store.subscribe(counting(&calls));

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| store.dispatch(Counter::Increment)));
        assert!(outcome.is_err());
        assert_eq!(*store.get_state(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        exploding.unsubscribe();
        store.dispatch(Counter::Increment).unwrap();
        assert_eq!(*store.get_state(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_dispatches_lose_no_updates() {
        let store = Store::new(counter);
        let calls = Arc::new(AtomicUsize::new(0));
        store.subscribe(counting(&calls));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        store.dispatch(Counter::Increment).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*store.get_state(), 800);
        assert_eq!(store.dispatch_count(), 800);
        assert_eq!(calls.load(Ordering::SeqCst), 800);
    }

    #[test]
    fn stores_are_independent() {
        let left = Store::new(counter);
        let right = Store::new(counter);
        left.dispatch(Counter::Add(9)).unwrap();

        assert_eq!(*left.get_state(), 9);
        assert_eq!(*right.get_state(), 0);
    }

    #[test]
    fn with_state_borrows_current_value() {
        let store = Store::new(counter);
        store.dispatch(Counter::Add(21)).unwrap();
        assert_eq!(store.with_state(|n| n * 2), 42);
    }

    #[test]
    fn debug_shows_name_and_state() {
        let store = Store::with_config(counter, StoreConfig::new().with_name("dbg"));
        let rendered = format!("{:?}", store);
        assert!(rendered.contains("\"dbg\""));
        assert!(rendered.contains("state: 0"));
    }
}
