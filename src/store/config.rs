use std::sync::Arc;

/// What a store does when a listener panics during notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListenerFailures {
    /// Log the panic and keep notifying the remaining listeners.
    #[default]
    Isolate,
    /// Let the panic unwind out of `dispatch`, skipping the remaining listeners.
    Propagate,
}

/// Settings fixed at store construction.
///
/// # Examples
///
/// ```
/// use reflux::{ListenerFailures, StoreConfig};
///
/// let config = StoreConfig::new()
///     .with_name("session")
///     .with_listener_failures(ListenerFailures::Propagate);
///
/// assert_eq!(config.name(), "session");
/// assert_eq!(config.listener_failures(), ListenerFailures::Propagate);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    name: Arc<str>,
    listener_failures: ListenerFailures,
}

impl StoreConfig {
    /// Default configuration: named `store`, listener panics isolated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Name used to tag this store's log lines.
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = name.into();
        self
    }

    /// How panicking listeners are handled.
    pub fn with_listener_failures(mut self, policy: ListenerFailures) -> Self {
        self.listener_failures = policy;
        self
    }

    /// Name tagging this store's log lines.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Policy applied when a listener panics.
    pub fn listener_failures(&self) -> ListenerFailures {
        self.listener_failures
    }

    pub(crate) fn shared_name(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            name: Arc::from("store"),
            listener_failures: ListenerFailures::default(),
        }
    }
}
