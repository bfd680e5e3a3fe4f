//! Key-change handler registry.
//!
//! Maps setting keys to side-effect callbacks invoked synchronously after a
//! value for that key has been durably written (e.g. "reconfigure
//! auto-launch" when `launchOnStartup` changes). Built once at startup and
//! injected into the store, so tests can substitute their own registry.

use std::collections::HashMap;

use serde_json::Value;
use tracing::debug;

/// A side-effect callback receiving the newly written (pre-encoding) value.
pub type ChangeHandler = Box<dyn Fn(&Value) -> anyhow::Result<()> + Send + Sync>;

/// A fixed mapping from setting key to its change handler.
///
/// At most one handler per key; registering a second handler for the same
/// key replaces the first. Keys with no entry have no side effect.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, ChangeHandler>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for `key`, builder-style.
    pub fn on<F>(mut self, key: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let key = key.into();
        debug!(key = %key, "registering change handler");
        self.handlers.insert(key, Box::new(handler));
        self
    }

    /// Look up the handler for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&ChangeHandler> {
        self.handlers.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }
}
