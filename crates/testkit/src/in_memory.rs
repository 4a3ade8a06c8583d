//! In-memory adapter implementations for port contracts.
//!
//! These implementations are intended for:
//! - Unit/integration tests of the resolver
//! - Deterministic contract tests for the ports layer
//! - Local experimentation without touching the filesystem

use search_settings_ports::{ConfigStorePort, EnvSourcePort, LogEvent, LogFields, LoggerPort};
use search_settings_shared::{ErrorEnvelope, Result};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A no-op logger implementation.
#[derive(Debug, Default)]
pub struct NoopLogger;

impl LoggerPort for NoopLogger {
    fn log(&self, _event: LogEvent) {}

    fn child(&self, _fields: LogFields) -> Box<dyn LoggerPort> {
        Box::new(Self)
    }
}

/// Logger that keeps every event for later assertions.
///
/// Children share the same buffer and prepend their base fields.
#[derive(Debug, Default, Clone)]
pub struct RecordingLogger {
    events: Arc<Mutex<Vec<LogEvent>>>,
    base_fields: LogFields,
}

impl RecordingLogger {
    /// Snapshot of recorded events.
    pub fn events(&self) -> Vec<LogEvent> {
        lock(&self.events).clone()
    }

    /// Names of recorded events, in order.
    pub fn event_names(&self) -> Vec<String> {
        lock(&self.events)
            .iter()
            .map(|event| event.event.to_string())
            .collect()
    }

    /// Returns true when an event with this name was recorded.
    pub fn has_event(&self, name: &str) -> bool {
        lock(&self.events)
            .iter()
            .any(|event| &*event.event == name)
    }
}

impl LoggerPort for RecordingLogger {
    fn log(&self, mut event: LogEvent) {
        if !self.base_fields.is_empty() {
            let mut fields = self.base_fields.clone();
            fields.extend(event.fields.take().unwrap_or_default());
            event.fields = Some(fields);
        }
        lock(&self.events).push(event);
    }

    fn child(&self, fields: LogFields) -> Box<dyn LoggerPort> {
        let mut base_fields = self.base_fields.clone();
        base_fields.extend(fields);
        Box::new(Self {
            events: Arc::clone(&self.events),
            base_fields,
        })
    }
}

/// Settings store held in memory.
///
/// Writers are serialized by a dedicated mutex so that concurrent
/// read-merge-write cycles behave like the file-locked store.
#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    contents: Mutex<Option<String>>,
    write_lock: Mutex<()>,
    read_error: Mutex<Option<ErrorEnvelope>>,
    write_error: Mutex<Option<ErrorEnvelope>>,
    writes: AtomicUsize,
}

impl InMemoryConfigStore {
    /// Empty store (reads report "not found").
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with `text`.
    pub fn with_contents(text: impl Into<String>) -> Self {
        let store = Self::default();
        *lock(&store.contents) = Some(text.into());
        store
    }

    /// Make every read fail with `error`.
    #[must_use]
    pub fn failing_reads(self, error: ErrorEnvelope) -> Self {
        *lock(&self.read_error) = Some(error);
        self
    }

    /// Make every write fail with `error`.
    #[must_use]
    pub fn failing_writes(self, error: ErrorEnvelope) -> Self {
        *lock(&self.write_error) = Some(error);
        self
    }

    /// Current contents, if any.
    pub fn contents(&self) -> Option<String> {
        lock(&self.contents).clone()
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl ConfigStorePort for InMemoryConfigStore {
    fn describe(&self) -> String {
        "memory://config.toml".to_string()
    }

    fn read_text(&self) -> Result<Option<Box<str>>> {
        if let Some(error) = lock(&self.read_error).clone() {
            return Err(error);
        }
        Ok(lock(&self.contents).as_deref().map(Box::from))
    }

    fn write_text(&self, contents: &str) -> Result<()> {
        if let Some(error) = lock(&self.write_error).clone() {
            return Err(error);
        }
        *lock(&self.contents) = Some(contents.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn with_exclusive_lock(&self, critical: &mut dyn FnMut() -> Result<()>) -> Result<()> {
        let _guard = lock(&self.write_lock);
        critical()
    }
}

/// Env source backed by a map.
#[derive(Debug, Default, Clone)]
pub struct MapEnv {
    vars: BTreeMap<String, String>,
}

impl MapEnv {
    /// Empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment from `(name, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Add or replace one variable.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl EnvSourcePort for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}
