//! In-memory fakes for host collaborators (testing only)
//!
//! Provides `StaticRegistry`, `MemoryTimestamps`, `GatedTimestamps`,
//! `RecordingNotifier` and `FixedClock`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use super::{Clock, ExtensionRegistry, Notifier, TimestampProvider};
use crate::domain::{ExtensionDescriptor, HostError, HostResult};

// ---------------------------------------------------------------------------
// StaticRegistry
// ---------------------------------------------------------------------------

/// Registry returning a fixed, replaceable list of descriptors.
#[derive(Debug, Default)]
pub struct StaticRegistry {
    descriptors: Mutex<Vec<ExtensionDescriptor>>,
    enumerations: AtomicUsize,
}

impl StaticRegistry {
    pub fn new(descriptors: Vec<ExtensionDescriptor>) -> Self {
        Self {
            descriptors: Mutex::new(descriptors),
            enumerations: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, descriptors: Vec<ExtensionDescriptor>) {
        *self
            .descriptors
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = descriptors;
    }

    /// How many times `installed()` has been called (one per scan).
    pub fn enumerations(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }
}

impl ExtensionRegistry for StaticRegistry {
    fn installed(&self) -> Vec<ExtensionDescriptor> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        self.descriptors
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

// ---------------------------------------------------------------------------
// MemoryTimestamps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Lookup {
    Known(Option<i64>),
    Fail(String),
}

/// Timestamp provider backed by a `HashMap<id, lookup result>`.
///
/// Unregistered ids fail with `HostError::UnknownExtension`.
#[derive(Debug, Default)]
pub struct MemoryTimestamps {
    entries: Mutex<HashMap<String, Lookup>>,
}

impl MemoryTimestamps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, id: &str, ts: Option<i64>) -> Self {
        self.set(id, ts);
        self
    }

    pub fn failing(self, id: &str, reason: &str) -> Self {
        self.lock().insert(id.to_string(), Lookup::Fail(reason.to_string()));
        self
    }

    pub fn set(&self, id: &str, ts: Option<i64>) {
        self.lock().insert(id.to_string(), Lookup::Known(ts));
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Lookup>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl TimestampProvider for MemoryTimestamps {
    async fn last_modified(&self, id: &str) -> HostResult<Option<i64>> {
        let entry = self.lock().get(id).cloned();
        match entry {
            Some(Lookup::Known(ts)) => Ok(ts),
            Some(Lookup::Fail(reason)) => Err(HostError::Other(reason)),
            None => Err(HostError::UnknownExtension(id.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// GatedTimestamps
// ---------------------------------------------------------------------------

/// Wraps a provider and holds every lookup until the test releases it.
///
/// Each lookup consumes one permit; `release(n)` lets `n` lookups through.
pub struct GatedTimestamps<P> {
    inner: P,
    gate: Arc<Semaphore>,
    started: AtomicUsize,
}

impl<P: TimestampProvider> GatedTimestamps<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            gate: Arc::new(Semaphore::new(0)),
            started: AtomicUsize::new(0),
        }
    }

    pub fn release(&self, lookups: usize) {
        self.gate.add_permits(lookups);
    }

    /// Lookups that have begun waiting on the gate.
    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<P: TimestampProvider> TimestampProvider for GatedTimestamps<P> {
    async fn last_modified(&self, id: &str) -> HostResult<Option<i64>> {
        self.started.fetch_add(1, Ordering::SeqCst);
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| HostError::Other("gate closed".to_string()))?;
        permit.forget();
        self.inner.last_modified(id).await
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

/// Notifier that keeps every message for later assertions.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(message.to_string());
    }
}

// ---------------------------------------------------------------------------
// FixedClock
// ---------------------------------------------------------------------------

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct FixedClock {
    now_ms: AtomicI64,
}

impl FixedClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, delta: i64) {
        self.now_ms.fetch_add(delta, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}
