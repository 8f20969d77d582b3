//! Global atomic counters for exthealth observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event.

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters.
pub struct Metrics {
    scans_completed: AtomicU64,
    scans_rejected: AtomicU64,
    lookup_failures: AtomicU64,
    persist_failures: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            scans_completed: AtomicU64::new(0),
            scans_rejected: AtomicU64::new(0),
            lookup_failures: AtomicU64::new(0),
            persist_failures: AtomicU64::new(0),
        }
    }

    pub fn inc_scans_completed(&self) {
        self.scans_completed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "scans_completed", "counter incremented");
    }

    pub fn inc_scans_rejected(&self) {
        self.scans_rejected.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "scans_rejected", "counter incremented");
    }

    pub fn inc_lookup_failures(&self) {
        self.lookup_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "lookup_failures", "counter incremented");
    }

    pub fn inc_persist_failures(&self) {
        self.persist_failures.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "persist_failures", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            scans_completed = self.scans_completed(),
            scans_rejected = self.scans_rejected(),
            lookup_failures = self.lookup_failures(),
            persist_failures = self.persist_failures(),
        );
    }

    pub fn scans_completed(&self) -> u64 {
        self.scans_completed.load(Ordering::Relaxed)
    }

    pub fn scans_rejected(&self) -> u64 {
        self.scans_rejected.load(Ordering::Relaxed)
    }

    pub fn lookup_failures(&self) -> u64 {
        self.lookup_failures.load(Ordering::Relaxed)
    }

    pub fn persist_failures(&self) -> u64 {
        self.persist_failures.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        self.scans_completed.store(0, Ordering::Relaxed);
        self.scans_rejected.store(0, Ordering::Relaxed);
        self.lookup_failures.store(0, Ordering::Relaxed);
        self.persist_failures.store(0, Ordering::Relaxed);
    }
}
