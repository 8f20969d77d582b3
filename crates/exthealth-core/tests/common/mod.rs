//! Shared fixtures for monitor integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use exthealth_core::host::fakes::{FixedClock, RecordingNotifier, StaticRegistry};
use exthealth_core::{ExtensionDescriptor, MonitorDeps, TimestampProvider};
use exthealth_state::fakes::MemorySettingsStore;

pub const NOW: i64 = 1_767_225_600_000;
pub const DAY_MS: i64 = 24 * 60 * 60 * 1000;

pub fn descriptor(id: &str) -> ExtensionDescriptor {
    ExtensionDescriptor::new(id, format!("{id} plugin"), "1.0.0")
}

pub struct Harness {
    pub registry: Arc<StaticRegistry>,
    pub store: Arc<MemorySettingsStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<FixedClock>,
}

impl Harness {
    pub fn new(ids: &[&str], store: MemorySettingsStore) -> Self {
        Self {
            registry: Arc::new(StaticRegistry::new(ids.iter().map(|id| descriptor(id)).collect())),
            store: Arc::new(store),
            notifier: Arc::new(RecordingNotifier::new()),
            clock: Arc::new(FixedClock::new(NOW)),
        }
    }

    pub fn deps(&self, timestamps: Arc<dyn TimestampProvider>) -> MonitorDeps {
        MonitorDeps {
            registry: self.registry.clone(),
            timestamps,
            store: self.store.clone(),
            notifier: self.notifier.clone(),
            clock: self.clock.clone(),
        }
    }
}
