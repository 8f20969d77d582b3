//! In-memory fakes for storage traits (testing only)
//!
//! `MemorySettingsStore` satisfies the `SettingsStore` contract without
//! touching the filesystem, and can be told to fail saves so callers can
//! exercise their persistence-failure paths.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::storage_traits::{SettingsStore, StoreResult};

/// In-memory settings store holding at most one blob.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    blob: Mutex<Option<serde_json::Value>>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a blob already stored, as if saved by a previous process.
    pub fn with_blob(blob: serde_json::Value) -> Self {
        Self {
            blob: Mutex::new(Some(blob)),
            ..Self::default()
        }
    }

    /// Make every subsequent `save` fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Current stored blob.
    pub fn blob(&self) -> Option<serde_json::Value> {
        self.blob
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn load(&self) -> StoreResult<Option<serde_json::Value>> {
        Ok(self.blob())
    }

    async fn save(&self, blob: &serde_json::Value) -> StoreResult<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected save failure".to_string()));
        }
        let mut slot = self
            .blob
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(blob.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
