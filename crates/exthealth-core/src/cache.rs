//! Snapshot cache with write-through persistence.
//!
//! Holds the latest [`Snapshot`] and the current [`HealthSettings`], and
//! mirrors both into the [`SettingsStore`] as one blob. Readers always see
//! either the previous snapshot or the new one, never a mix. A failed write
//! is reported to the caller and leaves the in-memory state in place.

use std::sync::{Arc, Mutex};

use exthealth_state::SettingsStore;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::domain::{Result, Snapshot};
use crate::settings::{decode_state, encode_state, HealthSettings};

pub struct SnapshotCache {
    store: Arc<dyn SettingsStore>,
    settings: Mutex<HealthSettings>,
    current: watch::Sender<Option<Arc<Snapshot>>>,
    // Serialises encode+save so an older blob can never land after a newer one.
    write_lock: tokio::sync::Mutex<()>,
}

impl SnapshotCache {
    /// Load settings and the last snapshot from `store`.
    ///
    /// An unreadable or undecodable blob is logged and replaced by defaults
    /// with no snapshot.
    pub async fn hydrate(store: Arc<dyn SettingsStore>) -> Self {
        let state = match store.load().await {
            Ok(Some(blob)) => match decode_state(blob) {
                Ok(state) => state,
                Err(e) => {
                    warn!(error = %e, "stored settings unusable, starting from defaults");
                    Default::default()
                }
            },
            Ok(None) => {
                debug!("no stored settings, starting from defaults");
                Default::default()
            }
            Err(e) => {
                warn!(error = %e, "failed to load settings, starting from defaults");
                Default::default()
            }
        };

        let (current, _) = watch::channel(state.cached_snapshot.map(Arc::new));
        Self {
            store,
            settings: Mutex::new(state.settings),
            current,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Latest snapshot, or `None` if no scan has completed yet.
    pub fn get(&self) -> Option<Arc<Snapshot>> {
        self.current.borrow().clone()
    }

    /// Receiver that wakes whenever the snapshot is replaced.
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.current.subscribe()
    }

    pub fn settings(&self) -> HealthSettings {
        self.lock_settings().clone()
    }

    /// Replace the cached snapshot, then persist.
    ///
    /// The returned snapshot is live in memory whether or not the write
    /// succeeded.
    pub async fn replace(&self, snapshot: Snapshot) -> (Arc<Snapshot>, Result<()>) {
        let snapshot = Arc::new(snapshot);
        self.current.send_replace(Some(Arc::clone(&snapshot)));
        let persisted = self.persist().await;
        (snapshot, persisted)
    }

    /// Apply `change` to the settings, then persist.
    pub async fn update_settings<F>(&self, change: F) -> (HealthSettings, Result<()>)
    where
        F: FnOnce(&mut HealthSettings),
    {
        let updated = {
            let mut settings = self.lock_settings();
            change(&mut settings);
            settings.clone()
        };
        (updated, self.persist().await)
    }

    async fn persist(&self) -> Result<()> {
        let _write = self.write_lock.lock().await;
        let settings = self.settings();
        let snapshot = self.get();
        let blob = encode_state(&settings, snapshot.as_deref())?;
        self.store.save(&blob).await?;
        Ok(())
    }

    fn lock_settings(&self) -> std::sync::MutexGuard<'_, HealthSettings> {
        self.settings
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exthealth_state::fakes::MemorySettingsStore;
    use serde_json::json;

    #[tokio::test]
    async fn empty_store_hydrates_to_no_data() {
        let cache = SnapshotCache::hydrate(Arc::new(MemorySettingsStore::new())).await;
        assert!(cache.get().is_none());
        assert_eq!(cache.settings(), HealthSettings::default());
    }

    #[tokio::test]
    async fn replace_writes_through() {
        let store = Arc::new(MemorySettingsStore::new());
        let cache = SnapshotCache::hydrate(store.clone()).await;

        let (snap, persisted) = cache.replace(Snapshot::from_records(99, Vec::new())).await;
        assert!(persisted.is_ok());
        assert_eq!(snap.checked_at, 99);
        assert_eq!(store.blob().unwrap()["cachedSnapshot"]["checkedAt"], 99);
    }

    #[tokio::test]
    async fn failed_write_keeps_memory_state() {
        let store = Arc::new(MemorySettingsStore::new());
        store.set_fail_saves(true);
        let cache = SnapshotCache::hydrate(store.clone()).await;

        let (_, persisted) = cache.replace(Snapshot::from_records(1, Vec::new())).await;
        assert!(persisted.is_err());
        assert_eq!(cache.get().map(|s| s.checked_at), Some(1));
        assert!(store.blob().is_none());
    }

    #[tokio::test]
    async fn corrupt_blob_hydrates_to_defaults() {
        let store = Arc::new(MemorySettingsStore::with_blob(json!("not an object")));
        let cache = SnapshotCache::hydrate(store).await;
        assert!(cache.get().is_none());
        assert_eq!(cache.settings(), HealthSettings::default());
    }

    #[tokio::test]
    async fn settings_update_keeps_snapshot_in_blob() {
        let store = Arc::new(MemorySettingsStore::new());
        let cache = SnapshotCache::hydrate(store.clone()).await;
        cache.replace(Snapshot::from_records(3, Vec::new())).await.1.unwrap();

        let (updated, persisted) = cache.update_settings(|s| s.enable_auto_scan = false).await;
        persisted.unwrap();
        assert!(!updated.enable_auto_scan);

        let blob = store.blob().unwrap();
        assert_eq!(blob["enableAutoScan"], false);
        assert_eq!(blob["cachedSnapshot"]["checkedAt"], 3);
    }
}
