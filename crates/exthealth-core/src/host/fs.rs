//! Filesystem-backed host adapters.
//!
//! Layout: `<root>/<extension dir>/manifest.json`, where the manifest is a
//! JSON object with at least an `id`. The manifest's modification time
//! approximates when the extension was last updated.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::UNIX_EPOCH;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{ExtensionRegistry, TimestampProvider};
use crate::domain::{ExtensionDescriptor, HostError, HostResult};

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Deserialize)]
struct Manifest {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

/// Registry and timestamp provider over a directory of extension folders.
///
/// Enumeration remembers where each id's manifest lives so later lookups
/// resolve folders whose name differs from the id.
#[derive(Debug)]
pub struct ManifestDir {
    root: PathBuf,
    manifests: Mutex<HashMap<String, PathBuf>>,
}

impl ManifestDir {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            manifests: Mutex::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_manifest(path: &Path) -> Option<Manifest> {
        let bytes = match std::fs::read(path) {
            Ok(b) => b,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable manifest, skipping");
                return None;
            }
        };
        match serde_json::from_slice::<Manifest>(&bytes) {
            Ok(m) if !m.id.trim().is_empty() => Some(m),
            Ok(_) => {
                warn!(path = %path.display(), "manifest has empty id, skipping");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed manifest, skipping");
                None
            }
        }
    }

    fn manifest_path(&self, id: &str) -> PathBuf {
        let known = self
            .manifests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(id)
            .cloned();
        known.unwrap_or_else(|| self.root.join(id).join(MANIFEST_FILE))
    }
}

impl ExtensionRegistry for ManifestDir {
    fn installed(&self) -> Vec<ExtensionDescriptor> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(root = %self.root.display(), error = %e, "cannot read extensions directory");
                return Vec::new();
            }
        };

        let mut dirs: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();

        let mut seen = HashMap::new();
        let mut descriptors = Vec::new();
        for dir in dirs {
            let path = dir.join(MANIFEST_FILE);
            if !path.is_file() {
                debug!(dir = %dir.display(), "no manifest, skipping");
                continue;
            }
            let Some(manifest) = Self::read_manifest(&path) else {
                continue;
            };
            if seen.contains_key(&manifest.id) {
                warn!(id = %manifest.id, path = %path.display(), "duplicate extension id, skipping");
                continue;
            }
            seen.insert(manifest.id.clone(), path);
            descriptors.push(ExtensionDescriptor {
                name: manifest.name.unwrap_or_else(|| manifest.id.clone()),
                version: manifest.version.unwrap_or_else(|| "unknown".to_string()),
                id: manifest.id,
            });
        }

        *self
            .manifests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = seen;
        descriptors
    }
}

#[async_trait]
impl TimestampProvider for ManifestDir {
    async fn last_modified(&self, id: &str) -> HostResult<Option<i64>> {
        let path = self.manifest_path(id);
        let meta = tokio::fs::metadata(&path).await.map_err(|source| HostError::Io {
            id: id.to_string(),
            source,
        })?;
        let Ok(modified) = meta.modified() else {
            // Platform without mtime support.
            return Ok(None);
        };
        Ok(modified
            .duration_since(UNIX_EPOCH)
            .ok()
            .and_then(|d| i64::try_from(d.as_millis()).ok()))
    }
}
