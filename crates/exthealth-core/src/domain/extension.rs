//! Installed-extension descriptor supplied by the host registry.

use serde::{Deserialize, Serialize};

/// Identity of an installed extension. Read-only input to a scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExtensionDescriptor {
    /// Unique identifier within the host.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Version string as declared by the extension.
    pub version: String,
}

impl ExtensionDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            version: version.into(),
        }
    }
}
