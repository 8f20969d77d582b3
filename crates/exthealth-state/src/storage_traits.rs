//! Storage trait definitions for exthealth
//!
//! `SettingsStore` is the only persistence seam: load once at startup,
//! save whenever settings or the cached snapshot change. The payload is an
//! opaque JSON value whose layout is owned by the caller.

use async_trait::async_trait;

use crate::error::StoreError;

/// Result type for storage operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Durable home for the settings blob.
///
/// Guarantees:
/// - `load()` returns `Ok(None)` when nothing has ever been saved.
/// - After `save(v)` succeeds, `load()` returns a value equal to `v`.
/// - A failed `save` leaves the previously saved value intact.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Load the most recently saved blob, if any.
    async fn load(&self) -> StoreResult<Option<serde_json::Value>>;

    /// Replace the stored blob.
    async fn save(&self, blob: &serde_json::Value) -> StoreResult<()>;
}
