//! Host collaborator seams.
//!
//! The monitor never talks to the host directly. It goes through these
//! traits:
//! - [`ExtensionRegistry`]: synchronous enumeration of installed extensions
//! - [`TimestampProvider`]: async last-modified lookup per extension
//! - [`Notifier`]: fire-and-forget user-visible notices
//! - [`Clock`]: the current time, injected so scoring stays deterministic
//!
//! In-memory fakes live in [`fakes`]; filesystem-backed adapters in [`fs`].

use async_trait::async_trait;

use crate::domain::{ExtensionDescriptor, HostResult};

pub mod fakes;
pub mod fs;

/// Enumerates installed extensions.
pub trait ExtensionRegistry: Send + Sync {
    fn installed(&self) -> Vec<ExtensionDescriptor>;
}

/// Looks up when an extension was last modified.
///
/// `Ok(None)` means the host knows the extension but has no timestamp.
#[async_trait]
pub trait TimestampProvider: Send + Sync {
    /// Epoch milliseconds of the extension's last modification.
    async fn last_modified(&self, id: &str) -> HostResult<Option<i64>>;
}

/// Short user-visible notices.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Source of "now" in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// Wall clock backed by `chrono::Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Notifier that routes notices into the tracing log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str) {
        tracing::info!(event = "notice", message = %message);
    }
}
