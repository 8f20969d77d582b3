//! Domain models for exthealth.
//!
//! Canonical definitions for the core entities:
//! - `ExtensionDescriptor`: what the host registry reports for an installed extension
//! - `HealthRecord`: one scored extension within a scan
//! - `Snapshot`: the complete, sorted result of one scan

pub mod error;
pub mod extension;
pub mod record;
pub mod snapshot;

pub use error::{HealthError, HostError, HostResult, Result};
pub use extension::ExtensionDescriptor;
pub use record::{HealthRecord, HealthStatus};
pub use snapshot::{HealthSummary, Snapshot};
