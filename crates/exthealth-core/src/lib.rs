//! exthealth core library
//!
//! Periodically inspects installed extensions, scores each one by how
//! recently it was updated, and keeps a cached, renderable snapshot.
//!
//! ## Components
//!
//! - [`classifier`]: timestamp -> component scores -> health score -> status band
//! - [`aggregator`]: per-extension lookups and scoring into one sorted [`Snapshot`]
//! - [`scheduler`]: single-flight [`HealthMonitor`] with the auto-scan timer
//! - [`cache`]: latest snapshot plus settings, written through to the store
//! - [`host`]: registry, timestamp, notification and clock seams

pub mod aggregator;
pub mod cache;
pub mod classifier;
pub mod domain;
pub mod host;
pub mod metrics;
pub mod obs;
pub mod report;
pub mod scheduler;
pub mod settings;
pub mod telemetry;

pub use aggregator::{aggregate, DEFAULT_LOOKUP_TIMEOUT};
pub use cache::SnapshotCache;
pub use classifier::{assess, classify, Assessment};
pub use domain::{
    ExtensionDescriptor, HealthError, HealthRecord, HealthStatus, HealthSummary, HostError,
    HostResult, Result, Snapshot,
};
pub use host::fs::ManifestDir;
pub use host::{Clock, ExtensionRegistry, Notifier, SystemClock, TimestampProvider, TracingNotifier};
pub use metrics::METRICS;
pub use report::{render_snapshot_md, render_snapshot_text};
pub use scheduler::{
    HealthMonitor, MonitorConfig, MonitorDeps, ScanOrigin, ScanOutcome, SnapshotListener,
};
pub use settings::{clamp_interval_hours, interval_duration, HealthSettings};
pub use telemetry::init_tracing;

pub use exthealth_state::{JsonFileSettingsStore, SettingsStore, StoreError};

/// exthealth version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
