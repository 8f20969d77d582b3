//! Scan aggregator.
//!
//! Turns the installed-extension list into one [`Snapshot`]: looks up each
//! extension's timestamp, scores it, sorts worst-first and counts statuses.
//! Lookup failures and timeouts are logged and scored as "date unknown";
//! they never abort the scan.

use std::time::Duration;

use futures::future::join_all;

use crate::classifier::assess;
use crate::domain::{ExtensionDescriptor, HostError, Snapshot};
use crate::host::{Clock, TimestampProvider};
use crate::metrics::METRICS;
use crate::obs;

/// Default bound on a single timestamp lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Look up one timestamp, mapping every failure to `None`.
pub async fn lookup_timestamp(
    timestamps: &dyn TimestampProvider,
    id: &str,
    timeout: Duration,
) -> Option<i64> {
    let result = match tokio::time::timeout(timeout, timestamps.last_modified(id)).await {
        Ok(result) => result,
        Err(_elapsed) => Err(HostError::Timeout {
            id: id.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        }),
    };

    match result {
        Ok(ts) => ts,
        Err(e) => {
            METRICS.inc_lookup_failures();
            obs::emit_lookup_failed(id, &e);
            None
        }
    }
}

/// Build a snapshot with exactly one record per descriptor.
///
/// `now` is read once after every lookup has settled and is used both as
/// the scoring reference and as `checked_at`.
pub async fn aggregate(
    descriptors: &[ExtensionDescriptor],
    timestamps: &dyn TimestampProvider,
    clock: &dyn Clock,
    lookup_timeout: Duration,
) -> Snapshot {
    let lookups = descriptors
        .iter()
        .map(|d| lookup_timestamp(timestamps, &d.id, lookup_timeout));
    let last_updated = join_all(lookups).await;

    let now = clock.now_ms();
    let records = descriptors
        .iter()
        .zip(last_updated)
        .map(|(d, ts)| assess(d, ts, now))
        .collect();

    Snapshot::from_records(now, records)
}
