//! Structured observability hooks for the scan lifecycle.
//!
//! Every scan runs inside a span tagged with its `scan_id` and origin.
//! Lifecycle events are emitted at `info!`; per-item and persistence
//! failures at `warn!`.

use tracing::{info, warn};

use crate::domain::HealthSummary;

/// Span covering one scan. Attach with `tracing::Instrument::instrument`
/// so it stays valid across await points.
pub fn scan_span(scan_id: &str, origin: &str) -> tracing::Span {
    tracing::info_span!("exthealth.scan", scan_id = %scan_id, origin = %origin)
}

pub fn emit_scan_started(scan_id: &str, origin: &str, extensions: usize) {
    info!(event = "scan.started", scan_id = %scan_id, origin = %origin, extensions = extensions);
}

/// Emit event: scan finished with duration and per-status counts.
pub fn emit_scan_finished(scan_id: &str, origin: &str, duration_ms: u64, summary: &HealthSummary) {
    info!(
        event = "scan.finished",
        scan_id = %scan_id,
        origin = %origin,
        duration_ms = duration_ms,
        records = summary.total(),
        green = summary.green,
        yellow = summary.yellow,
        red = summary.red,
        black = summary.black,
    );
}

/// Emit event: a scan request arrived while another scan was running.
pub fn emit_scan_rejected(origin: &str) {
    info!(event = "scan.rejected", origin = %origin, reason = "already running");
}

pub fn emit_lookup_failed(extension_id: &str, error: &dyn std::fmt::Display) {
    warn!(event = "lookup.failed", extension_id = %extension_id, error = %error);
}

pub fn emit_persist_failed(error: &dyn std::fmt::Display) {
    warn!(event = "persist.failed", error = %error);
}

pub fn emit_timer_armed(interval_ms: u64) {
    info!(event = "timer.armed", interval_ms = interval_ms);
}

pub fn emit_timer_cancelled() {
    info!(event = "timer.cancelled");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_span_create() {
        // Works with or without a subscriber installed.
        let span = scan_span("scan-1", "manual");
        let _entered = span.enter();
        emit_scan_started("scan-1", "manual", 3);
    }
}
