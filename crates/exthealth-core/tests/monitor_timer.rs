mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{Harness, NOW};
use exthealth_core::host::fakes::{GatedTimestamps, MemoryTimestamps};
use exthealth_core::{HealthError, HealthMonitor, MonitorConfig, ScanOrigin};
use exthealth_state::fakes::MemorySettingsStore;
use serde_json::json;

const HOUR: Duration = Duration::from_secs(3600);

async fn start(blob: serde_json::Value) -> (Harness, HealthMonitor) {
    let h = Harness::new(&["foo"], MemorySettingsStore::with_blob(blob));
    let timestamps = Arc::new(MemoryTimestamps::new().with("foo", Some(NOW)));
    let config = MonitorConfig {
        startup_scan: false,
        ..MonitorConfig::default()
    };
    let monitor = HealthMonitor::start(h.deps(timestamps), config)
        .await
        .unwrap();
    (h, monitor)
}

/// Lookups block until released; the timeout is long enough to never fire.
async fn start_gated(
    blob: serde_json::Value,
) -> (Harness, Arc<GatedTimestamps<MemoryTimestamps>>, HealthMonitor) {
    let h = Harness::new(&["foo"], MemorySettingsStore::with_blob(blob));
    let gated = Arc::new(GatedTimestamps::new(
        MemoryTimestamps::new().with("foo", Some(NOW)),
    ));
    let config = MonitorConfig {
        lookup_timeout: HOUR * 1000,
        startup_scan: false,
    };
    let monitor = HealthMonitor::start(h.deps(gated.clone()), config)
        .await
        .unwrap();
    (h, gated, monitor)
}

#[tokio::test(start_paused = true)]
async fn timer_fires_silently_at_the_armed_interval() {
    let (h, monitor) = start(json!({ "enableAutoScan": true, "autoScanIntervalHours": 2 })).await;
    assert_eq!(monitor.armed_interval(), Some(HOUR * 2));

    tokio::time::sleep(HOUR * 2 - Duration::from_secs(1)).await;
    assert_eq!(h.registry.enumerations(), 0);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(h.registry.enumerations(), 1);
    assert!(monitor.cached_snapshot().is_some());
    assert_eq!(h.store.save_count(), 1);
    assert!(h.notifier.messages().is_empty());

    tokio::time::sleep(HOUR * 2).await;
    assert_eq!(h.registry.enumerations(), 2);
}

#[tokio::test(start_paused = true)]
async fn out_of_range_intervals_are_clamped_when_armed() {
    for (hours, expected) in [(0.0, HOUR), (-5.0, HOUR), (500.0, HOUR * 168), (12.0, HOUR * 12)] {
        let (_h, monitor) = start(json!({ "enableAutoScan": true, "autoScanIntervalHours": hours })).await;
        assert_eq!(monitor.armed_interval(), Some(expected), "hours = {hours}");
        monitor.shutdown();
    }
}

#[tokio::test(start_paused = true)]
async fn disabling_auto_scan_stops_future_firings() {
    let (h, monitor) = start(json!({ "enableAutoScan": true, "autoScanIntervalHours": 1 })).await;
    monitor.set_auto_scan_enabled(false).await.unwrap();
    assert!(monitor.armed_interval().is_none());
    assert_eq!(h.store.blob().unwrap()["enableAutoScan"], false);

    tokio::time::sleep(HOUR * 5).await;
    assert_eq!(h.registry.enumerations(), 0);
}

#[tokio::test(start_paused = true)]
async fn enabling_auto_scan_arms_a_timer() {
    let (h, monitor) = start(json!({ "enableAutoScan": false, "autoScanIntervalHours": 3 })).await;
    assert!(monitor.armed_interval().is_none());

    monitor.set_auto_scan_enabled(true).await.unwrap();
    assert_eq!(monitor.armed_interval(), Some(HOUR * 3));

    tokio::time::sleep(HOUR * 3 + Duration::from_secs(1)).await;
    assert_eq!(h.registry.enumerations(), 1);
}

#[tokio::test(start_paused = true)]
async fn interval_change_waits_for_rearm() {
    let (h, monitor) = start(json!({ "enableAutoScan": true, "autoScanIntervalHours": 24 })).await;

    monitor.set_interval_hours(12.0).await.unwrap();
    assert_eq!(monitor.armed_interval(), Some(HOUR * 24));
    assert_eq!(monitor.effective_interval(), HOUR * 12);
    assert_eq!(h.store.blob().unwrap()["autoScanIntervalHours"], 12.0);

    assert_eq!(monitor.rearm_timer().unwrap(), Some(HOUR * 12));
    assert_eq!(monitor.armed_interval(), Some(HOUR * 12));

    tokio::time::sleep(HOUR * 12 + Duration::from_secs(1)).await;
    assert_eq!(h.registry.enumerations(), 1);
}

#[tokio::test(start_paused = true)]
async fn rearm_with_auto_scan_off_leaves_no_timer() {
    let (_h, monitor) = start(json!({ "enableAutoScan": false })).await;
    assert_eq!(monitor.rearm_timer().unwrap(), None);
    assert!(monitor.armed_interval().is_none());
}

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_the_timer() {
    let (h, monitor) = start(json!({ "enableAutoScan": true, "autoScanIntervalHours": 1 })).await;
    monitor.shutdown();
    assert!(monitor.armed_interval().is_none());

    tokio::time::sleep(HOUR * 3).await;
    assert_eq!(h.registry.enumerations(), 0);
    assert!(matches!(monitor.rearm_timer(), Err(HealthError::ShutDown)));

    // Enabling after shutdown persists but does not arm.
    monitor.set_auto_scan_enabled(true).await.unwrap();
    assert!(monitor.armed_interval().is_none());
}

#[tokio::test(start_paused = true)]
async fn dropping_the_last_handle_stops_the_timer() {
    let (h, monitor) = start(json!({ "enableAutoScan": true, "autoScanIntervalHours": 1 })).await;
    drop(monitor);
    tokio::time::sleep(HOUR * 3).await;
    assert_eq!(h.registry.enumerations(), 0);
}

#[tokio::test(start_paused = true)]
async fn disabling_mid_scan_lets_the_timer_scan_finish() {
    let (h, gated, monitor) =
        start_gated(json!({ "enableAutoScan": true, "autoScanIntervalHours": 1 })).await;
    tokio::time::sleep(HOUR + Duration::from_secs(1)).await;
    assert_eq!(gated.started(), 1);
    assert!(monitor.is_scanning());

    monitor.set_auto_scan_enabled(false).await.unwrap();
    assert!(monitor.armed_interval().is_none());

    gated.release(1);
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(!monitor.is_scanning());
    assert!(monitor.cached_snapshot().is_some());
    let blob = h.store.blob().unwrap();
    assert_eq!(blob["enableAutoScan"], false);
    assert_eq!(blob["cachedSnapshot"]["checkedAt"], NOW);
}

#[tokio::test(start_paused = true)]
async fn rearm_mid_scan_lets_the_timer_scan_finish() {
    let (h, gated, monitor) =
        start_gated(json!({ "enableAutoScan": true, "autoScanIntervalHours": 1 })).await;
    tokio::time::sleep(HOUR + Duration::from_secs(1)).await;
    assert!(monitor.is_scanning());

    monitor.set_interval_hours(2.0).await.unwrap();
    assert_eq!(monitor.rearm_timer().unwrap(), Some(HOUR * 2));

    gated.release(1);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(!monitor.is_scanning());
    assert!(monitor.cached_snapshot().is_some());
    assert_eq!(h.store.blob().unwrap()["cachedSnapshot"]["checkedAt"], NOW);
    assert_eq!(h.registry.enumerations(), 1);

    // The replacement timer runs on the new period.
    tokio::time::sleep(HOUR * 2).await;
    assert_eq!(h.registry.enumerations(), 2);
}

#[tokio::test(start_paused = true)]
async fn timer_tick_during_a_manual_scan_is_dropped_silently() {
    let (h, gated, monitor) =
        start_gated(json!({ "enableAutoScan": true, "autoScanIntervalHours": 1 })).await;

    let manual = tokio::spawn({
        let monitor = monitor.clone();
        async move { monitor.request_scan(ScanOrigin::Manual).await }
    });
    while gated.started() < 1 {
        tokio::task::yield_now().await;
    }

    tokio::time::sleep(HOUR + Duration::from_secs(1)).await;
    assert_eq!(h.registry.enumerations(), 1, "tick must not start a second scan");
    assert!(h.notifier.messages().is_empty());

    gated.release(1);
    let outcome = manual.await.unwrap();
    assert!(outcome.snapshot().is_some());

    let messages = h.notifier.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("scan complete"));
    assert_eq!(monitor.armed_interval(), Some(HOUR));
}
