//! Single-flight scan scheduler.
//!
//! [`HealthMonitor`] owns the scan state machine (`Idle` / `Scanning`), the
//! repeating timer, the [`SnapshotCache`] and the listener list.
//!
//! - A request that arrives while a scan is running is rejected at once. It
//!   never queues and never touches the running scan. Manual requests get an
//!   "already running" notice; timer requests are dropped silently.
//! - Manual scans announce completion; startup and timer scans finish quietly.
//! - The timer period is the configured hour count clamped to `[1, 168]`.
//!   Interval changes apply on the next arm ([`HealthMonitor::rearm_timer`]
//!   or a fresh [`HealthMonitor::start`]); disabling auto-scan cancels the
//!   armed timer immediately.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};
use std::time::Duration;

use exthealth_state::SettingsStore;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, Instrument};
use uuid::Uuid;

use crate::aggregator::{aggregate, DEFAULT_LOOKUP_TIMEOUT};
use crate::cache::SnapshotCache;
use crate::domain::{HealthError, HealthSummary, Result, Snapshot};
use crate::host::{Clock, ExtensionRegistry, Notifier, TimestampProvider};
use crate::metrics::METRICS;
use crate::obs;
use crate::settings::HealthSettings;

pub const ALREADY_RUNNING_NOTICE: &str = "Extension health scan already running";

/// Who asked for a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOrigin {
    /// The one scan run at initialisation.
    Startup,
    /// Explicit user action.
    Manual,
    /// The repeating auto-scan timer.
    Timer,
}

impl ScanOrigin {
    pub fn as_str(self) -> &'static str {
        match self {
            ScanOrigin::Startup => "startup",
            ScanOrigin::Manual => "manual",
            ScanOrigin::Timer => "timer",
        }
    }

    fn announces(self) -> bool {
        self == ScanOrigin::Manual
    }
}

/// Result of a scan request.
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    /// The scan ran and its snapshot is now cached. `persisted` carries the
    /// store error message if the durable write failed.
    Completed {
        snapshot: Arc<Snapshot>,
        persisted: std::result::Result<(), String>,
    },
    /// Another scan was in progress; nothing happened.
    AlreadyRunning,
}

impl ScanOutcome {
    pub fn snapshot(&self) -> Option<&Arc<Snapshot>> {
        match self {
            ScanOutcome::Completed { snapshot, .. } => Some(snapshot),
            ScanOutcome::AlreadyRunning => None,
        }
    }
}

/// Receives every snapshot that replaces the cached one.
pub trait SnapshotListener: Send + Sync {
    fn on_snapshot_replaced(&self, snapshot: &Arc<Snapshot>);
}

/// Runtime options that are not persisted.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Bound on each timestamp lookup; expiry scores the extension as undated.
    pub lookup_timeout: Duration,
    /// Run one silent scan as part of `start`. Hosts that stay up leave
    /// this on; it exists for one-shot commands and tests that drive scans
    /// themselves.
    pub startup_scan: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            startup_scan: true,
        }
    }
}

/// Host collaborators the monitor calls into.
#[derive(Clone)]
pub struct MonitorDeps {
    pub registry: Arc<dyn ExtensionRegistry>,
    pub timestamps: Arc<dyn TimestampProvider>,
    pub store: Arc<dyn SettingsStore>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

/// Armed repeating timer. Dropping it cancels the tick loop; a timer scan
/// already in flight keeps running to completion.
struct TimerHandle {
    task: JoinHandle<()>,
    period: Duration,
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Marks the monitor as scanning for as long as it lives.
struct ScanGuard<'a>(&'a AtomicBool);

impl<'a> ScanGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ScanGuard(flag))
    }
}

impl Drop for ScanGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Default)]
struct ScanState {
    scanning: AtomicBool,
    timer: Mutex<Option<TimerHandle>>,
    startup: Mutex<Option<JoinHandle<ScanOutcome>>>,
    shut_down: AtomicBool,
}

struct Inner {
    deps: MonitorDeps,
    config: MonitorConfig,
    state: ScanState,
    cache: SnapshotCache,
    listeners: RwLock<Vec<Arc<dyn SnapshotListener>>>,
}

/// Cheaply cloneable handle to the scan scheduler.
///
/// The timer task holds only a weak reference, so dropping the last handle
/// also cancels the timer.
#[derive(Clone)]
pub struct HealthMonitor {
    inner: Arc<Inner>,
}

impl HealthMonitor {
    /// Hydrate settings and the cached snapshot, arm the timer if auto-scan
    /// is enabled, and kick off the startup scan in the background.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn start(deps: MonitorDeps, config: MonitorConfig) -> Result<Self> {
        let cache = SnapshotCache::hydrate(Arc::clone(&deps.store)).await;
        let monitor = Self {
            inner: Arc::new(Inner {
                deps,
                config,
                state: ScanState::default(),
                cache,
                listeners: RwLock::new(Vec::new()),
            }),
        };

        let settings = monitor.inner.cache.settings();
        if settings.enable_auto_scan {
            monitor.arm_timer(settings.effective_interval());
        } else {
            debug!("auto-scan disabled, timer not armed");
        }

        if monitor.inner.config.startup_scan {
            let inner = Arc::clone(&monitor.inner);
            let task = tokio::spawn(async move { inner.run_scan(ScanOrigin::Startup).await });
            *lock(&monitor.inner.state.startup) = Some(task);
        }

        Ok(monitor)
    }

    /// Run a scan now unless one is already in flight.
    pub async fn request_scan(&self, origin: ScanOrigin) -> ScanOutcome {
        self.inner.run_scan(origin).await
    }

    /// Wait for the startup scan spawned by `start`, if it is still pending.
    pub async fn startup_scan(&self) -> Option<ScanOutcome> {
        let task = lock(&self.inner.state.startup).take()?;
        task.await.ok()
    }

    pub fn cached_snapshot(&self) -> Option<Arc<Snapshot>> {
        self.inner.cache.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<Snapshot>>> {
        self.inner.cache.subscribe()
    }

    pub fn add_listener(&self, listener: Arc<dyn SnapshotListener>) {
        self.inner
            .listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(listener);
    }

    pub fn is_scanning(&self) -> bool {
        self.inner.state.scanning.load(Ordering::Acquire)
    }

    pub fn settings(&self) -> HealthSettings {
        self.inner.cache.settings()
    }

    /// Period a timer armed now would use.
    pub fn effective_interval(&self) -> Duration {
        self.settings().effective_interval()
    }

    /// Period of the currently armed timer, if any.
    pub fn armed_interval(&self) -> Option<Duration> {
        lock(&self.inner.state.timer).as_ref().map(|t| t.period)
    }

    /// Toggle auto-scan and persist the choice.
    ///
    /// Disabling releases the armed timer; enabling arms one if none is
    /// armed. The timer change stands even if the write fails.
    pub async fn set_auto_scan_enabled(&self, enabled: bool) -> Result<()> {
        let (settings, persisted) = self
            .inner
            .cache
            .update_settings(|s| s.enable_auto_scan = enabled)
            .await;

        if !enabled {
            self.cancel_timer();
        } else if self.armed_interval().is_none() && !self.is_shut_down() {
            self.arm_timer(settings.effective_interval());
        }
        persisted
    }

    /// Store a new interval. An already armed timer keeps its period until
    /// the next [`rearm_timer`](Self::rearm_timer).
    pub async fn set_interval_hours(&self, hours: f64) -> Result<()> {
        let (_, persisted) = self
            .inner
            .cache
            .update_settings(|s| s.auto_scan_interval_hours = hours)
            .await;
        persisted
    }

    /// Cancel any armed timer and arm a fresh one from current settings.
    ///
    /// Returns the new period, or `None` when auto-scan is disabled.
    pub fn rearm_timer(&self) -> Result<Option<Duration>> {
        if self.is_shut_down() {
            return Err(HealthError::ShutDown);
        }
        self.cancel_timer();
        let settings = self.settings();
        if !settings.enable_auto_scan {
            return Ok(None);
        }
        let period = settings.effective_interval();
        self.arm_timer(period);
        Ok(Some(period))
    }

    /// Cancel the timer and stop tracking the startup scan.
    ///
    /// Scans already admitted, startup and timer ones included, are detached
    /// and left to finish.
    pub fn shutdown(&self) {
        self.inner.state.shut_down.store(true, Ordering::Release);
        self.cancel_timer();
        // Dropping the handle detaches the task.
        drop(lock(&self.inner.state.startup).take());
    }

    fn is_shut_down(&self) -> bool {
        self.inner.state.shut_down.load(Ordering::Acquire)
    }

    fn arm_timer(&self, period: Duration) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                // The scan runs in its own task: aborting the tick loop must
                // not cancel a scan the gate already admitted.
                let scan = tokio::spawn(async move { inner.run_scan(ScanOrigin::Timer).await });
                if scan.await.is_err() {
                    debug!("timer scan task ended without an outcome");
                }
            }
        });

        obs::emit_timer_armed(period.as_millis() as u64);
        // Replacing an older handle drops it, which aborts its task.
        *lock(&self.inner.state.timer) = Some(TimerHandle { task, period });
    }

    fn cancel_timer(&self) {
        if lock(&self.inner.state.timer).take().is_some() {
            obs::emit_timer_cancelled();
        }
    }
}

impl Inner {
    async fn run_scan(&self, origin: ScanOrigin) -> ScanOutcome {
        let Some(_guard) = ScanGuard::acquire(&self.state.scanning) else {
            METRICS.inc_scans_rejected();
            obs::emit_scan_rejected(origin.as_str());
            if origin.announces() {
                self.deps.notifier.notify(ALREADY_RUNNING_NOTICE);
            }
            return ScanOutcome::AlreadyRunning;
        };

        let scan_id = Uuid::new_v4().to_string();
        let span = obs::scan_span(&scan_id, origin.as_str());
        self.scan(&scan_id, origin).instrument(span).await
    }

    async fn scan(&self, scan_id: &str, origin: ScanOrigin) -> ScanOutcome {
        let started = Instant::now();
        let descriptors = self.deps.registry.installed();
        obs::emit_scan_started(scan_id, origin.as_str(), descriptors.len());

        let snapshot = aggregate(
            &descriptors,
            self.deps.timestamps.as_ref(),
            self.deps.clock.as_ref(),
            self.config.lookup_timeout,
        )
        .await;

        let (snapshot, persisted) = self.cache.replace(snapshot).await;
        METRICS.inc_scans_completed();
        obs::emit_scan_finished(
            scan_id,
            origin.as_str(),
            started.elapsed().as_millis() as u64,
            &snapshot.summary,
        );

        let persisted = persisted.map_err(|e| {
            METRICS.inc_persist_failures();
            obs::emit_persist_failed(&e);
            self.deps
                .notifier
                .notify(&format!("Failed to save extension health results: {e}"));
            e.to_string()
        });

        self.notify_listeners(&snapshot);
        if origin.announces() {
            self.deps.notifier.notify(&completion_notice(&snapshot.summary));
        }

        ScanOutcome::Completed {
            snapshot,
            persisted,
        }
    }

    fn notify_listeners(&self, snapshot: &Arc<Snapshot>) {
        let listeners = self
            .listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        for listener in listeners {
            listener.on_snapshot_replaced(snapshot);
        }
    }
}

/// Notice shown when a manual scan finishes.
pub fn completion_notice(summary: &HealthSummary) -> String {
    format!(
        "Extension health scan complete: {} healthy, {} to monitor, {} concerning, {} abandoned",
        summary.green, summary.yellow, summary.red, summary.black
    )
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
