//! exthealth - extension health monitor CLI
//!
//! ## Commands
//!
//! - `scan`: run one scan now and print the report
//! - `status`: print the cached snapshot without scanning
//! - `watch`: run the monitor (startup scan + auto-scan timer) until Ctrl-C
//! - `config`: show or change auto-scan settings

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, Level};

use exthealth_core::{
    init_tracing, render_snapshot_md, render_snapshot_text, HealthMonitor, HealthStatus,
    ManifestDir, MonitorConfig, MonitorDeps, Notifier, ScanOrigin, ScanOutcome, Snapshot,
    SnapshotListener, SystemClock, METRICS,
};
use exthealth_state::JsonFileSettingsStore;

#[derive(Parser)]
#[command(name = "exthealth")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Recency-based health checks for installed extensions", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Directory containing one folder per installed extension
    #[arg(long, global = true, env = "EXTHEALTH_PLUGINS_DIR", default_value = ".")]
    plugins_dir: PathBuf,

    /// Settings file (auto-scan options and the cached snapshot)
    #[arg(
        long,
        global = true,
        env = "EXTHEALTH_SETTINGS",
        default_value = ".exthealth/settings.json"
    )]
    settings: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan installed extensions now
    Scan {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Show the last cached scan
    Status {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Run the monitor until interrupted
    Watch,

    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args)]
struct ViewArgs {
    /// Render as markdown
    #[arg(long)]
    md: bool,

    /// Only show extensions with this status (green, yellow, red, black)
    #[arg(long, value_parser = parse_status)]
    status: Option<HealthStatus>,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print current settings
    Show,
    /// Turn periodic scanning on or off
    AutoScan {
        #[arg(value_enum)]
        state: Toggle,
    },
    /// Set the auto-scan interval in hours (clamped to 1..=168 when armed)
    Interval {
        #[arg(allow_negative_numbers = true)]
        hours: f64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

fn parse_status(s: &str) -> std::result::Result<HealthStatus, String> {
    s.parse()
}

/// Prints notices to stdout.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        println!("{message}");
    }
}

/// Redraws the report whenever the cached snapshot changes.
struct ConsoleRenderer {
    md: bool,
}

impl SnapshotListener for ConsoleRenderer {
    fn on_snapshot_replaced(&self, snapshot: &Arc<Snapshot>) {
        print!("{}", render(Some(snapshot.as_ref()), self.md, None));
    }
}

fn render(snapshot: Option<&Snapshot>, md: bool, status: Option<HealthStatus>) -> String {
    if md {
        render_snapshot_md(snapshot, status)
    } else {
        render_snapshot_text(snapshot, status)
    }
}

async fn open_monitor(cli: &Cli, startup_scan: bool) -> Result<HealthMonitor> {
    let extensions = Arc::new(ManifestDir::new(&cli.plugins_dir));
    let deps = MonitorDeps {
        registry: extensions.clone(),
        timestamps: extensions,
        store: Arc::new(JsonFileSettingsStore::new(&cli.settings)),
        notifier: Arc::new(ConsoleNotifier),
        clock: Arc::new(SystemClock),
    };
    let config = MonitorConfig {
        startup_scan,
        ..MonitorConfig::default()
    };
    HealthMonitor::start(deps, config)
        .await
        .context("failed to start health monitor")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    init_tracing(cli.json, level);

    match &cli.command {
        Commands::Scan { view } => cmd_scan(&cli, view).await,
        Commands::Status { view } => cmd_status(&cli, view).await,
        Commands::Watch => cmd_watch(&cli).await,
        Commands::Config { action } => cmd_config(&cli, action).await,
    }
}

async fn cmd_scan(cli: &Cli, view: &ViewArgs) -> Result<()> {
    let monitor = open_monitor(cli, false).await?;
    monitor.shutdown();

    match monitor.request_scan(ScanOrigin::Manual).await {
        ScanOutcome::Completed {
            snapshot,
            persisted,
        } => {
            print!("{}", render(Some(&snapshot), view.md, view.status));
            if let Err(e) = persisted {
                anyhow::bail!("scan results were not saved: {e}");
            }
        }
        ScanOutcome::AlreadyRunning => {}
    }
    Ok(())
}

async fn cmd_status(cli: &Cli, view: &ViewArgs) -> Result<()> {
    let monitor = open_monitor(cli, false).await?;
    monitor.shutdown();
    let snapshot = monitor.cached_snapshot();
    print!("{}", render(snapshot.as_deref(), view.md, view.status));
    Ok(())
}

async fn cmd_watch(cli: &Cli) -> Result<()> {
    let monitor = open_monitor(cli, true).await?;
    if let Some(snapshot) = monitor.startup_scan().await.as_ref().and_then(ScanOutcome::snapshot) {
        print!("{}", render(Some(snapshot.as_ref()), false, None));
    }
    monitor.add_listener(Arc::new(ConsoleRenderer { md: false }));

    let settings = monitor.settings();
    match monitor.armed_interval() {
        Some(period) => info!(
            interval_secs = period.as_secs(),
            "auto-scan enabled, watching {}",
            cli.plugins_dir.display()
        ),
        None => info!(
            enabled = settings.enable_auto_scan,
            "auto-scan disabled, only the startup scan will run"
        ),
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;
    monitor.shutdown();
    METRICS.flush();
    Ok(())
}

async fn cmd_config(cli: &Cli, action: &ConfigAction) -> Result<()> {
    let monitor = open_monitor(cli, false).await?;
    monitor.shutdown();

    match action {
        ConfigAction::Show => {}
        ConfigAction::AutoScan { state } => monitor
            .set_auto_scan_enabled(matches!(state, Toggle::On))
            .await
            .context("failed to save settings")?,
        ConfigAction::Interval { hours } => monitor
            .set_interval_hours(*hours)
            .await
            .context("failed to save settings")?,
    }

    let settings = monitor.settings();
    let view = serde_json::json!({
        "enableAutoScan": settings.enable_auto_scan,
        "autoScanIntervalHours": settings.auto_scan_interval_hours,
        "effectiveIntervalHours": settings.effective_interval().as_secs_f64() / 3600.0,
        "hasCachedSnapshot": monitor.cached_snapshot().is_some(),
    });
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn status_filter_parses() {
        let cli = Cli::try_parse_from(["exthealth", "scan", "--status", "black", "--md"]).unwrap();
        match cli.command {
            Commands::Scan { view } => {
                assert!(view.md);
                assert_eq!(view.status, Some(HealthStatus::Black));
            }
            _ => panic!("expected scan"),
        }
    }

    #[test]
    fn negative_interval_is_accepted_for_clamping() {
        let cli = Cli::try_parse_from(["exthealth", "config", "interval", "-5"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigAction::Interval { hours }
            } if hours == -5.0
        ));
    }

    #[tokio::test]
    async fn scan_then_status_reads_the_same_file() {
        let dir = tempfile::tempdir().unwrap();
        let plugins = dir.path().join("plugins");
        std::fs::create_dir_all(plugins.join("foo")).unwrap();
        std::fs::write(
            plugins.join("foo/manifest.json"),
            r#"{"id":"foo","name":"Foo","version":"1.0.0"}"#,
        )
        .unwrap();
        let settings = dir.path().join("settings.json");

        let cli = Cli::try_parse_from([
            "exthealth",
            "--plugins-dir",
            plugins.to_str().unwrap(),
            "--settings",
            settings.to_str().unwrap(),
            "scan",
        ])
        .unwrap();
        let Commands::Scan { view } = &cli.command else {
            panic!("expected scan");
        };
        cmd_scan(&cli, view).await.unwrap();

        let monitor = open_monitor(&cli, false).await.unwrap();
        monitor.shutdown();
        let snapshot = monitor.cached_snapshot().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.results[0].id, "foo");
        assert_eq!(snapshot.results[0].update_score, 100);
    }
}
