//! Plain-text and markdown rendering of a snapshot.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::domain::{HealthRecord, HealthStatus, Snapshot};

pub const NO_DATA_MESSAGE: &str = "No scan data yet. Run a scan to check extension health.";

fn format_checked_at(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| format!("{ms} (invalid timestamp)"))
}

fn format_last_updated(ms: Option<i64>) -> String {
    ms.and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn visible<'a>(
    snapshot: &'a Snapshot,
    filter: Option<HealthStatus>,
) -> Box<dyn Iterator<Item = &'a HealthRecord> + 'a> {
    match filter {
        Some(status) => Box::new(snapshot.with_status(status)),
        None => Box::new(snapshot.results.iter()),
    }
}

/// Render a snapshot for a terminal, optionally restricted to one status.
pub fn render_snapshot_text(snapshot: Option<&Snapshot>, filter: Option<HealthStatus>) -> String {
    let Some(snapshot) = snapshot else {
        return format!("{NO_DATA_MESSAGE}\n");
    };

    let mut out = String::new();
    out.push_str(&format!(
        "Extension health: {} extensions, checked at {}\n",
        snapshot.len(),
        format_checked_at(snapshot.checked_at)
    ));
    out.push_str(&format!(
        "  {} healthy | {} monitor | {} concerning | {} abandoned\n\n",
        snapshot.summary.green, snapshot.summary.yellow, snapshot.summary.red, snapshot.summary.black
    ));

    let mut shown = 0;
    for r in visible(snapshot, filter) {
        out.push_str(&format!(
            "[{:<10}] {:>3}  {} {} ({})\n             {}\n",
            r.health_status.label(),
            r.health_score,
            r.name,
            r.version,
            r.id,
            r.summary
        ));
        shown += 1;
    }
    if shown == 0 {
        out.push_str("No extensions match.\n");
    }
    out
}

/// Render a snapshot as a markdown table.
pub fn render_snapshot_md(snapshot: Option<&Snapshot>, filter: Option<HealthStatus>) -> String {
    let Some(snapshot) = snapshot else {
        return format!("# Extension Health\n\n{NO_DATA_MESSAGE}\n");
    };

    let mut out = String::new();
    out.push_str("# Extension Health\n\n");
    out.push_str(&format!(
        "Checked at {}.\n\n",
        format_checked_at(snapshot.checked_at)
    ));
    out.push_str("| Status | Count |\n|---|---|\n");
    for status in HealthStatus::ALL {
        out.push_str(&format!(
            "| {} | {} |\n",
            status.label(),
            snapshot.summary.count(status)
        ));
    }
    out.push('\n');

    out.push_str("| Extension | Version | Status | Score | Last updated | Summary |\n");
    out.push_str("|---|---|---|---|---|---|\n");
    for r in visible(snapshot, filter) {
        out.push_str(&format!(
            "| {} (`{}`) | {} | {} | {} | {} | {} |\n",
            r.name.replace('|', "\\|"),
            r.id,
            r.version,
            r.health_status.label(),
            r.health_score,
            format_last_updated(r.last_updated),
            r.summary
        ));
    }
    out
}
