//! Recency classifier.
//!
//! Pure scoring: a last-updated timestamp (or its absence) and an explicit
//! "now" go in, component scores, a weighted health score, a status band
//! and a summary line come out. Every input maps to a defined output.

use crate::domain::{ExtensionDescriptor, HealthRecord, HealthStatus};

/// Length of a scoring month in milliseconds (30 days).
pub const MONTH_MS: i64 = 30 * 24 * 60 * 60 * 1000;

/// Months since update at which an extension counts as abandoned.
pub const ABANDONED_MONTHS: f64 = 24.0;

/// Lowest health score an abandoned extension can carry.
pub const RISK_FLOOR: u8 = 15;

pub const SUPPORT_BASELINE: u8 = 40;
pub const ACTIVITY_BASELINE: u8 = 50;
pub const COMPATIBILITY_BASELINE: u8 = 70;

// Weights in percent: update, support, activity, compatibility.
const WEIGHTS: [u32; 4] = [40, 25, 20, 15];

/// Scores and band for one timestamp, before it is attached to a descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assessment {
    pub update_score: u8,
    pub support_score: u8,
    pub activity_score: u8,
    pub compatibility_score: u8,
    pub health_score: u8,
    pub health_status: HealthStatus,
    pub summary: String,
}

/// Months elapsed between `last_updated` and `now_ms`.
///
/// Absent timestamps are unbounded (`f64::INFINITY`). Timestamps in the
/// future count as zero months.
pub fn months_since(last_updated: Option<i64>, now_ms: i64) -> f64 {
    match last_updated {
        Some(ts) => (now_ms.saturating_sub(ts).max(0)) as f64 / MONTH_MS as f64,
        None => f64::INFINITY,
    }
}

/// Update score band, closed-open on months since update.
pub fn update_score(months: f64) -> u8 {
    if months < 3.0 {
        100
    } else if months < 6.0 {
        85
    } else if months < 12.0 {
        60
    } else if months < ABANDONED_MONTHS {
        30
    } else {
        // 24+ months and unknown dates both land here.
        0
    }
}

/// Weighted blend of the four components, rounded half-up.
pub fn weighted_score(update: u8, support: u8, activity: u8, compatibility: u8) -> u8 {
    let parts = [update, support, activity, compatibility];
    let total: u32 = parts
        .iter()
        .zip(WEIGHTS.iter())
        .map(|(score, weight)| u32::from(*score) * weight)
        .sum();
    // total is at most 100 * 100, so the rounded quotient fits in a u8.
    ((total + 50) / 100).min(100) as u8
}

/// Band for a score, with recency overriding the score for abandoned extensions.
pub fn status_for(score: u8, months: f64) -> HealthStatus {
    if months >= ABANDONED_MONTHS {
        return HealthStatus::Black;
    }
    match score {
        80..=u8::MAX => HealthStatus::Green,
        55..=79 => HealthStatus::Yellow,
        30..=54 => HealthStatus::Red,
        _ => HealthStatus::Black,
    }
}

/// Human-readable recency phrase.
pub fn recency_phrase(last_updated: Option<i64>, now_ms: i64) -> &'static str {
    if last_updated.is_none() {
        return "date unavailable";
    }
    let months = months_since(last_updated, now_ms);
    if months < 1.0 {
        "this month"
    } else if months < 3.0 {
        "recently"
    } else if months < 6.0 {
        "within 6 months"
    } else if months < 12.0 {
        "within a year"
    } else if months < ABANDONED_MONTHS {
        "over a year ago"
    } else {
        "2+ years ago"
    }
}

/// Score a timestamp against `now_ms`.
pub fn classify(last_updated: Option<i64>, now_ms: i64) -> Assessment {
    let months = months_since(last_updated, now_ms);
    let update = update_score(months);

    let mut health_score = weighted_score(
        update,
        SUPPORT_BASELINE,
        ACTIVITY_BASELINE,
        COMPATIBILITY_BASELINE,
    );
    if months >= ABANDONED_MONTHS {
        health_score = health_score.max(RISK_FLOOR);
    }
    let health_status = status_for(health_score, months);

    let phrase = recency_phrase(last_updated, now_ms);
    let summary = match last_updated {
        Some(_) => format!("{} - updated {}", health_status.label(), phrase),
        None => format!("{} - {}", health_status.label(), phrase),
    };

    Assessment {
        update_score: update,
        support_score: SUPPORT_BASELINE,
        activity_score: ACTIVITY_BASELINE,
        compatibility_score: COMPATIBILITY_BASELINE,
        health_score,
        health_status,
        summary,
    }
}

/// Build the full record for one extension.
pub fn assess(
    descriptor: &ExtensionDescriptor,
    last_updated: Option<i64>,
    now_ms: i64,
) -> HealthRecord {
    let a = classify(last_updated, now_ms);
    HealthRecord {
        id: descriptor.id.clone(),
        name: descriptor.name.clone(),
        version: descriptor.version.clone(),
        last_updated,
        update_score: a.update_score,
        support_score: a.support_score,
        activity_score: a.activity_score,
        compatibility_score: a.compatibility_score,
        health_score: a.health_score,
        health_status: a.health_status,
        summary: a.summary,
    }
}
