//! Per-extension health record and status bands.

use serde::{Deserialize, Serialize};

/// Discrete health band. Declaration order is from healthiest to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Green,
    Yellow,
    Red,
    Black,
}

impl HealthStatus {
    /// All statuses, healthiest first.
    pub const ALL: [HealthStatus; 4] = [
        HealthStatus::Green,
        HealthStatus::Yellow,
        HealthStatus::Red,
        HealthStatus::Black,
    ];

    /// Sort rank: higher is more severe.
    pub fn severity(self) -> u8 {
        match self {
            HealthStatus::Green => 1,
            HealthStatus::Yellow => 2,
            HealthStatus::Red => 3,
            HealthStatus::Black => 4,
        }
    }

    /// Human-facing label.
    pub fn label(self) -> &'static str {
        match self {
            HealthStatus::Green => "Healthy",
            HealthStatus::Yellow => "Monitor",
            HealthStatus::Red => "Concerning",
            HealthStatus::Black => "Abandoned",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HealthStatus::Green => "green",
            HealthStatus::Yellow => "yellow",
            HealthStatus::Red => "red",
            HealthStatus::Black => "black",
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HealthStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "green" | "healthy" => Ok(HealthStatus::Green),
            "yellow" | "monitor" => Ok(HealthStatus::Yellow),
            "red" | "concerning" => Ok(HealthStatus::Red),
            "black" | "abandoned" => Ok(HealthStatus::Black),
            other => Err(format!("unknown health status: {other}")),
        }
    }
}

/// Scored health of one extension at scan time.
///
/// Built by [`crate::classifier::assess`]; `health_status` is always derived
/// from `health_score` and recency, never set on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthRecord {
    pub id: String,
    pub name: String,
    pub version: String,
    /// Epoch milliseconds of the last known update, `None` when unknown.
    pub last_updated: Option<i64>,
    pub update_score: u8,
    pub support_score: u8,
    pub activity_score: u8,
    pub compatibility_score: u8,
    pub health_score: u8,
    pub health_status: HealthStatus,
    pub summary: String,
}
