//! Result of one scan cycle.

use serde::{Deserialize, Serialize};

use super::record::{HealthRecord, HealthStatus};

/// Count of records per status band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub green: usize,
    pub yellow: usize,
    pub red: usize,
    pub black: usize,
}

impl HealthSummary {
    pub fn from_records(records: &[HealthRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            *summary.slot_mut(record.health_status) += 1;
        }
        summary
    }

    pub fn count(&self, status: HealthStatus) -> usize {
        match status {
            HealthStatus::Green => self.green,
            HealthStatus::Yellow => self.yellow,
            HealthStatus::Red => self.red,
            HealthStatus::Black => self.black,
        }
    }

    pub fn total(&self) -> usize {
        self.green + self.yellow + self.red + self.black
    }

    fn slot_mut(&mut self, status: HealthStatus) -> &mut usize {
        match status {
            HealthStatus::Green => &mut self.green,
            HealthStatus::Yellow => &mut self.yellow,
            HealthStatus::Red => &mut self.red,
            HealthStatus::Black => &mut self.black,
        }
    }
}

/// Complete, immutable result of one scan.
///
/// # Invariants
///
/// - `results` is ordered by descending status severity; records with equal
///   severity keep their enumeration order.
/// - `summary.total() == results.len()`.
///
/// Both hold for anything built with [`Snapshot::from_records`]. A snapshot
/// decoded from storage can be checked with [`Snapshot::is_consistent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Epoch milliseconds at scan completion.
    pub checked_at: i64,
    pub results: Vec<HealthRecord>,
    pub summary: HealthSummary,
}

impl Snapshot {
    /// Sort `records` (stable, worst first) and summarise them.
    pub fn from_records(checked_at: i64, mut records: Vec<HealthRecord>) -> Self {
        // `sort_by_key` is stable, which keeps enumeration order within a band.
        records.sort_by_key(|r| std::cmp::Reverse(r.health_status.severity()));
        let summary = HealthSummary::from_records(&records);
        Self {
            checked_at,
            results: records,
            summary,
        }
    }

    pub fn is_consistent(&self) -> bool {
        let sorted = self
            .results
            .windows(2)
            .all(|w| w[0].health_status.severity() >= w[1].health_status.severity());
        sorted && self.summary == HealthSummary::from_records(&self.results)
    }

    /// Rebuild ordering and counts, keeping `checked_at`.
    pub fn normalized(self) -> Self {
        Self::from_records(self.checked_at, self.results)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn with_status(&self, status: HealthStatus) -> impl Iterator<Item = &HealthRecord> {
        self.results.iter().filter(move |r| r.health_status == status)
    }
}
