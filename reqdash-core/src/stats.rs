//! Dashboard summary counts and the rules for where they come from.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::models::{RequirementRecord, ReviewStatus};
use crate::service::{ServiceError, StatsResponse};

/// Aggregate requirement counts by status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total: u64,
    pub approved: u64,
    #[serde(rename = "inReview")]
    pub in_review: u64,
}

impl StatsSnapshot {
    /// Builds a snapshot, raising `total` if the parts exceed it so the
    /// counts always add up.
    pub fn new(total: u64, approved: u64, in_review: u64) -> Self {
        let counted = approved.saturating_add(in_review);
        Self {
            total: total.max(counted),
            approved,
            in_review,
        }
    }

    /// Counts the statuses of `records` directly
    pub fn from_records(records: &[RequirementRecord]) -> Self {
        let count = |status: ReviewStatus| records.iter().filter(|r| r.status == status).count() as u64;
        Self {
            total: records.len() as u64,
            approved: count(ReviewStatus::Approved),
            in_review: count(ReviewStatus::Review),
        }
    }

    pub fn disapproved(&self) -> u64 {
        self.total
            .saturating_sub(self.approved)
            .saturating_sub(self.in_review)
    }
}

impl From<StatsResponse> for StatsSnapshot {
    fn from(response: StatsResponse) -> Self {
        StatsSnapshot::new(response.total, response.approved, response.in_review)
    }
}

/// Where refreshed stats come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatsSource {
    /// Ask the requirements service
    #[default]
    Remote,
    /// Recount the local collection
    Local,
}

/// Owns the displayed snapshot. A snapshot is always taken wholly from
/// one source, never merged.
#[derive(Debug, Clone, Default)]
pub struct StatsReconciler {
    snapshot: StatsSnapshot,
    source: StatsSource,
}

impl StatsReconciler {
    pub fn new(source: StatsSource) -> Self {
        Self {
            snapshot: StatsSnapshot::default(),
            source,
        }
    }

    pub fn source(&self) -> StatsSource {
        self.source
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.snapshot
    }

    /// Takes the result of a remote stats call. On failure the previous
    /// snapshot stays and the error is only logged.
    pub fn apply_remote(&mut self, result: Result<StatsResponse, ServiceError>) -> bool {
        match result {
            Ok(response) => {
                self.snapshot = response.into();
                debug!("Stats refreshed from service: {:?}", self.snapshot);
                true
            }
            Err(e) => {
                warn!("Failed to refresh stats, keeping previous snapshot: {}", e);
                false
            }
        }
    }

    /// Replaces the snapshot with a recount of `records`
    pub fn recompute(&mut self, records: &[RequirementRecord]) {
        self.snapshot = StatsSnapshot::from_records(records);
        debug!("Stats recomputed locally: {:?}", self.snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: ReviewStatus) -> RequirementRecord {
        let mut r = RequirementRecord::new(Some("id".into()), "text".into(), String::new());
        r.status = status;
        r
    }

    #[test]
    fn test_from_records() {
        let records = vec![
            record(ReviewStatus::Approved),
            record(ReviewStatus::Review),
            record(ReviewStatus::Disapproved),
            record(ReviewStatus::Disapproved),
        ];
        let stats = StatsSnapshot::from_records(&records);
        assert_eq!(stats.total, 4);
        assert_eq!(stats.approved, 1);
        assert_eq!(stats.in_review, 1);
        assert_eq!(stats.disapproved(), 2);
    }

    #[test]
    fn test_new_clamps_total() {
        let stats = StatsSnapshot::new(3, 4, 1);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.disapproved(), 0);
        assert_eq!(stats.approved + stats.in_review + stats.disapproved(), stats.total);
    }

    #[test]
    fn test_apply_remote_success_replaces_snapshot() {
        let mut reconciler = StatsReconciler::new(StatsSource::Remote);
        let applied = reconciler.apply_remote(Ok(StatsResponse {
            total: 5,
            approved: 2,
            in_review: 2,
        }));
        assert!(applied);
        assert_eq!(reconciler.snapshot(), StatsSnapshot::new(5, 2, 2));
        assert_eq!(reconciler.snapshot().disapproved(), 1);
    }

    #[test]
    fn test_apply_remote_failure_keeps_previous() {
        let mut reconciler = StatsReconciler::new(StatsSource::Remote);
        reconciler.apply_remote(Ok(StatsResponse {
            total: 3,
            approved: 1,
            in_review: 2,
        }));
        let before = reconciler.snapshot();

        let applied = reconciler.apply_remote(Err(ServiceError::Status {
            status: 500,
            message: "Internal server error".into(),
        }));
        assert!(!applied);
        assert_eq!(reconciler.snapshot(), before);
    }

    #[test]
    fn test_stats_source_yaml() {
        let source: StatsSource = serde_yaml::from_str("local").unwrap();
        assert_eq!(source, StatsSource::Local);
        assert_eq!(StatsSource::default(), StatsSource::Remote);
    }
}
