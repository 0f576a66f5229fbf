use chrono::{DateTime, Duration, Utc};
use tracing::info;

use super::entities::TaskRecord;

pub const RETENTION_DAYS: i64 = 30;

/// Oldest creation time that still survives a load at `now`. The boundary itself is kept.
pub fn retention_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::days(RETENTION_DAYS)
}

/// Drops every record created before the rolling window. Dropped records are gone for good: the
/// next snapshot write no longer contains them.
pub fn retain_recent(tasks: Vec<TaskRecord>, now: DateTime<Utc>) -> Vec<TaskRecord> {
    let cutoff = retention_cutoff(now);
    let before = tasks.len();
    let kept = tasks
        .into_iter()
        .filter(|task| task.created_at >= cutoff)
        .collect::<Vec<_>>();
    if kept.len() != before {
        info!(
            "Discarded {} tasks created before {cutoff}",
            before - kept.len()
        );
    }
    kept
}
