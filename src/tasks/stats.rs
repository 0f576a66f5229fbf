use std::collections::HashMap;

use chrono::{DateTime, Duration, TimeZone};

use super::entities::TaskRecord;
use crate::utils::{
    percentage::{ratio_percentage, Percentage},
    time::day_bounds,
};

/// Aggregate counts derived from the current collection. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
}

impl StatsSnapshot {
    pub fn completion_rate(&self) -> Option<Percentage> {
        ratio_percentage(self.completed, self.total)
    }
}

/// Today's view. Every pending task counts regardless of age, completed ones only if they were
/// created on the same calendar day as `now` (in `now`'s zone). `total` is the sum of both, so
/// tasks completed on earlier days are not part of it.
pub fn daily_stats<Tz: TimeZone>(tasks: &[TaskRecord], now: &DateTime<Tz>) -> StatsSnapshot {
    let (day_start, next_day) = day_bounds(now);
    let pending = tasks.iter().filter(|task| task.is_pending()).count();
    let completed = tasks
        .iter()
        .filter(|task| task.completed)
        .filter(|task| task.created_at >= day_start && task.created_at < next_day)
        .count();
    StatsSnapshot {
        total: pending + completed,
        pending,
        completed,
    }
}

/// The whole retained collection.
pub fn monthly_stats(tasks: &[TaskRecord]) -> StatsSnapshot {
    let completed = tasks.iter().filter(|task| task.completed).count();
    StatsSnapshot {
        total: tasks.len(),
        pending: tasks.len() - completed,
        completed,
    }
}

pub fn tracked_time(tasks: &[TaskRecord]) -> Duration {
    tasks
        .iter()
        .fold(Duration::zero(), |sum, task| sum + task.time_spent())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagUsage {
    pub tag: String,
    pub tasks: usize,
    pub time_spent: Duration,
}

/// Returns every tag with the number of tasks carrying it, most used first. Ties are ordered by
/// name so output is stable.
pub fn tag_breakdown(tasks: &[TaskRecord]) -> Vec<TagUsage> {
    let mut map = HashMap::<&str, TagUsage>::new();
    for task in tasks {
        for tag in &task.tags {
            let usage = map.entry(tag.as_str()).or_insert_with(|| TagUsage {
                tag: tag.clone(),
                tasks: 0,
                time_spent: Duration::zero(),
            });
            usage.tasks += 1;
            usage.time_spent += task.time_spent();
        }
    }

    let mut usages = map.into_values().collect::<Vec<_>>();
    usages.sort_by(|a, b| b.tasks.cmp(&a.tasks).then_with(|| a.tag.cmp(&b.tag)));
    usages
}
