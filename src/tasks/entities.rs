use std::{collections::BTreeSet, fmt::Display};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TaskId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
        }
    }
}

/// A single tracked to-do item. This is also the persisted shape, so field names follow the
/// stored layout (`createdAt`, `timeSpent`, `isTimerRunning`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: TaskId,
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub priority: Priority,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    /// Whole seconds of active time.
    #[serde(default)]
    pub time_spent: u64,
    #[serde(default, rename = "isTimerRunning")]
    pub timer_running: bool,
}

impl TaskRecord {
    pub fn time_spent(&self) -> Duration {
        Duration::seconds(i64::try_from(self.time_spent).unwrap_or(i64::MAX))
    }

    pub fn is_pending(&self) -> bool {
        !self.completed
    }
}
