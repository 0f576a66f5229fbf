use chrono::Local;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::{
    classifier::classify,
    entities::{TaskId, TaskRecord},
    retention::retain_recent,
    stats::{daily_stats, monthly_stats, StatsSnapshot},
};
use crate::{
    storage::{kv::KeyValueStore, repository::TaskRepository},
    utils::clock::Clock,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Task text can't be empty")]
    EmptyText,
}

/// Everything a front end needs to render the tracker in one read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerView {
    pub tasks: Vec<TaskRecord>,
    pub daily: StatsSnapshot,
    pub monthly: StatsSnapshot,
}

/// Owns a user's task collection for the duration of a session. Every mutation is followed by a
/// full snapshot write; a failing write is logged and never undoes or fails the mutation.
///
/// Operations on an unknown id do nothing. Ids come from whatever the user last saw, and a stale
/// id is not worth an error.
pub struct TaskTracker<S> {
    tasks: Vec<TaskRecord>,
    repository: TaskRepository<S>,
    clock: Box<dyn Clock>,
}

impl<S: KeyValueStore> TaskTracker<S> {
    /// Reads the stored collection and drops everything outside the retention window.
    pub fn load(repository: TaskRepository<S>, clock: Box<dyn Clock>) -> anyhow::Result<Self> {
        let stored = repository.load()?;
        let tasks = retain_recent(stored, clock.time());
        info!("Loaded {} tasks from {}", tasks.len(), repository.key());
        Ok(Self {
            tasks,
            repository,
            clock,
        })
    }

    /// Most recent first.
    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&TaskRecord> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Finds the single task whose id starts with `prefix`. Ambiguous prefixes find nothing.
    pub fn resolve_prefix(&self, prefix: &str) -> Option<TaskId> {
        let prefix = prefix.trim().to_ascii_lowercase();
        if prefix.is_empty() {
            return None;
        }
        let mut matches = self
            .tasks
            .iter()
            .filter(|task| task.id.to_string().starts_with(&prefix));
        match (matches.next(), matches.next()) {
            (Some(task), None) => Some(task.id),
            _ => None,
        }
    }

    pub fn running_count(&self) -> usize {
        self.tasks.iter().filter(|task| task.timer_running).count()
    }

    pub fn daily_stats(&self) -> StatsSnapshot {
        daily_stats(&self.tasks, &self.clock.time().with_timezone(&Local))
    }

    pub fn monthly_stats(&self) -> StatsSnapshot {
        monthly_stats(&self.tasks)
    }

    pub fn view(&self) -> TrackerView {
        TrackerView {
            tasks: self.tasks.clone(),
            daily: self.daily_stats(),
            monthly: self.monthly_stats(),
        }
    }

    #[instrument(skip(self))]
    pub fn create(&mut self, raw_text: &str) -> Result<&TaskRecord, TrackerError> {
        let text = normalize_text(raw_text).ok_or(TrackerError::EmptyText)?;
        let (priority, tags) = classify(&text);
        let task = TaskRecord {
            id: Uuid::new_v4(),
            text,
            completed: false,
            created_at: self.clock.time(),
            priority,
            tags,
            time_spent: 0,
            timer_running: false,
        };
        debug!("Created {task:?}");
        self.tasks.insert(0, task);
        self.persist();
        Ok(&self.tasks[0])
    }

    /// Completing a task always stops its timer. Reopening leaves the timer as it was.
    #[instrument(skip(self))]
    pub fn toggle_complete(&mut self, id: TaskId) -> bool {
        let found = self.update(id, |task| {
            task.completed = !task.completed;
            if task.completed {
                task.timer_running = false;
            }
        });
        self.persist();
        found
    }

    /// Starting the timer of a completed task is refused so a running timer always belongs to a
    /// pending task.
    #[instrument(skip(self))]
    pub fn toggle_timer(&mut self, id: TaskId) -> bool {
        let found = self.update(id, |task| {
            if task.completed && !task.timer_running {
                warn!("Refusing to start the timer of completed task {}", task.id);
                return;
            }
            task.timer_running = !task.timer_running;
        });
        self.persist();
        found
    }

    /// Replaces the display text. Priority and tags stay as they were classified at creation.
    #[instrument(skip(self))]
    pub fn edit(&mut self, id: TaskId, new_text: &str) -> Result<bool, TrackerError> {
        let text = normalize_text(new_text).ok_or(TrackerError::EmptyText)?;
        let found = self.update(id, |task| task.text = text);
        self.persist();
        Ok(found)
    }

    #[instrument(skip(self))]
    pub fn delete(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|task| task.id != id);
        self.persist();
        self.tasks.len() != before
    }

    /// Returns the number of removed tasks.
    #[instrument(skip(self))]
    pub fn clear_completed(&mut self) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|task| !task.completed);
        self.persist();
        before - self.tasks.len()
    }

    /// Adds one second to every running task in the same step. Only writes when something
    /// changed. Returns the number of advanced tasks.
    pub fn tick(&mut self) -> usize {
        let mut advanced = 0;
        for task in self.tasks.iter_mut().filter(|task| task.timer_running) {
            task.time_spent = task.time_spent.saturating_add(1);
            advanced += 1;
        }
        if advanced > 0 {
            self.persist();
        }
        advanced
    }

    fn update(&mut self, id: TaskId, change: impl FnOnce(&mut TaskRecord)) -> bool {
        match self.tasks.iter_mut().find(|task| task.id == id) {
            Some(task) => {
                change(task);
                true
            }
            None => {
                debug!("No task with id {id}, ignoring");
                false
            }
        }
    }

    fn persist(&self) {
        if let Err(e) = self.repository.save(&self.tasks) {
            error!("Failed to persist tasks to {}: {e:?}", self.repository.key());
        }
    }
}

/// Trims and upper-cases the first character, leaving the rest alone. `None` for blank input.
pub fn normalize_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let mut chars = trimmed.chars();
    let first = chars.next()?;
    Some(first.to_uppercase().chain(chars).collect())
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use uuid::Uuid;

    use super::{normalize_text, TaskTracker, TrackerError};
    use crate::{
        storage::{
            kv::MockKeyValueStore,
            memory_store::MemoryStore,
            repository::TaskRepository,
        },
        tasks::entities::{Priority, TaskRecord},
        utils::{clock::test_clock::FixedClock, logging::TEST_LOGGING},
    };

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
    }

    fn tracker_with(store: &MemoryStore, clock: FixedClock) -> TaskTracker<&MemoryStore> {
        TaskTracker::load(TaskRepository::for_user(store, "alice"), Box::new(clock)).unwrap()
    }

    fn stored(store: &MemoryStore) -> Vec<TaskRecord> {
        TaskRepository::for_user(store, "alice").load().unwrap()
    }

    #[test]
    fn normalize_capitalizes_first_letter_only() {
        assert_eq!(normalize_text("  buy MILK  ").as_deref(), Some("Buy MILK"));
        assert_eq!(normalize_text("élan").as_deref(), Some("Élan"));
        assert_eq!(normalize_text("42 things").as_deref(), Some("42 things"));
        assert_eq!(normalize_text(" \t "), None);
    }

    #[test]
    fn create_classifies_and_prepends() {
        *TEST_LOGGING;
        let store = MemoryStore::new();
        let mut tracker = tracker_with(&store, FixedClock::new(start()));

        tracker.create("buy groceries").unwrap();
        let created = tracker.create("urgent: call client").unwrap().clone();

        assert_eq!(created.text, "Urgent: call client");
        assert_eq!(created.priority, Priority::High);
        assert!(created.tags.contains("Work"));
        assert_eq!(created.created_at, start());
        assert!(!created.completed);
        assert!(!created.timer_running);
        assert_eq!(created.time_spent, 0);

        let texts = tracker.tasks().iter().map(|t| t.text.as_str()).collect::<Vec<_>>();
        assert_eq!(texts, vec!["Urgent: call client", "Buy groceries"]);
        assert_eq!(stored(&store), tracker.tasks());
    }

    #[test]
    fn create_rejects_blank_text_without_writing() {
        let mut store = MockKeyValueStore::new();
        store.expect_get().returning(|_| Ok(None));
        store.expect_set().never();
        let mut tracker = TaskTracker::load(
            TaskRepository::for_user(store, "alice"),
            Box::new(FixedClock::new(start())),
        )
        .unwrap();

        assert_eq!(tracker.create("").unwrap_err(), TrackerError::EmptyText);
        assert_eq!(tracker.create("   ").unwrap_err(), TrackerError::EmptyText);
        assert!(tracker.tasks().is_empty());
    }

    #[test]
    fn every_mutation_writes_a_snapshot() {
        let mut store = MockKeyValueStore::new();
        store.expect_get().returning(|_| Ok(None));
        store.expect_set().times(7).returning(|_, _| Ok(()));
        let mut tracker = TaskTracker::load(
            TaskRepository::for_user(store, "alice"),
            Box::new(FixedClock::new(start())),
        )
        .unwrap();

        let id = tracker.create("Write report").unwrap().id;
        tracker.toggle_timer(id);
        tracker.tick();
        tracker.edit(id, "Write the report").unwrap();
        tracker.toggle_complete(id);
        tracker.clear_completed();
        tracker.delete(Uuid::new_v4());
        // Nothing is running any more, so this tick changes nothing and writes nothing.
        tracker.tick();
    }

    #[test]
    fn failed_write_does_not_fail_the_operation() {
        let mut store = MockKeyValueStore::new();
        store.expect_get().returning(|_| Ok(None));
        store
            .expect_set()
            .returning(|_, _| Err(anyhow::anyhow!("disk full")));
        let mut tracker = TaskTracker::load(
            TaskRepository::for_user(store, "alice"),
            Box::new(FixedClock::new(start())),
        )
        .unwrap();

        assert!(tracker.create("Still here").is_ok());
        assert_eq!(tracker.tasks().len(), 1);
    }

    #[test]
    fn completing_stops_timer_and_double_toggle_restores() {
        let store = MemoryStore::new();
        let mut tracker = tracker_with(&store, FixedClock::new(start()));
        let id = tracker.create("Study chapter 3").unwrap().id;

        tracker.toggle_timer(id);
        assert!(tracker.get(id).unwrap().timer_running);

        tracker.toggle_complete(id);
        let task = tracker.get(id).unwrap();
        assert!(task.completed);
        assert!(!task.timer_running);

        tracker.toggle_complete(id);
        let task = tracker.get(id).unwrap();
        assert!(!task.completed);
        assert!(!task.timer_running);
    }

    #[test]
    fn double_toggle_of_idle_task_is_identity() {
        let store = MemoryStore::new();
        let mut tracker = tracker_with(&store, FixedClock::new(start()));
        let id = tracker.create("Clean kitchen").unwrap().id;
        let before = tracker.get(id).unwrap().clone();

        tracker.toggle_complete(id);
        tracker.toggle_complete(id);

        assert_eq!(tracker.get(id).unwrap(), &before);
    }

    #[test]
    fn completed_task_timer_does_not_start() {
        let store = MemoryStore::new();
        let mut tracker = tracker_with(&store, FixedClock::new(start()));
        let id = tracker.create("Pay rent").unwrap().id;
        tracker.toggle_complete(id);

        assert!(tracker.toggle_timer(id));

        let task = tracker.get(id).unwrap();
        assert!(task.completed);
        assert!(!task.timer_running);
        assert_eq!(tracker.running_count(), 0);
    }

    #[test]
    fn missing_ids_are_silent_noops() {
        let store = MemoryStore::new();
        let mut tracker = tracker_with(&store, FixedClock::new(start()));
        tracker.create("Keep me").unwrap();
        let before = tracker.tasks().to_vec();
        let missing = Uuid::new_v4();

        assert!(!tracker.toggle_complete(missing));
        assert!(!tracker.toggle_timer(missing));
        assert_eq!(tracker.edit(missing, "New text"), Ok(false));
        assert!(!tracker.delete(missing));

        assert_eq!(tracker.tasks(), before.as_slice());
    }

    #[test]
    fn edit_keeps_classification_and_rejects_blank() {
        let store = MemoryStore::new();
        let mut tracker = tracker_with(&store, FixedClock::new(start()));
        let id = tracker.create("urgent exam prep").unwrap().id;

        assert_eq!(tracker.edit(id, "  "), Err(TrackerError::EmptyText));
        assert_eq!(tracker.get(id).unwrap().text, "Urgent exam prep");

        assert_eq!(tracker.edit(id, "  buy flowers "), Ok(true));
        let task = tracker.get(id).unwrap();
        assert_eq!(task.text, "Buy flowers");
        assert_eq!(task.priority, Priority::High);
        assert!(task.tags.contains("Academic"));
        assert!(!task.tags.contains("Shopping"));
    }

    #[test]
    fn delete_and_clear_completed() {
        let store = MemoryStore::new();
        let mut tracker = tracker_with(&store, FixedClock::new(start()));
        let first = tracker.create("One").unwrap().id;
        let second = tracker.create("Two").unwrap().id;
        let third = tracker.create("Three").unwrap().id;

        assert!(tracker.delete(second));
        tracker.toggle_complete(first);
        assert_eq!(tracker.clear_completed(), 1);

        let ids = tracker.tasks().iter().map(|t| t.id).collect::<Vec<_>>();
        assert_eq!(ids, vec![third]);
        assert_eq!(stored(&store).len(), 1);
    }

    #[test]
    fn tick_advances_only_running_tasks() {
        let store = MemoryStore::new();
        let mut tracker = tracker_with(&store, FixedClock::new(start()));
        let running = tracker.create("Running").unwrap().id;
        let idle = tracker.create("Idle").unwrap().id;
        tracker.toggle_timer(running);

        assert_eq!(tracker.tick(), 1);
        assert_eq!(tracker.tick(), 1);
        tracker.toggle_timer(running);
        assert_eq!(tracker.tick(), 0);

        assert_eq!(tracker.get(running).unwrap().time_spent, 2);
        assert_eq!(tracker.get(idle).unwrap().time_spent, 0);
        assert_eq!(stored(&store)[1].time_spent, 2);
    }

    #[test]
    fn time_spent_never_decreases() {
        let store = MemoryStore::new();
        let mut tracker = tracker_with(&store, FixedClock::new(start()));
        let id = tracker.create("Long task").unwrap().id;
        let mut last = 0;

        for step in 0..40 {
            match step % 5 {
                0 => {
                    tracker.toggle_timer(id);
                }
                1 => {
                    tracker.toggle_complete(id);
                }
                2 => {
                    tracker.edit(id, "Renamed").unwrap();
                }
                _ => {
                    tracker.tick();
                }
            }
            let task = tracker.get(id).unwrap();
            assert!(task.time_spent >= last);
            assert!(!(task.timer_running && task.completed));
            last = task.time_spent;
        }
    }

    #[test]
    fn load_applies_retention_and_next_write_persists_it() {
        let store = MemoryStore::new();
        let clock = FixedClock::new(start() - Duration::days(31));
        let mut tracker = tracker_with(&store, clock.clone());
        tracker.create("Ancient").unwrap();
        clock.advance(Duration::days(2));
        tracker.create("Recent").unwrap();
        assert_eq!(stored(&store).len(), 2);

        clock.advance(Duration::days(29));
        let mut reloaded = tracker_with(&store, clock);
        let texts = reloaded.tasks().iter().map(|t| t.text.clone()).collect::<Vec<_>>();
        assert_eq!(texts, vec!["Recent".to_string()]);
        assert_eq!(stored(&store).len(), 2);

        reloaded.clear_completed();
        assert_eq!(stored(&store).len(), 1);
    }

    #[test]
    fn resolve_prefix_requires_unique_match() {
        let store = MemoryStore::new();
        let mut tracker = tracker_with(&store, FixedClock::new(start()));
        let id = tracker.create("Only").unwrap().id;
        let full = id.to_string();

        assert_eq!(tracker.resolve_prefix(&full[..8]), Some(id));
        assert_eq!(tracker.resolve_prefix(&full.to_uppercase()), Some(id));
        assert_eq!(tracker.resolve_prefix(""), None);
        assert_eq!(tracker.resolve_prefix("zzz"), None);
    }

    #[test]
    fn view_reports_both_windows() {
        let store = MemoryStore::new();
        let clock = FixedClock::new(start() - Duration::days(3));
        let mut tracker = tracker_with(&store, clock.clone());
        let old = tracker.create("Old done").unwrap().id;
        tracker.toggle_complete(old);
        clock.advance(Duration::days(3));
        tracker.create("Fresh").unwrap();

        let view = tracker.view();

        assert_eq!(view.monthly.total, 2);
        assert_eq!(view.daily.total, 1);
        assert_eq!(view.daily.pending, 1);
        assert_eq!(view.tasks.len(), 2);
    }
}
