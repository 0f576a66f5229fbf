use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use super::kv::{KeyValueStore, StoreKey};
use crate::{session::identity::UserIdentity, tasks::entities::TaskRecord};

pub const TASKS_NAMESPACE: &str = "tasks";
pub const USERS_NAMESPACE: &str = "users";
pub const SESSION_NAMESPACE: &str = "session";
const CURRENT_USER_NAME: &str = "current_user";

/// Task collection of a single user, stored as one JSON array.
pub struct TaskRepository<S> {
    store: S,
    key: StoreKey,
}

impl<S: KeyValueStore> TaskRepository<S> {
    pub fn for_user(store: S, username: &str) -> Self {
        Self {
            store,
            key: StoreKey::new(TASKS_NAMESPACE, username),
        }
    }

    pub fn key(&self) -> &StoreKey {
        &self.key
    }

    /// A missing blob is an empty collection. Records that no longer parse are skipped so one bad
    /// entry doesn't cost the user the rest of the list.
    pub fn load(&self) -> Result<Vec<TaskRecord>> {
        let Some(raw) = self.store.get(&self.key)? else {
            return Ok(vec![]);
        };
        if raw.trim().is_empty() {
            return Ok(vec![]);
        }

        let values = match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(values) => values,
            Err(e) => {
                warn!("Stored tasks under {} are not a list, starting empty: {e}", self.key);
                return Ok(vec![]);
            }
        };

        let mut tasks = Vec::with_capacity(values.len());
        for value in values {
            match serde_json::from_value::<TaskRecord>(value.clone()) {
                Ok(task) => tasks.push(task),
                Err(e) => {
                    warn!("Skipping illegal task record {value} in {}: {e}", self.key)
                }
            }
        }
        Ok(tasks)
    }

    pub fn save(&self, tasks: &[TaskRecord]) -> Result<()> {
        self.store.set(&self.key, &serde_json::to_string(tasks)?)
    }
}

/// Known users and the currently logged in one.
pub struct IdentityRepository<S> {
    store: S,
}

impl<S: KeyValueStore> IdentityRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn current(&self) -> Result<Option<UserIdentity>> {
        self.read(&current_user_key())
    }

    pub fn set_current(&self, identity: &UserIdentity) -> Result<()> {
        self.write(&current_user_key(), identity)
    }

    pub fn clear_current(&self) -> Result<()> {
        self.store.remove(&current_user_key())
    }

    pub fn find(&self, username: &str) -> Result<Option<UserIdentity>> {
        self.read(&StoreKey::new(USERS_NAMESPACE, username))
    }

    pub fn register(&self, identity: &UserIdentity) -> Result<()> {
        self.write(&StoreKey::new(USERS_NAMESPACE, identity.username()), identity)
    }

    fn read<T: DeserializeOwned>(&self, key: &StoreKey) -> Result<Option<T>> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Ignoring unreadable value under {key}: {e}");
                Ok(None)
            }
        }
    }

    fn write<T: Serialize>(&self, key: &StoreKey, value: &T) -> Result<()> {
        self.store.set(key, &serde_json::to_string(value)?)
    }
}

fn current_user_key() -> StoreKey {
    StoreKey::new(SESSION_NAMESPACE, CURRENT_USER_NAME)
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    use super::{IdentityRepository, TaskRepository};
    use crate::{
        session::identity::UserIdentity,
        storage::{
            kv::{KeyValueStore, StoreKey},
            memory_store::MemoryStore,
        },
        tasks::entities::{Priority, TaskRecord},
    };

    fn record(text: &str) -> TaskRecord {
        TaskRecord {
            id: Uuid::new_v4(),
            text: text.into(),
            completed: false,
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
            priority: Priority::Medium,
            tags: ["Work".to_string()].into(),
            time_spent: 7,
            timer_running: false,
        }
    }

    #[test]
    fn missing_collection_is_empty() -> Result<()> {
        let repository = TaskRepository::for_user(MemoryStore::new(), "alice");
        assert!(repository.load()?.is_empty());
        Ok(())
    }

    #[test]
    fn saved_collection_loads_in_order() -> Result<()> {
        let repository = TaskRepository::for_user(MemoryStore::new(), "alice");
        let tasks = vec![record("First"), record("Second")];

        repository.save(&tasks)?;

        assert_eq!(repository.load()?, tasks);
        Ok(())
    }

    #[test]
    fn collections_are_per_user() -> Result<()> {
        let store = MemoryStore::new();
        TaskRepository::for_user(&store, "alice").save(&[record("Alice's")])?;

        assert!(TaskRepository::for_user(&store, "bob").load()?.is_empty());
        assert_eq!(TaskRepository::for_user(&store, "alice").load()?.len(), 1);
        Ok(())
    }

    #[test]
    fn illegal_records_are_skipped() -> Result<()> {
        let store = MemoryStore::new();
        let good = record("Good");
        let raw = format!(
            "[{}, {{\"id\": \"not-a-uuid\"}}]",
            serde_json::to_string(&good)?
        );
        store.set(&StoreKey::new("tasks", "alice"), &raw)?;

        let loaded = TaskRepository::for_user(&store, "alice").load()?;

        assert_eq!(loaded, vec![good]);
        Ok(())
    }

    #[test]
    fn garbage_blob_is_empty() -> Result<()> {
        let store = MemoryStore::new();
        store.set(&StoreKey::new("tasks", "alice"), "{ not json")?;

        assert!(TaskRepository::for_user(&store, "alice").load()?.is_empty());
        Ok(())
    }

    #[test]
    fn current_user_round_trip_and_clear() -> Result<()> {
        let repository = IdentityRepository::new(MemoryStore::new());
        let identity = UserIdentity::new("alice")?;

        assert_eq!(repository.current()?, None);
        repository.set_current(&identity)?;
        assert_eq!(repository.current()?, Some(identity.clone()));

        repository.clear_current()?;
        assert_eq!(repository.current()?, None);
        Ok(())
    }

    #[test]
    fn registered_users_are_found_by_name() -> Result<()> {
        let repository = IdentityRepository::new(MemoryStore::new());
        let identity = UserIdentity::new("bob")?;

        repository.register(&identity)?;

        assert_eq!(repository.find("bob")?, Some(identity));
        assert_eq!(repository.find("carol")?, None);
        Ok(())
    }
}
