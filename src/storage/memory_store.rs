use std::{collections::HashMap, sync::Mutex};

use anyhow::{anyhow, Result};

use super::kv::{KeyValueStore, StoreKey};

/// Keeps every value in memory, for tests.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<StoreKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> Result<std::sync::MutexGuard<'_, HashMap<StoreKey, String>>> {
        self.values
            .lock()
            .map_err(|_| anyhow!("Memory store was poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &StoreKey) -> Result<Option<String>> {
        Ok(self.values()?.get(key).cloned())
    }

    fn set(&self, key: &StoreKey, value: &str) -> Result<()> {
        self.values()?.insert(key.clone(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &StoreKey) -> Result<()> {
        self.values()?.remove(key);
        Ok(())
    }
}
