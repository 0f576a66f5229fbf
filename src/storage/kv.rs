use std::{fmt::Display, ops::Deref};

use anyhow::Result;

/// Address of a single persisted blob: a constant namespace plus a name, usually a username.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreKey {
    namespace: &'static str,
    name: String,
}

impl StoreKey {
    pub fn new(namespace: &'static str, name: impl Into<String>) -> Self {
        Self {
            namespace,
            name: name.into(),
        }
    }

    pub fn namespace(&self) -> &'static str {
        self.namespace
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Interface for abstracting the durable store. Values are opaque strings; the store never looks
/// inside them.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStore {
    /// `None` when nothing was ever written under `key`.
    fn get(&self, key: &StoreKey) -> Result<Option<String>>;

    /// Replaces the whole value under `key`.
    fn set(&self, key: &StoreKey, value: &str) -> Result<()>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &StoreKey) -> Result<()>;
}

impl<T: Deref> KeyValueStore for T
where
    T::Target: KeyValueStore,
{
    fn get(&self, key: &StoreKey) -> Result<Option<String>> {
        self.deref().get(key)
    }

    fn set(&self, key: &StoreKey, value: &str) -> Result<()> {
        self.deref().set(key, value)
    }

    fn remove(&self, key: &StoreKey) -> Result<()> {
        self.deref().remove(key)
    }
}
