//! Application state of one running front end: who is logged in, and the task tracker that
//! belongs to them. The state is restored from the store when the [Session] is created and
//! cleared again by [Session::logout].

pub mod event_loop;
pub mod identity;
pub mod notice;
pub mod shutdown;

use std::sync::Arc;

use anyhow::Result;
use identity::{validate_username, UserIdentity};
use thiserror::Error;
use tracing::info;

use crate::{
    storage::{
        kv::KeyValueStore,
        repository::{IdentityRepository, TaskRepository},
    },
    tasks::tracker::TaskTracker,
    utils::clock::Clock,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Invalid username {0:?}: use 1 to 64 letters, digits, '-' or '_'")]
    InvalidUsername(String),
    #[error("Nobody is logged in, run `login <username>` first")]
    NotLoggedIn,
}

pub struct Session<S> {
    store: Arc<S>,
    identities: IdentityRepository<Arc<S>>,
    current: Option<UserIdentity>,
}

impl<S: KeyValueStore> Session<S> {
    /// Picks up whoever was logged in last time.
    pub fn restore(store: Arc<S>) -> Result<Self> {
        let identities = IdentityRepository::new(store.clone());
        let current = identities.current()?;
        if let Some(user) = &current {
            info!("Restored session of {}", user.username());
        }
        Ok(Self {
            store,
            identities,
            current,
        })
    }

    pub fn current_user(&self) -> Option<&UserIdentity> {
        self.current.as_ref()
    }

    /// Makes `username` the current user. A username keeps the id it got on its first login.
    pub fn login(&mut self, username: &str) -> Result<&UserIdentity> {
        let username = validate_username(username)?;
        let identity = match self.identities.find(&username)? {
            Some(identity) => identity,
            None => {
                let identity = UserIdentity::new(&username)?;
                self.identities.register(&identity)?;
                info!("Registered new user {username}");
                identity
            }
        };
        self.identities.set_current(&identity)?;
        info!("Logged in as {username}");
        Ok(&*self.current.insert(identity))
    }

    /// Forgets the current user. Their tasks stay in the store.
    pub fn logout(&mut self) -> Result<()> {
        self.identities.clear_current()?;
        if let Some(user) = self.current.take() {
            info!("Logged out {}", user.username());
        }
        Ok(())
    }

    /// Loads the current user's tasks. The returned tracker is the only owner of the collection
    /// until it is dropped.
    pub fn open_tracker(&self, clock: Box<dyn Clock>) -> Result<TaskTracker<Arc<S>>> {
        let user = self.current.as_ref().ok_or(SessionError::NotLoggedIn)?;
        let repository = TaskRepository::for_user(self.store.clone(), user.username());
        TaskTracker::load(repository, clock)
    }
}
