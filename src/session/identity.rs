use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::SessionError;

const MAX_USERNAME_LEN: usize = 64;

/// The logged in user. Usernames double as storage key names, hence the strict alphabet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    username: String,
    id: Uuid,
}

impl UserIdentity {
    /// Creates an identity with a fresh id for a validated username.
    pub fn new(username: &str) -> Result<Self, SessionError> {
        Ok(Self {
            username: validate_username(username)?,
            id: Uuid::new_v4(),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn id(&self) -> Uuid {
        self.id
    }
}

/// Trims `username` and checks it is 1 to 64 ASCII letters, digits, `-` or `_`.
pub fn validate_username(username: &str) -> Result<String, SessionError> {
    let username = username.trim();
    let valid = !username.is_empty()
        && username.len() <= MAX_USERNAME_LEN
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(username.to_owned())
    } else {
        Err(SessionError::InvalidUsername(username.to_owned()))
    }
}
