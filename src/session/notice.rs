use std::time::Duration;

use tokio::time::Instant;

/// How long a user-facing message stays visible.
pub const NOTICE_DURATION: Duration = Duration::from_secs(3);

/// A transient message for the user, e.g. after an empty task text was rejected.
#[derive(Debug, Clone)]
pub struct Notice {
    message: String,
    raised_at: Instant,
}

impl Notice {
    pub fn new(message: impl Into<String>, raised_at: Instant) -> Self {
        Self {
            message: message.into(),
            raised_at,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.raised_at) < NOTICE_DURATION
    }
}

/// Holds at most one notice; a new one replaces the old, expired ones are dropped on read.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    current: Option<Notice>,
}

impl NoticeBoard {
    pub fn raise(&mut self, message: impl Into<String>, now: Instant) {
        self.current = Some(Notice::new(message, now));
    }

    pub fn visible(&mut self, now: Instant) -> Option<&Notice> {
        if self.current.as_ref().is_some_and(|notice| !notice.is_visible(now)) {
            self.current = None;
        }
        self.current.as_ref()
    }
}
