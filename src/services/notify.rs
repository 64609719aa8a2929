use crate::models::{Notice, SessionUser};
use std::sync::{Mutex, PoisonError};

/// Sink for transient user-facing notifications.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Invalidates any cached view that lists the user's songs.
pub trait ViewRefresher: Send + Sync {
    fn refresh(&self, user: &SessionUser);
}

/// Keeps notices in memory until a renderer takes them.
#[derive(Debug, Default)]
pub struct NoticeLog {
    notices: Mutex<Vec<Notice>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns all pending notices, oldest first.
    pub fn take(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.notices.lock().unwrap_or_else(PoisonError::into_inner))
    }

    pub fn snapshot(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for NoticeLog {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}
