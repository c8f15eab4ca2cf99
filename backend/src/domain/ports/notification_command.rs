//! Driving port for acknowledging notifications.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Error, MarkAllReadOutcome, NotificationId, UserId};

/// Driving port for the read/unread lifecycle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationCommand: Send + Sync {
    /// Mark one notification read, keeping any earlier timestamp.
    ///
    /// # Errors
    ///
    /// Returns `not_found` when the actor has no such notification.
    async fn mark_read(&self, actor: &UserId, id: NotificationId)
    -> Result<DateTime<Utc>, Error>;

    /// Mark all unread notifications read with one shared timestamp.
    async fn mark_all_read(&self, actor: &UserId) -> Result<MarkAllReadOutcome, Error>;
}
