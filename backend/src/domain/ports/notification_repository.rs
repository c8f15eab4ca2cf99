//! Port for the notification log.
//!
//! Rows are written by the friendship, interaction and group adapters inside
//! their own transactions; this port covers the recipient's read side and
//! the read/unread lifecycle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Notification, NotificationId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification repository adapters.
    pub enum NotificationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "notification repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "notification repository query failed: {message}",
    }
}

/// Port for reading and acknowledging notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Newest-first notifications for `recipient`.
    async fn list_for(
        &self,
        recipient: &UserId,
        limit: u32,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationRepositoryError>;

    /// Set `read_at` to `now` unless already set.
    ///
    /// Returns the effective `read_at`, or `None` when the notification does
    /// not exist or belongs to someone else.
    async fn mark_read(
        &self,
        recipient: &UserId,
        id: NotificationId,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, NotificationRepositoryError>;

    /// Mark every unread notification of `recipient` read at `now`.
    ///
    /// Returns the number of rows changed.
    async fn mark_all_read(
        &self,
        recipient: &UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, NotificationRepositoryError>;
}
