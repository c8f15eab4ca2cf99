//! Driving port for reading the notification inbox.

use async_trait::async_trait;

use crate::domain::{Error, NotificationView, UserId};

/// Inbox listing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListNotificationsRequest {
    pub actor: UserId,
    /// Clamped to `1..=100`; defaults to 30.
    pub limit: Option<u32>,
    pub unread_only: bool,
}

/// Driving port for the notification inbox.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationQuery: Send + Sync {
    /// Newest-first notifications hydrated with the triggering user.
    async fn list_notifications(
        &self,
        request: ListNotificationsRequest,
    ) -> Result<Vec<NotificationView>, Error>;
}
