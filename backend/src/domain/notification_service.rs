//! Notification inbox service.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::lookup::profiles_by_id;
use crate::domain::ports::{
    ListNotificationsRequest, NotificationCommand, NotificationQuery, NotificationRepository,
    NotificationRepositoryError, UserDirectory,
};
use crate::domain::{
    Error, LocalCalendar, MarkAllReadOutcome, NotificationId, NotificationView, UserId,
    UserSummary, clamp_notification_limit,
};

fn map_notification_error(error: NotificationRepositoryError) -> Error {
    match error {
        NotificationRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("notification repository unavailable: {message}"))
        }
        NotificationRepositoryError::Query { message } => {
            Error::internal(format!("notification repository error: {message}"))
        }
    }
}

/// Service implementing the notification driving ports.
#[derive(Clone)]
pub struct NotificationService<N, U> {
    notifications: Arc<N>,
    users: Arc<U>,
    calendar: LocalCalendar,
}

impl<N, U> NotificationService<N, U> {
    /// Create a new service with the given ports.
    pub fn new(notifications: Arc<N>, users: Arc<U>, calendar: LocalCalendar) -> Self {
        Self {
            notifications,
            users,
            calendar,
        }
    }
}

#[async_trait]
impl<N, U> NotificationQuery for NotificationService<N, U>
where
    N: NotificationRepository,
    U: UserDirectory,
{
    async fn list_notifications(
        &self,
        request: ListNotificationsRequest,
    ) -> Result<Vec<NotificationView>, Error> {
        let rows = self
            .notifications
            .list_for(
                &request.actor,
                clamp_notification_limit(request.limit),
                request.unread_only,
            )
            .await
            .map_err(map_notification_error)?;

        let actors: Vec<UserId> = rows.iter().filter_map(|row| row.actor).collect();
        let profiles = profiles_by_id(self.users.as_ref(), &actors).await?;

        Ok(rows
            .into_iter()
            .map(|row| NotificationView {
                id: row.id,
                kind: row.kind,
                message: row.message,
                from_user: row
                    .actor
                    .and_then(|actor| profiles.get(&actor))
                    .map(UserSummary::from),
                related_group_id: row.related_group,
                related_user_id: row.related_user,
                created_at: row.created_at,
                read_at: row.read_at,
            })
            .collect())
    }
}

#[async_trait]
impl<N, U> NotificationCommand for NotificationService<N, U>
where
    N: NotificationRepository,
    U: UserDirectory,
{
    async fn mark_read(
        &self,
        actor: &UserId,
        id: NotificationId,
    ) -> Result<DateTime<Utc>, Error> {
        self.notifications
            .mark_read(actor, id, self.calendar.now())
            .await
            .map_err(map_notification_error)?
            .ok_or_else(|| Error::not_found(format!("notification {id} not found")))
    }

    async fn mark_all_read(&self, actor: &UserId) -> Result<MarkAllReadOutcome, Error> {
        let read_at = self.calendar.now();
        let count = self
            .notifications
            .mark_all_read(actor, read_at)
            .await
            .map_err(map_notification_error)?;
        Ok(MarkAllReadOutcome { count, read_at })
    }
}
