//! PostgreSQL-backed `NotificationRepository` implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{NotificationRepository, NotificationRepositoryError};
use crate::domain::{Notification, NotificationId, UserId};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::NotificationRow;
use super::pool::DbPool;
use super::schema::notifications;

/// Diesel-backed notification inbox.
#[derive(Clone)]
pub struct DieselNotificationRepository {
    pool: DbPool,
}

impl DieselNotificationRepository {
    /// Create a repository using `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn notification_error(error: diesel::result::Error) -> NotificationRepositoryError {
    map_diesel_error(
        error,
        NotificationRepositoryError::query,
        NotificationRepositoryError::connection,
    )
}

#[async_trait]
impl NotificationRepository for DieselNotificationRepository {
    async fn list_for(
        &self,
        recipient: &UserId,
        limit: u32,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, NotificationRepositoryError::connection))?;
        let mut query = notifications::table
            .filter(notifications::recipient_id.eq(recipient.as_uuid()))
            .into_boxed();
        if unread_only {
            query = query.filter(notifications::read_at.is_null());
        }
        let rows: Vec<NotificationRow> = query
            .order_by((notifications::created_at.desc(), notifications::id.desc()))
            .limit(i64::from(limit))
            .select(NotificationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(notification_error)?;
        rows.into_iter()
            .map(|row| Notification::try_from(row).map_err(NotificationRepositoryError::query))
            .collect()
    }

    async fn mark_read(
        &self,
        recipient: &UserId,
        id: NotificationId,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, NotificationRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, NotificationRepositoryError::connection))?;
        let owned = notifications::table
            .find(id.get())
            .filter(notifications::recipient_id.eq(recipient.as_uuid()));
        // Only an unread row is stamped; a read row keeps its first read time.
        let stamped: Option<Option<DateTime<Utc>>> = diesel::update(
            owned.clone().filter(notifications::read_at.is_null()),
        )
        .set(notifications::read_at.eq(Some(now)))
        .returning(notifications::read_at)
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(notification_error)?;
        if let Some(read_at) = stamped {
            return Ok(read_at);
        }

        let existing: Option<Option<DateTime<Utc>>> = owned
            .select(notifications::read_at)
            .first(&mut conn)
            .await
            .optional()
            .map_err(notification_error)?;
        Ok(existing.flatten())
    }

    async fn mark_all_read(
        &self,
        recipient: &UserId,
        now: DateTime<Utc>,
    ) -> Result<u64, NotificationRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, NotificationRepositoryError::connection))?;
        let changed = diesel::update(
            notifications::table
                .filter(notifications::recipient_id.eq(recipient.as_uuid()))
                .filter(notifications::read_at.is_null()),
        )
        .set(notifications::read_at.eq(Some(now)))
        .execute(&mut conn)
        .await
        .map_err(notification_error)?;
        Ok(u64::try_from(changed).unwrap_or_default())
    }
}
