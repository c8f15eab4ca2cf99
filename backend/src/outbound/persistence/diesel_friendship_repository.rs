//! PostgreSQL-backed friendship and one-to-one interaction adapters.
//!
//! The `friendships_pair_key` expression index keeps one row per unordered
//! pair, so a concurrent duplicate request fails at insert time and is
//! reported as `DuplicatePair`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{
    FriendshipRepository, FriendshipRepositoryError, InteractionRepository,
    InteractionRepositoryError, ReminderWrite,
};
use crate::domain::{
    Encouragement, FriendPermission, Friendship, FriendshipStatus, NewNotification, Reminder,
    UserId,
};

use super::error_mapping::{is_unique_violation, map_diesel_error, map_pool_error};
use super::models::{
    FriendSettingRow, FriendshipRow, NewEncouragementRow, NewFriendSettingRow, NewFriendshipRow,
    NewNotificationRow, NewReminderRow,
};
use super::pool::DbPool;
use super::schema::{encouragements, friend_settings, friendships, notifications, reminders};

const PAIR_CONSTRAINT: &str = "friendships_pair_key";

/// Diesel-backed friendship repository.
#[derive(Clone)]
pub struct DieselFriendshipRepository {
    pool: DbPool,
}

impl DieselFriendshipRepository {
    /// Create a repository using `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn friendship_error(error: diesel::result::Error) -> FriendshipRepositoryError {
    if is_unique_violation(&error, PAIR_CONSTRAINT) {
        return FriendshipRepositoryError::duplicate_pair("concurrent request for the same pair");
    }
    map_diesel_error(
        error,
        FriendshipRepositoryError::query,
        FriendshipRepositoryError::connection,
    )
}

fn to_friendship(row: FriendshipRow) -> Result<Friendship, FriendshipRepositoryError> {
    Friendship::try_from(row).map_err(FriendshipRepositoryError::query)
}

#[async_trait]
impl FriendshipRepository for DieselFriendshipRepository {
    async fn find_between(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Option<Friendship>, FriendshipRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, FriendshipRepositoryError::connection))?;
        let (a, b) = (*a.as_uuid(), *b.as_uuid());
        let row = friendships::table
            .filter(
                friendships::requester_id
                    .eq(a)
                    .and(friendships::recipient_id.eq(b))
                    .or(friendships::requester_id
                        .eq(b)
                        .and(friendships::recipient_id.eq(a))),
            )
            .select(FriendshipRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(friendship_error)?;
        row.map(to_friendship).transpose()
    }

    async fn list_for(&self, user: &UserId) -> Result<Vec<Friendship>, FriendshipRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, FriendshipRepositoryError::connection))?;
        let user = *user.as_uuid();
        let rows: Vec<FriendshipRow> = friendships::table
            .filter(
                friendships::requester_id
                    .eq(user)
                    .or(friendships::recipient_id.eq(user)),
            )
            .select(FriendshipRow::as_select())
            .load(&mut conn)
            .await
            .map_err(friendship_error)?;
        rows.into_iter().map(to_friendship).collect()
    }

    async fn create_request(&self, request: &Friendship) -> Result<(), FriendshipRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, FriendshipRepositoryError::connection))?;
        diesel::insert_into(friendships::table)
            .values(NewFriendshipRow::from(request))
            .execute(&mut conn)
            .await
            .map_err(friendship_error)?;
        Ok(())
    }

    async fn update_pending_message(
        &self,
        requester: &UserId,
        recipient: &UserId,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Friendship>, FriendshipRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, FriendshipRepositoryError::connection))?;
        let row = diesel::update(
            friendships::table
                .filter(friendships::requester_id.eq(requester.as_uuid()))
                .filter(friendships::recipient_id.eq(recipient.as_uuid()))
                .filter(friendships::status.eq(FriendshipStatus::Pending.as_str())),
        )
        .set((
            friendships::message.eq(message),
            friendships::updated_at.eq(now),
        ))
        .returning(FriendshipRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(friendship_error)?;
        row.map(to_friendship).transpose()
    }

    async fn accept_pending(
        &self,
        requester: &UserId,
        recipient: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<Friendship>, FriendshipRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, FriendshipRepositoryError::connection))?;
        let settings = [
            NewFriendSettingRow::new(requester, recipient, FriendPermission::default(), now),
            NewFriendSettingRow::new(recipient, requester, FriendPermission::default(), now),
        ];
        let (requester, recipient) = (*requester.as_uuid(), *recipient.as_uuid());

        let row = conn
            .transaction(|conn| {
                async move {
                    let accepted: Option<FriendshipRow> = diesel::update(
                        friendships::table
                            .filter(friendships::requester_id.eq(requester))
                            .filter(friendships::recipient_id.eq(recipient))
                            .filter(friendships::status.eq(FriendshipStatus::Pending.as_str())),
                    )
                    .set((
                        friendships::status.eq(FriendshipStatus::Accepted.as_str()),
                        friendships::blocked_by.eq(None::<Uuid>),
                        friendships::updated_at.eq(now),
                    ))
                    .returning(FriendshipRow::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?;
                    if accepted.is_none() {
                        return Ok(None);
                    }

                    diesel::insert_into(friend_settings::table)
                        .values(&settings[..])
                        .on_conflict((friend_settings::owner_id, friend_settings::target_id))
                        .do_nothing()
                        .execute(conn)
                        .await?;
                    Ok(accepted)
                }
                .scope_boxed()
            })
            .await
            .map_err(friendship_error)?;
        row.map(to_friendship).transpose()
    }

    async fn permission(
        &self,
        owner: &UserId,
        target: &UserId,
    ) -> Result<Option<FriendPermission>, FriendshipRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, FriendshipRepositoryError::connection))?;
        let row = friend_settings::table
            .find((owner.as_uuid(), target.as_uuid()))
            .select(FriendSettingRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(friendship_error)?;
        Ok(row.map(FriendPermission::from))
    }

    async fn save_permission(
        &self,
        owner: &UserId,
        target: &UserId,
        permission: FriendPermission,
        now: DateTime<Utc>,
    ) -> Result<(), FriendshipRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, FriendshipRepositoryError::connection))?;
        diesel::insert_into(friend_settings::table)
            .values(NewFriendSettingRow::new(owner, target, permission, now))
            .on_conflict((friend_settings::owner_id, friend_settings::target_id))
            .do_update()
            .set((
                friend_settings::can_view_detail.eq(excluded(friend_settings::can_view_detail)),
                friend_settings::can_remind.eq(excluded(friend_settings::can_remind)),
                friend_settings::updated_at.eq(excluded(friend_settings::updated_at)),
            ))
            .execute(&mut conn)
            .await
            .map_err(friendship_error)?;
        Ok(())
    }
}

/// Diesel-backed reminder and encouragement writer.
#[derive(Clone)]
pub struct DieselInteractionRepository {
    pool: DbPool,
}

impl DieselInteractionRepository {
    /// Create a repository using `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn interaction_error(error: diesel::result::Error) -> InteractionRepositoryError {
    map_diesel_error(
        error,
        InteractionRepositoryError::query,
        InteractionRepositoryError::connection,
    )
}

#[async_trait]
impl InteractionRepository for DieselInteractionRepository {
    async fn record_reminder(
        &self,
        reminder: &Reminder,
        notification: &NewNotification,
    ) -> Result<ReminderWrite, InteractionRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, InteractionRepositoryError::connection))?;
        let reminder_row = NewReminderRow {
            from_user: *reminder.from.as_uuid(),
            to_user: *reminder.to.as_uuid(),
            local_date: reminder.local_date,
            created_at: reminder.created_at,
        };
        let notification_row = NewNotificationRow::from(notification);

        conn.transaction(|conn| {
            async move {
                let inserted = diesel::insert_into(reminders::table)
                    .values(&reminder_row)
                    .on_conflict((
                        reminders::from_user,
                        reminders::to_user,
                        reminders::local_date,
                    ))
                    .do_nothing()
                    .execute(conn)
                    .await?;
                if inserted == 0 {
                    return Ok(ReminderWrite::AlreadySent);
                }
                diesel::insert_into(notifications::table)
                    .values(&notification_row)
                    .execute(conn)
                    .await?;
                Ok(ReminderWrite::Recorded)
            }
            .scope_boxed()
        })
        .await
        .map_err(interaction_error)
    }

    async fn record_encouragement(
        &self,
        encouragement: &Encouragement,
        notification: &NewNotification,
    ) -> Result<(), InteractionRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, InteractionRepositoryError::connection))?;
        let encouragement_row = NewEncouragementRow {
            from_user: *encouragement.from.as_uuid(),
            to_user: *encouragement.to.as_uuid(),
            emoji: encouragement.emoji.as_str(),
            message: encouragement.message.as_deref(),
            local_date: encouragement.local_date,
            created_at: encouragement.created_at,
        };
        let notification_row = NewNotificationRow::from(notification);

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(encouragements::table)
                    .values(&encouragement_row)
                    .execute(conn)
                    .await?;
                diesel::insert_into(notifications::table)
                    .values(&notification_row)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(interaction_error)
    }
}
