//! One-to-one reminder and encouragement service.
//!
//! Reminders are limited to one per sender, recipient and recipient-local
//! date. A repeat is reported as `limited` rather than rejected.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::friendship_service::normalize_note;
use crate::domain::lookup::require_profile;
use crate::domain::ports::{
    EncourageFriendRequest, FriendshipRepository, FriendshipRepositoryError, InteractionCommand,
    InteractionRepository, InteractionRepositoryError, ReminderWrite, UserDirectory,
};
use crate::domain::{
    Encouragement, Error, LocalCalendar, NewNotification, NotificationKind, RemindOutcome,
    Reminder, UserId, messages,
};

fn map_friendship_error(error: FriendshipRepositoryError) -> Error {
    match error {
        FriendshipRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("friendship repository unavailable: {message}"))
        }
        other => Error::internal(format!("friendship repository error: {other}")),
    }
}

fn map_interaction_error(error: InteractionRepositoryError) -> Error {
    match error {
        InteractionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("interaction repository unavailable: {message}"))
        }
        InteractionRepositoryError::Query { message } => {
            Error::internal(format!("interaction repository error: {message}"))
        }
    }
}

/// Service implementing [`InteractionCommand`].
#[derive(Clone)]
pub struct InteractionService<F, I, U> {
    friendships: Arc<F>,
    interactions: Arc<I>,
    users: Arc<U>,
    calendar: LocalCalendar,
}

impl<F, I, U> InteractionService<F, I, U> {
    /// Create a new service with the given ports.
    pub fn new(
        friendships: Arc<F>,
        interactions: Arc<I>,
        users: Arc<U>,
        calendar: LocalCalendar,
    ) -> Self {
        Self {
            friendships,
            interactions,
            users,
            calendar,
        }
    }
}

impl<F, I, U> InteractionService<F, I, U>
where
    F: FriendshipRepository,
    I: InteractionRepository,
    U: UserDirectory,
{
    async fn require_accepted(&self, actor: &UserId, friend: &UserId) -> Result<(), Error> {
        let accepted = self
            .friendships
            .find_between(actor, friend)
            .await
            .map_err(map_friendship_error)?
            .is_some_and(|row| row.is_accepted());
        if accepted {
            Ok(())
        } else {
            Err(Error::not_found("friendship not found"))
        }
    }
}

#[async_trait]
impl<F, I, U> InteractionCommand for InteractionService<F, I, U>
where
    F: FriendshipRepository,
    I: InteractionRepository,
    U: UserDirectory,
{
    async fn remind_friend(
        &self,
        actor: &UserId,
        friend: &UserId,
    ) -> Result<RemindOutcome, Error> {
        self.require_accepted(actor, friend).await?;

        // The recipient owns this row: it records whether they accept reminders
        // from the actor.
        let recipient_setting = self
            .friendships
            .permission(friend, actor)
            .await
            .map_err(map_friendship_error)?
            .unwrap_or_default();
        if !recipient_setting.can_remind {
            return Err(Error::forbidden("this friend has turned off reminders"));
        }

        let sender = require_profile(self.users.as_ref(), actor).await?;
        let recipient = require_profile(self.users.as_ref(), friend).await?;
        let now = self.calendar.now();
        let reminder = Reminder {
            from: *actor,
            to: *friend,
            local_date: self.calendar.today_for(&recipient),
            created_at: now,
        };
        let notification = NewNotification {
            recipient: *friend,
            actor: Some(*actor),
            related_group: None,
            related_user: Some(*actor),
            kind: NotificationKind::Remind,
            message: messages::remind(sender.display_name()),
            created_at: now,
        };

        match self
            .interactions
            .record_reminder(&reminder, &notification)
            .await
            .map_err(map_interaction_error)?
        {
            ReminderWrite::Recorded => Ok(RemindOutcome::sent()),
            ReminderWrite::AlreadySent => {
                debug!(
                    from = %actor,
                    to = %friend,
                    date = %reminder.local_date,
                    "reminder already sent today"
                );
                Ok(RemindOutcome::limited())
            }
        }
    }

    async fn encourage_friend(&self, request: EncourageFriendRequest) -> Result<(), Error> {
        let EncourageFriendRequest {
            actor,
            friend,
            emoji,
            message,
        } = request;
        self.require_accepted(&actor, &friend).await?;

        let emoji = emoji.trim().to_owned();
        if emoji.is_empty() {
            return Err(Error::invalid_request("emoji must not be empty"));
        }
        let sender = require_profile(self.users.as_ref(), &actor).await?;
        let recipient = require_profile(self.users.as_ref(), &friend).await?;
        let now = self.calendar.now();
        let notification = NewNotification {
            recipient: friend,
            actor: Some(actor),
            related_group: None,
            related_user: Some(actor),
            kind: NotificationKind::Encourage,
            message: messages::encourage(sender.display_name(), &emoji),
            created_at: now,
        };
        let encouragement = Encouragement {
            from: actor,
            to: friend,
            emoji,
            message: normalize_note(message),
            local_date: self.calendar.today_for(&recipient),
            created_at: now,
        };

        self.interactions
            .record_encouragement(&encouragement, &notification)
            .await
            .map_err(map_interaction_error)
    }
}
