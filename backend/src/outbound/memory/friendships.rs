//! Friendship, permission and one-to-one interaction storage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::InMemorySocialStore;
use crate::domain::ports::{
    FriendshipRepository, FriendshipRepositoryError, InteractionRepository,
    InteractionRepositoryError, ReminderWrite,
};
use crate::domain::{
    Encouragement, FriendPermission, Friendship, FriendshipStatus, NewNotification, Reminder,
    UserId,
};

#[async_trait]
impl FriendshipRepository for InMemorySocialStore {
    async fn find_between(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Option<Friendship>, FriendshipRepositoryError> {
        let state = self.lock().map_err(FriendshipRepositoryError::query)?;
        Ok(state.friendship_between(a, b).cloned())
    }

    async fn list_for(&self, user: &UserId) -> Result<Vec<Friendship>, FriendshipRepositoryError> {
        let state = self.lock().map_err(FriendshipRepositoryError::query)?;
        Ok(state
            .friendships
            .iter()
            .filter(|row| row.involves(*user))
            .cloned()
            .collect())
    }

    async fn create_request(&self, request: &Friendship) -> Result<(), FriendshipRepositoryError> {
        let mut state = self.lock().map_err(FriendshipRepositoryError::query)?;
        if state
            .friendship_between(&request.requester, &request.recipient)
            .is_some()
        {
            return Err(FriendshipRepositoryError::duplicate_pair(format!(
                "{} and {}",
                request.requester, request.recipient
            )));
        }
        state.friendships.push(request.clone());
        Ok(())
    }

    async fn update_pending_message(
        &self,
        requester: &UserId,
        recipient: &UserId,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Friendship>, FriendshipRepositoryError> {
        let mut state = self.lock().map_err(FriendshipRepositoryError::query)?;
        let row = state.friendships.iter_mut().find(|row| {
            row.requester == *requester
                && row.recipient == *recipient
                && row.status == FriendshipStatus::Pending
        });
        Ok(row.map(|row| {
            row.message = Some(message.to_owned());
            row.updated_at = now;
            row.clone()
        }))
    }

    async fn accept_pending(
        &self,
        requester: &UserId,
        recipient: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<Friendship>, FriendshipRepositoryError> {
        let mut state = self.lock().map_err(FriendshipRepositoryError::query)?;
        let Some(row) = state.friendships.iter_mut().find(|row| {
            row.requester == *requester
                && row.recipient == *recipient
                && row.status == FriendshipStatus::Pending
        }) else {
            return Ok(None);
        };
        row.status = FriendshipStatus::Accepted;
        row.blocked_by = None;
        row.updated_at = now;
        let accepted = row.clone();

        for key in [(*requester, *recipient), (*recipient, *requester)] {
            state.permissions.entry(key).or_default();
        }
        Ok(Some(accepted))
    }

    async fn permission(
        &self,
        owner: &UserId,
        target: &UserId,
    ) -> Result<Option<FriendPermission>, FriendshipRepositoryError> {
        let state = self.lock().map_err(FriendshipRepositoryError::query)?;
        Ok(state.permissions.get(&(*owner, *target)).copied())
    }

    async fn save_permission(
        &self,
        owner: &UserId,
        target: &UserId,
        permission: FriendPermission,
        _now: DateTime<Utc>,
    ) -> Result<(), FriendshipRepositoryError> {
        let mut state = self.lock().map_err(FriendshipRepositoryError::query)?;
        state.permissions.insert((*owner, *target), permission);
        Ok(())
    }
}

#[async_trait]
impl InteractionRepository for InMemorySocialStore {
    async fn record_reminder(
        &self,
        reminder: &Reminder,
        notification: &NewNotification,
    ) -> Result<ReminderWrite, InteractionRepositoryError> {
        let mut state = self.lock().map_err(InteractionRepositoryError::query)?;
        let fresh = state
            .reminders
            .insert((reminder.from, reminder.to, reminder.local_date));
        if !fresh {
            return Ok(ReminderWrite::AlreadySent);
        }
        state.push_notification(notification);
        Ok(ReminderWrite::Recorded)
    }

    async fn record_encouragement(
        &self,
        encouragement: &Encouragement,
        notification: &NewNotification,
    ) -> Result<(), InteractionRepositoryError> {
        let mut state = self.lock().map_err(InteractionRepositoryError::query)?;
        state.encouragements.push(encouragement.clone());
        state.push_notification(notification);
        Ok(())
    }
}
