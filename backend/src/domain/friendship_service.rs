//! Friendship domain service.
//!
//! Implements the friendship driving ports on top of the friendship
//! repository. Every request searches both orderings of the pair before
//! writing, and the repository's pair uniqueness settles concurrent
//! requests: the loser re-reads the winning row and re-evaluates once.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::lookup::{
    checkin_standing, map_user_directory_error, profiles_by_id, require_profile,
};
use crate::domain::ports::{
    CheckinOracle, FriendRequest, FriendshipCommand, FriendshipQuery, FriendshipRepository,
    FriendshipRepositoryError, UserDirectory,
};
use crate::domain::{
    Error, FriendDetailView, FriendPermission, FriendPermissionPatch, FriendView, Friendship,
    FriendshipStatus, LocalCalendar, UserId, UserProfile, UserSummary,
};

fn map_friendship_error(error: FriendshipRepositoryError) -> Error {
    match error {
        FriendshipRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("friendship repository unavailable: {message}"))
        }
        FriendshipRepositoryError::Query { message } => {
            Error::internal(format!("friendship repository error: {message}"))
        }
        FriendshipRepositoryError::DuplicatePair { message } => {
            Error::conflict(format!("friendship already exists: {message}"))
        }
    }
}

/// Trim optional free text, treating blank input as absent.
pub(crate) fn normalize_note(note: Option<String>) -> Option<String> {
    note.map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty())
}

/// Friendship service implementing the friendship driving ports.
#[derive(Clone)]
pub struct FriendshipService<F, U, C> {
    friendships: Arc<F>,
    users: Arc<U>,
    checkins: Arc<C>,
    calendar: LocalCalendar,
}

impl<F, U, C> FriendshipService<F, U, C> {
    /// Create a new service with the given ports.
    pub fn new(
        friendships: Arc<F>,
        users: Arc<U>,
        checkins: Arc<C>,
        calendar: LocalCalendar,
    ) -> Self {
        Self {
            friendships,
            users,
            checkins,
            calendar,
        }
    }
}

impl<F, U, C> FriendshipService<F, U, C>
where
    F: FriendshipRepository,
    U: UserDirectory,
    C: CheckinOracle,
{
    async fn find_between(&self, a: &UserId, b: &UserId) -> Result<Option<Friendship>, Error> {
        self.friendships
            .find_between(a, b)
            .await
            .map_err(map_friendship_error)
    }

    /// Non-blocked row between the pair, or `not_found`.
    async fn visible_row(&self, actor: &UserId, friend: &UserId) -> Result<Friendship, Error> {
        self.find_between(actor, friend)
            .await?
            .filter(|row| row.status != FriendshipStatus::Blocked)
            .ok_or_else(|| Error::not_found("friendship not found"))
    }

    async fn view_of(
        &self,
        viewer: UserId,
        row: &Friendship,
        friend: &UserProfile,
    ) -> Result<FriendView, Error> {
        let status = row
            .label_for(viewer)
            .ok_or_else(|| Error::not_found("friendship not found"))?;
        let standing = checkin_standing(self.checkins.as_ref(), &self.calendar, friend).await?;
        Ok(FriendView {
            user: UserSummary::from(friend),
            status,
            message: row.message.clone(),
            checked_in_today: standing.checked_in_today,
            streak_days: standing.streak_days,
        })
    }

    async fn resolve_existing(
        &self,
        actor: UserId,
        target: &UserProfile,
        row: Friendship,
        message: Option<String>,
    ) -> Result<FriendView, Error> {
        let now = self.calendar.now();
        match row.status {
            FriendshipStatus::Blocked => Err(Error::forbidden("this relationship is blocked")),
            FriendshipStatus::Accepted => Err(Error::conflict("already friends")),
            FriendshipStatus::Pending if row.requester == target.id => {
                let accepted = self
                    .friendships
                    .accept_pending(&target.id, &actor, now)
                    .await
                    .map_err(map_friendship_error)?
                    .ok_or_else(|| Error::conflict("friend request changed concurrently"))?;
                info!(requester = %target.id, recipient = %actor, "friend request accepted");
                self.view_of(actor, &accepted, target).await
            }
            FriendshipStatus::Pending => {
                let Some(text) = message else {
                    return self.view_of(actor, &row, target).await;
                };
                let updated = self
                    .friendships
                    .update_pending_message(&actor, &target.id, &text, now)
                    .await
                    .map_err(map_friendship_error)?
                    .unwrap_or(row);
                self.view_of(actor, &updated, target).await
            }
        }
    }
}

#[async_trait]
impl<F, U, C> FriendshipCommand for FriendshipService<F, U, C>
where
    F: FriendshipRepository,
    U: UserDirectory,
    C: CheckinOracle,
{
    async fn request_friend(&self, request: FriendRequest) -> Result<FriendView, Error> {
        let FriendRequest {
            actor,
            target_phone,
            message,
        } = request;
        let target = self
            .users
            .find_by_phone(target_phone.trim())
            .await
            .map_err(map_user_directory_error)?
            .ok_or_else(|| Error::not_found("no user with that phone number"))?;
        if target.id == actor {
            return Err(Error::invalid_request("you cannot befriend yourself"));
        }
        let message = normalize_note(message);

        if let Some(row) = self.find_between(&actor, &target.id).await? {
            return self.resolve_existing(actor, &target, row, message).await;
        }

        let row = Friendship::pending(actor, target.id, message.clone(), self.calendar.now());
        match self.friendships.create_request(&row).await {
            Ok(()) => self.view_of(actor, &row, &target).await,
            Err(FriendshipRepositoryError::DuplicatePair { message: detail }) => {
                warn!(
                    actor = %actor,
                    target = %target.id,
                    detail = %detail,
                    "friend request raced another write; re-evaluating"
                );
                let existing = self
                    .find_between(&actor, &target.id)
                    .await?
                    .ok_or_else(|| Error::internal("friendship vanished after duplicate insert"))?;
                self.resolve_existing(actor, &target, existing, message).await
            }
            Err(err) => Err(map_friendship_error(err)),
        }
    }

    async fn accept_friend(
        &self,
        actor: &UserId,
        requester: &UserId,
    ) -> Result<FriendView, Error> {
        let accepted = self
            .friendships
            .accept_pending(requester, actor, self.calendar.now())
            .await
            .map_err(map_friendship_error)?
            .ok_or_else(|| Error::not_found("friend request not found"))?;
        info!(requester = %requester, recipient = %actor, "friend request accepted");
        let friend = require_profile(self.users.as_ref(), requester).await?;
        self.view_of(*actor, &accepted, &friend).await
    }

    async fn update_permission(
        &self,
        actor: &UserId,
        friend: &UserId,
        patch: FriendPermissionPatch,
    ) -> Result<FriendPermission, Error> {
        self.visible_row(actor, friend).await?;
        let current = self
            .friendships
            .permission(actor, friend)
            .await
            .map_err(map_friendship_error)?
            .unwrap_or_default();
        let next = current.apply(patch);
        self.friendships
            .save_permission(actor, friend, next, self.calendar.now())
            .await
            .map_err(map_friendship_error)?;
        Ok(next)
    }
}

#[async_trait]
impl<F, U, C> FriendshipQuery for FriendshipService<F, U, C>
where
    F: FriendshipRepository,
    U: UserDirectory,
    C: CheckinOracle,
{
    async fn list_friends(&self, actor: &UserId) -> Result<Vec<FriendView>, Error> {
        let mut rows: Vec<Friendship> = self
            .friendships
            .list_for(actor)
            .await
            .map_err(map_friendship_error)?
            .into_iter()
            .filter(|row| row.status != FriendshipStatus::Blocked)
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let others: Vec<UserId> = rows.iter().map(|row| row.other_party(*actor)).collect();
        let profiles = profiles_by_id(self.users.as_ref(), &others).await?;

        let mut views = Vec::with_capacity(rows.len());
        for row in &rows {
            let Some(profile) = profiles.get(&row.other_party(*actor)) else {
                continue;
            };
            views.push(self.view_of(*actor, row, profile).await?);
        }
        Ok(views)
    }

    async fn friend_detail(
        &self,
        actor: &UserId,
        friend: &UserId,
    ) -> Result<FriendDetailView, Error> {
        let row = self.visible_row(actor, friend).await?;
        let profile = require_profile(self.users.as_ref(), friend).await?;
        let view = self.view_of(*actor, &row, &profile).await?;
        let permission = self
            .friendships
            .permission(actor, friend)
            .await
            .map_err(map_friendship_error)?
            .unwrap_or_default();
        Ok(FriendDetailView {
            friend: view,
            phone: profile.phone,
            permission,
            last_checkin_at: profile.last_checkin_at,
        })
    }

    async fn permission(
        &self,
        actor: &UserId,
        friend: &UserId,
    ) -> Result<FriendPermission, Error> {
        self.visible_row(actor, friend).await?;
        Ok(self
            .friendships
            .permission(actor, friend)
            .await
            .map_err(map_friendship_error)?
            .unwrap_or_default())
    }
}

#[cfg(test)]
#[path = "friendship_service_tests.rs"]
mod tests;
