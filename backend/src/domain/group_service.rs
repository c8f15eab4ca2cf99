//! Group domain service.
//!
//! Implements [`GroupCommand`] and [`GroupQuery`]. The join and approval
//! workflow lives in `membership`, owner and admin edits in
//! `administration`, and viewer-specific read models in `views`.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::friendship_service::normalize_note;
use crate::domain::lookup::require_profile;
use crate::domain::ports::{
    CheckinOracle, CreateGroupRequest, GroupCommand, GroupEncourageRequest, GroupQuery,
    GroupRepository, GroupRepositoryError, JoinDecision, UserDirectory,
};
use crate::domain::{
    Error, Group, GroupDetailView, GroupEncouragementView, GroupId, GroupMember,
    GroupReminder, GroupSummaryView, LocalCalendar, NewGroupEncouragement, UserId,
};

mod administration;
mod membership;
mod views;

pub(crate) fn map_group_error(error: GroupRepositoryError) -> Error {
    match error {
        GroupRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("group repository unavailable: {message}"))
        }
        GroupRepositoryError::Query { message } => {
            Error::internal(format!("group repository error: {message}"))
        }
        GroupRepositoryError::JoinCodeTaken { code } => {
            Error::internal(format!("join code {code} collided"))
        }
        GroupRepositoryError::StaleMembership { group_id } => {
            Error::conflict(format!("membership in group {group_id} changed, retry"))
        }
    }
}

/// Group service implementing the group driving ports.
#[derive(Clone)]
pub struct GroupService<G, U, C> {
    groups: Arc<G>,
    users: Arc<U>,
    checkins: Arc<C>,
    calendar: LocalCalendar,
}

impl<G, U, C> GroupService<G, U, C> {
    /// Create a new service with the given ports.
    pub fn new(groups: Arc<G>, users: Arc<U>, checkins: Arc<C>, calendar: LocalCalendar) -> Self {
        Self {
            groups,
            users,
            checkins,
            calendar,
        }
    }
}

impl<G, U, C> GroupService<G, U, C>
where
    G: GroupRepository,
    U: UserDirectory,
    C: CheckinOracle,
{
    async fn load_group(&self, id: GroupId) -> Result<Group, Error> {
        self.groups
            .find_by_id(id)
            .await
            .map_err(map_group_error)?
            .ok_or_else(|| Error::not_found(format!("group {id} not found")))
    }

    async fn membership(&self, group: GroupId, user: &UserId) -> Result<Option<GroupMember>, Error> {
        self.groups
            .membership(group, user)
            .await
            .map_err(map_group_error)
    }

    /// Accepted membership of `actor`, or `forbidden`.
    async fn require_member(&self, group: GroupId, actor: &UserId) -> Result<GroupMember, Error> {
        self.membership(group, actor)
            .await?
            .filter(GroupMember::is_accepted)
            .ok_or_else(|| Error::forbidden("only group members can do this"))
    }

    /// Accepted owner or admin membership of `actor`, or `forbidden`.
    async fn require_manager(&self, group: GroupId, actor: &UserId) -> Result<GroupMember, Error> {
        self.membership(group, actor)
            .await?
            .filter(GroupMember::is_accepted_manager)
            .ok_or_else(|| Error::forbidden("only group owners and admins can do this"))
    }

    async fn display_name_of(&self, user: &UserId) -> Result<String, Error> {
        let profile = require_profile(self.users.as_ref(), user).await?;
        Ok(profile.display_name().to_owned())
    }
}

#[async_trait]
impl<G, U, C> GroupCommand for GroupService<G, U, C>
where
    G: GroupRepository,
    U: UserDirectory,
    C: CheckinOracle,
{
    async fn create_group(&self, request: CreateGroupRequest) -> Result<GroupDetailView, Error> {
        self.create(request).await
    }

    async fn join_group(
        &self,
        actor: &UserId,
        code_or_id: &str,
    ) -> Result<GroupDetailView, Error> {
        self.join(actor, code_or_id).await
    }

    async fn approve_member(
        &self,
        actor: &UserId,
        group: GroupId,
        applicant: &UserId,
    ) -> Result<GroupDetailView, Error> {
        self.resolve(actor, group, applicant, JoinDecision::Approve)
            .await
    }

    async fn reject_member(
        &self,
        actor: &UserId,
        group: GroupId,
        applicant: &UserId,
    ) -> Result<GroupDetailView, Error> {
        self.resolve(actor, group, applicant, JoinDecision::Reject)
            .await
    }

    async fn update_name(
        &self,
        actor: &UserId,
        group: GroupId,
        name: String,
    ) -> Result<GroupDetailView, Error> {
        self.rename(actor, group, name).await
    }

    async fn update_announcement(
        &self,
        actor: &UserId,
        group: GroupId,
        announcement: Option<String>,
    ) -> Result<GroupDetailView, Error> {
        self.announce(actor, group, normalize_note(announcement)).await
    }

    async fn rotate_invite_code(
        &self,
        actor: &UserId,
        group: GroupId,
    ) -> Result<GroupDetailView, Error> {
        self.rotate_code(actor, group).await
    }

    async fn encourage_group(&self, request: GroupEncourageRequest) -> Result<(), Error> {
        let group = self.load_group(request.group).await?;
        self.require_member(group.id, &request.actor).await?;
        let emoji = request.emoji.trim().to_owned();
        if emoji.is_empty() {
            return Err(Error::invalid_request("emoji must not be empty"));
        }
        self.groups
            .add_encouragement(&NewGroupEncouragement {
                group_id: group.id,
                author: request.actor,
                emoji,
                message: normalize_note(request.message),
                created_at: self.calendar.now(),
            })
            .await
            .map_err(map_group_error)?;
        Ok(())
    }

    async fn remind_group(&self, actor: &UserId, group: GroupId) -> Result<(), Error> {
        let group = self.load_group(group).await?;
        self.require_member(group.id, actor).await?;
        self.groups
            .add_reminder(&GroupReminder {
                group_id: group.id,
                user_id: *actor,
                created_at: self.calendar.now(),
            })
            .await
            .map_err(map_group_error)
    }
}

#[async_trait]
impl<G, U, C> GroupQuery for GroupService<G, U, C>
where
    G: GroupRepository,
    U: UserDirectory,
    C: CheckinOracle,
{
    async fn list_groups(&self, actor: &UserId) -> Result<Vec<GroupSummaryView>, Error> {
        self.summaries(actor).await
    }

    async fn group_detail(
        &self,
        actor: &UserId,
        group: GroupId,
    ) -> Result<GroupDetailView, Error> {
        let group = self.load_group(group).await?;
        self.detail(actor, &group).await
    }

    async fn list_encouragements(
        &self,
        actor: &UserId,
        group: GroupId,
        limit: Option<u32>,
    ) -> Result<Vec<GroupEncouragementView>, Error> {
        let group = self.load_group(group).await?;
        self.require_member(group.id, actor).await?;
        self.wall(&group, limit).await
    }
}

#[cfg(test)]
mod tests;
