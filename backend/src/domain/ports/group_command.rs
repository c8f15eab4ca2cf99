//! Driving port for group lifecycle and membership workflow.

use async_trait::async_trait;

use crate::domain::{Error, GroupDetailView, GroupId, GroupPrivacy, UserId};

/// Request to create a group owned by `actor`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateGroupRequest {
    pub actor: UserId,
    pub name: String,
    pub privacy: GroupPrivacy,
    /// Ignored for private groups.
    pub requires_approval: bool,
}

/// Request to post on a group's encouragement wall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEncourageRequest {
    pub actor: UserId,
    pub group: GroupId,
    pub emoji: String,
    pub message: Option<String>,
}

/// Driving port for group mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupCommand: Send + Sync {
    /// Create a group with the actor as its accepted owner.
    async fn create_group(&self, request: CreateGroupRequest) -> Result<GroupDetailView, Error>;

    /// Join by join code or numeric id.
    ///
    /// Private groups require the live join code. Approval-gated public
    /// groups return a pending view with an empty roster.
    ///
    /// # Errors
    ///
    /// - `not_found` when nothing matches `code_or_id`.
    /// - `forbidden` for a private group without its join code.
    /// - `too_many_requests` when re-applying within the cooldown.
    async fn join_group(&self, actor: &UserId, code_or_id: &str)
    -> Result<GroupDetailView, Error>;

    /// Accept a pending applicant.
    ///
    /// # Errors
    ///
    /// - `forbidden` unless the actor is an accepted owner or admin.
    /// - `not_found` when the applicant has no pending request.
    async fn approve_member(
        &self,
        actor: &UserId,
        group: GroupId,
        applicant: &UserId,
    ) -> Result<GroupDetailView, Error>;

    /// Decline and delete a pending application.
    ///
    /// # Errors
    ///
    /// Same as [`GroupCommand::approve_member`].
    async fn reject_member(
        &self,
        actor: &UserId,
        group: GroupId,
        applicant: &UserId,
    ) -> Result<GroupDetailView, Error>;

    /// Rename the group. Owners and admins only.
    async fn update_name(
        &self,
        actor: &UserId,
        group: GroupId,
        name: String,
    ) -> Result<GroupDetailView, Error>;

    /// Replace or clear the announcement. Owners and admins only.
    async fn update_announcement(
        &self,
        actor: &UserId,
        group: GroupId,
        announcement: Option<String>,
    ) -> Result<GroupDetailView, Error>;

    /// Issue a fresh join code for a private group. Owners and admins only.
    ///
    /// # Errors
    ///
    /// Returns `invalid_request` for public groups.
    async fn rotate_invite_code(
        &self,
        actor: &UserId,
        group: GroupId,
    ) -> Result<GroupDetailView, Error>;

    /// Post on the group wall. Accepted members only; not rate limited.
    async fn encourage_group(&self, request: GroupEncourageRequest) -> Result<(), Error>;

    /// Nudge the group. Accepted members only; not rate limited.
    async fn remind_group(&self, actor: &UserId, group: GroupId) -> Result<(), Error>;
}
