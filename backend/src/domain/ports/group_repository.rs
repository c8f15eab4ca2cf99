//! Port for group, membership and group interaction persistence.
//!
//! Membership writes are intent-level: the engine decides a transition from
//! the snapshot it read, and the adapter applies it only if the stored row
//! still matches that snapshot. Fan-out notifications to group managers are
//! written in the same unit, so a failed notification insert rolls back the
//! membership change as well.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Group, GroupEncouragement, GroupId, GroupMember, GroupReminder, JoinCode, ManagerNotice,
    MemberStatus, NewGroup, NewGroupEncouragement, NewNotification, Supersede, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by group repository adapters.
    pub enum GroupRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "group repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "group repository query failed: {message}",
        /// The join code is already assigned to another group.
        JoinCodeTaken { code: String } =>
            "join code {code} is already in use",
        /// The membership row changed after it was read.
        StaleMembership { group_id: i64 } =>
            "membership in group {group_id} changed concurrently",
    }
}

/// The parts of a membership row a transition was decided from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MembershipSnapshot {
    pub status: MemberStatus,
    pub requested_at: DateTime<Utc>,
}

impl From<&GroupMember> for MembershipSnapshot {
    fn from(member: &GroupMember) -> Self {
        Self {
            status: member.status,
            requested_at: member.requested_at,
        }
    }
}

/// Create-or-update of a caller's own membership row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipTransition {
    /// Row state the decision was based on; `None` means "no row".
    pub expected: Option<MembershipSnapshot>,
    /// Row to store.
    pub next: GroupMember,
    /// Notification sent to every accepted owner and admin.
    pub notice: ManagerNotice,
}

/// Outcome an admin chose for a pending join request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinDecision {
    Approve,
    Reject,
}

/// Decision on a pending join request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinResolution {
    pub group_id: GroupId,
    pub applicant: UserId,
    pub admin: UserId,
    pub decision: JoinDecision,
    pub decided_at: DateTime<Utc>,
    /// Rewrite applied to each of the admin's join request notices for this
    /// applicant.
    pub admin_notice: Supersede,
    /// Outcome notice delivered to the applicant.
    pub applicant_notification: NewNotification,
}

/// Single-field change to a group record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupUpdate {
    Name(String),
    Announcement(Option<String>),
    JoinCode(JoinCode),
}

/// Port for groups and their memberships.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Fetch a group by id.
    async fn find_by_id(&self, id: GroupId) -> Result<Option<Group>, GroupRepositoryError>;

    /// Fetch the group currently holding `code`.
    async fn find_by_join_code(
        &self,
        code: &JoinCode,
    ) -> Result<Option<Group>, GroupRepositoryError>;

    /// Every group, newest first.
    async fn list_all(&self) -> Result<Vec<Group>, GroupRepositoryError>;

    /// Insert `group` together with its accepted owner membership.
    ///
    /// Fails with [`GroupRepositoryError::JoinCodeTaken`] on a code collision.
    async fn create_group(&self, group: &NewGroup) -> Result<Group, GroupRepositoryError>;

    /// Apply a single-field update. Returns `None` when the group is gone.
    ///
    /// A [`GroupUpdate::JoinCode`] collision fails with
    /// [`GroupRepositoryError::JoinCodeTaken`].
    async fn update_group(
        &self,
        id: GroupId,
        update: &GroupUpdate,
    ) -> Result<Option<Group>, GroupRepositoryError>;

    /// Membership row of `user` in `group`.
    async fn membership(
        &self,
        group: GroupId,
        user: &UserId,
    ) -> Result<Option<GroupMember>, GroupRepositoryError>;

    /// Every membership row held by `user`, in any group.
    async fn memberships_of(&self, user: &UserId)
    -> Result<Vec<GroupMember>, GroupRepositoryError>;

    /// Accepted members of `group`.
    async fn accepted_members(
        &self,
        group: GroupId,
    ) -> Result<Vec<GroupMember>, GroupRepositoryError>;

    /// Apply a membership transition and its manager fan-out atomically.
    ///
    /// Fails with [`GroupRepositoryError::StaleMembership`] when the stored
    /// row no longer matches `transition.expected`.
    async fn apply_membership(
        &self,
        transition: &MembershipTransition,
    ) -> Result<GroupMember, GroupRepositoryError>;

    /// Approve or delete a pending membership, supersede the admin's notice
    /// and notify the applicant, atomically.
    ///
    /// Returns `false` when no pending row exists for the applicant.
    async fn resolve_join_request(
        &self,
        resolution: &JoinResolution,
    ) -> Result<bool, GroupRepositoryError>;

    /// Append a post to the group's encouragement wall.
    async fn add_encouragement(
        &self,
        encouragement: &NewGroupEncouragement,
    ) -> Result<GroupEncouragement, GroupRepositoryError>;

    /// Newest-first wall posts, at most `limit`.
    async fn list_encouragements(
        &self,
        group: GroupId,
        limit: u32,
    ) -> Result<Vec<GroupEncouragement>, GroupRepositoryError>;

    /// Record a group-wide nudge.
    async fn add_reminder(&self, reminder: &GroupReminder) -> Result<(), GroupRepositoryError>;
}
