//! PostgreSQL-backed `GroupRepository` implementation.
//!
//! Membership transitions use compare-and-swap updates keyed on the
//! snapshot the engine decided from: a missing row is inserted (the primary
//! key rejects a racing insert) and an existing row is updated only while
//! its status and request time still match. Manager fan-out notifications
//! are written in the same transaction.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{
    GroupRepository, GroupRepositoryError, GroupUpdate, JoinDecision, JoinResolution,
    MembershipTransition,
};
use crate::domain::{
    Group, GroupEncouragement, GroupId, GroupMember, GroupReminder, JoinCode, MemberRole,
    MemberStatus, NewGroup, NewGroupEncouragement, NotificationKind, UserId,
};

use super::error_mapping::{is_unique_violation, map_diesel_error, map_pool_error};
use super::models::{
    GroupEncouragementRow, GroupMemberRow, GroupRow, NewGroupEncouragementRow, NewGroupReminderRow,
    NewGroupRow, NewNotificationRow,
};
use super::pool::DbPool;
use super::schema::{group_encouragements, group_members, group_reminders, groups, notifications};

const JOIN_CODE_CONSTRAINT: &str = "groups_join_code_key";
const MEMBERSHIP_CONSTRAINT: &str = "group_members_pkey";

/// Diesel-backed group repository.
#[derive(Clone)]
pub struct DieselGroupRepository {
    pool: DbPool,
}

impl DieselGroupRepository {
    /// Create a repository using `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn connection(
        &self,
    ) -> Result<
        diesel_async::pooled_connection::bb8::PooledConnection<'_, AsyncPgConnection>,
        GroupRepositoryError,
    > {
        self.pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, GroupRepositoryError::connection))
    }
}

fn group_error(error: diesel::result::Error) -> GroupRepositoryError {
    if is_unique_violation(&error, JOIN_CODE_CONSTRAINT) {
        return GroupRepositoryError::join_code_taken("generated code collided");
    }
    map_diesel_error(
        error,
        GroupRepositoryError::query,
        GroupRepositoryError::connection,
    )
}

fn to_group(row: GroupRow) -> Result<Group, GroupRepositoryError> {
    Group::try_from(row).map_err(GroupRepositoryError::query)
}

fn to_member(row: GroupMemberRow) -> Result<GroupMember, GroupRepositoryError> {
    GroupMember::try_from(row).map_err(GroupRepositoryError::query)
}

/// Outcome of the compare-and-swap inside `apply_membership`.
enum MembershipWrite {
    Applied,
    Stale,
}

#[async_trait]
impl GroupRepository for DieselGroupRepository {
    async fn find_by_id(&self, id: GroupId) -> Result<Option<Group>, GroupRepositoryError> {
        let mut conn = self.connection().await?;
        let row = groups::table
            .find(id.get())
            .select(GroupRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(group_error)?;
        row.map(to_group).transpose()
    }

    async fn find_by_join_code(
        &self,
        code: &JoinCode,
    ) -> Result<Option<Group>, GroupRepositoryError> {
        let mut conn = self.connection().await?;
        let row = groups::table
            .filter(groups::join_code.eq(code.as_str()))
            .select(GroupRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(group_error)?;
        row.map(to_group).transpose()
    }

    async fn list_all(&self) -> Result<Vec<Group>, GroupRepositoryError> {
        let mut conn = self.connection().await?;
        let rows: Vec<GroupRow> = groups::table
            .order_by((groups::created_at.desc(), groups::id.desc()))
            .select(GroupRow::as_select())
            .load(&mut conn)
            .await
            .map_err(group_error)?;
        rows.into_iter().map(to_group).collect()
    }

    async fn create_group(&self, group: &NewGroup) -> Result<Group, GroupRepositoryError> {
        let mut conn = self.connection().await?;
        let new_row = NewGroupRow {
            name: group.name.as_str(),
            privacy: group.privacy.as_str(),
            requires_approval: group.requires_approval,
            join_code: group.join_code.as_str(),
            owner_id: *group.owner.as_uuid(),
            announcement: group.announcement.as_deref(),
            created_at: group.created_at,
        };
        let (owner, created_at) = (group.owner, group.created_at);

        let row = conn
            .transaction(|conn| {
                async move {
                    let row: GroupRow = diesel::insert_into(groups::table)
                        .values(&new_row)
                        .returning(GroupRow::as_returning())
                        .get_result(conn)
                        .await?;
                    let owner = GroupMember::owner(GroupId::new(row.id), owner, created_at);
                    let owner_row = GroupMemberRow::from(&owner);
                    diesel::insert_into(group_members::table)
                        .values(&owner_row)
                        .execute(conn)
                        .await?;
                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(group_error)?;
        to_group(row)
    }

    async fn update_group(
        &self,
        id: GroupId,
        update: &GroupUpdate,
    ) -> Result<Option<Group>, GroupRepositoryError> {
        let mut conn = self.connection().await?;
        let target = groups::table.find(id.get());
        let row = match update {
            GroupUpdate::Name(name) => {
                diesel::update(target)
                    .set(groups::name.eq(name))
                    .returning(GroupRow::as_returning())
                    .get_result(&mut conn)
                    .await
            }
            GroupUpdate::Announcement(announcement) => {
                diesel::update(target)
                    .set(groups::announcement.eq(announcement.as_deref()))
                    .returning(GroupRow::as_returning())
                    .get_result(&mut conn)
                    .await
            }
            GroupUpdate::JoinCode(code) => {
                diesel::update(target)
                    .set(groups::join_code.eq(code.as_str()))
                    .returning(GroupRow::as_returning())
                    .get_result(&mut conn)
                    .await
            }
        }
        .optional()
        .map_err(group_error)?;
        row.map(to_group).transpose()
    }

    async fn membership(
        &self,
        group: GroupId,
        user: &UserId,
    ) -> Result<Option<GroupMember>, GroupRepositoryError> {
        let mut conn = self.connection().await?;
        let row = group_members::table
            .find((group.get(), user.as_uuid()))
            .select(GroupMemberRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(group_error)?;
        row.map(to_member).transpose()
    }

    async fn memberships_of(
        &self,
        user: &UserId,
    ) -> Result<Vec<GroupMember>, GroupRepositoryError> {
        let mut conn = self.connection().await?;
        let rows: Vec<GroupMemberRow> = group_members::table
            .filter(group_members::user_id.eq(user.as_uuid()))
            .select(GroupMemberRow::as_select())
            .load(&mut conn)
            .await
            .map_err(group_error)?;
        rows.into_iter().map(to_member).collect()
    }

    async fn accepted_members(
        &self,
        group: GroupId,
    ) -> Result<Vec<GroupMember>, GroupRepositoryError> {
        let mut conn = self.connection().await?;
        let rows: Vec<GroupMemberRow> = group_members::table
            .filter(group_members::group_id.eq(group.get()))
            .filter(group_members::status.eq(MemberStatus::Accepted.as_str()))
            .order_by((group_members::requested_at, group_members::user_id))
            .select(GroupMemberRow::as_select())
            .load(&mut conn)
            .await
            .map_err(group_error)?;
        rows.into_iter().map(to_member).collect()
    }

    async fn apply_membership(
        &self,
        transition: &MembershipTransition,
    ) -> Result<GroupMember, GroupRepositoryError> {
        let mut conn = self.connection().await?;
        let next = GroupMemberRow::from(&transition.next);
        let expected = transition.expected;
        let notice = &transition.notice;
        let group_id = next.group_id;
        let actor = *notice.actor.as_uuid();
        let managers = vec![MemberRole::Owner.as_str(), MemberRole::Admin.as_str()];

        let outcome = conn
            .transaction(|conn| {
                async move {
                    match expected {
                        None => {
                            let inserted = diesel::insert_into(group_members::table)
                                .values(&next)
                                .on_conflict_do_nothing()
                                .execute(conn)
                                .await?;
                            if inserted == 0 {
                                return Ok(MembershipWrite::Stale);
                            }
                        }
                        Some(snapshot) => {
                            let updated = diesel::update(
                                group_members::table
                                    .find((next.group_id, next.user_id))
                                    .filter(group_members::status.eq(snapshot.status.as_str()))
                                    .filter(group_members::requested_at.eq(snapshot.requested_at)),
                            )
                            .set((
                                group_members::role.eq(&next.role),
                                group_members::status.eq(&next.status),
                                group_members::requested_at.eq(next.requested_at),
                                group_members::approved_at.eq(next.approved_at),
                            ))
                            .execute(conn)
                            .await?;
                            if updated == 0 {
                                return Ok(MembershipWrite::Stale);
                            }
                        }
                    }

                    let recipients: Vec<Uuid> = group_members::table
                        .filter(group_members::group_id.eq(group_id))
                        .filter(group_members::status.eq(MemberStatus::Accepted.as_str()))
                        .filter(group_members::role.eq_any(managers))
                        .select(group_members::user_id)
                        .load(conn)
                        .await?;
                    let rows: Vec<NewNotificationRow<'_>> = recipients
                        .into_iter()
                        .filter(|recipient| !(notice.exclude_actor && *recipient == actor))
                        .map(|recipient| NewNotificationRow {
                            recipient_id: recipient,
                            actor_id: Some(actor),
                            related_group_id: Some(group_id),
                            related_user_id: Some(actor),
                            kind: notice.kind.as_str(),
                            message: notice.message.as_str(),
                            created_at: notice.created_at,
                        })
                        .collect();
                    if !rows.is_empty() {
                        diesel::insert_into(notifications::table)
                            .values(&rows)
                            .execute(conn)
                            .await?;
                    }
                    Ok(MembershipWrite::Applied)
                }
                .scope_boxed()
            })
            .await
            .map_err(|err: diesel::result::Error| {
                if is_unique_violation(&err, MEMBERSHIP_CONSTRAINT) {
                    GroupRepositoryError::stale_membership(group_id)
                } else {
                    group_error(err)
                }
            })?;

        match outcome {
            MembershipWrite::Applied => Ok(transition.next.clone()),
            MembershipWrite::Stale => {
                debug!(group_id, "membership snapshot no longer matches");
                Err(GroupRepositoryError::stale_membership(group_id))
            }
        }
    }

    async fn resolve_join_request(
        &self,
        resolution: &JoinResolution,
    ) -> Result<bool, GroupRepositoryError> {
        let mut conn = self.connection().await?;
        let group_id = resolution.group_id.get();
        let applicant = *resolution.applicant.as_uuid();
        let admin = *resolution.admin.as_uuid();
        let decision = resolution.decision;
        let decided_at = resolution.decided_at;
        let supersede = &resolution.admin_notice;
        let applicant_row = NewNotificationRow::from(&resolution.applicant_notification);

        conn.transaction(|conn| {
            async move {
                let pending = group_members::table
                    .find((group_id, applicant))
                    .filter(group_members::status.eq(MemberStatus::Pending.as_str()));
                let changed = match decision {
                    JoinDecision::Approve => {
                        diesel::update(pending)
                            .set((
                                group_members::status.eq(MemberStatus::Accepted.as_str()),
                                group_members::approved_at.eq(Some(decided_at)),
                            ))
                            .execute(conn)
                            .await?
                    }
                    JoinDecision::Reject => diesel::delete(pending).execute(conn).await?,
                };
                if changed == 0 {
                    return Ok(false);
                }

                let admin_notices = notifications::table
                    .filter(notifications::recipient_id.eq(admin))
                    .filter(notifications::related_group_id.eq(group_id))
                    .filter(notifications::related_user_id.eq(applicant))
                    .filter(notifications::kind.eq(NotificationKind::GroupJoinRequest.as_str()));
                diesel::update(admin_notices)
                    .set((
                        notifications::kind.eq(supersede.kind.as_str()),
                        notifications::message.eq(supersede.message.as_str()),
                        notifications::read_at.eq(Some(supersede.read_at)),
                    ))
                    .execute(conn)
                    .await?;

                diesel::insert_into(notifications::table)
                    .values(&applicant_row)
                    .execute(conn)
                    .await?;
                Ok(true)
            }
            .scope_boxed()
        })
        .await
        .map_err(group_error)
    }

    async fn add_encouragement(
        &self,
        encouragement: &NewGroupEncouragement,
    ) -> Result<GroupEncouragement, GroupRepositoryError> {
        let mut conn = self.connection().await?;
        let row: GroupEncouragementRow = diesel::insert_into(group_encouragements::table)
            .values(NewGroupEncouragementRow {
                group_id: encouragement.group_id.get(),
                author_id: *encouragement.author.as_uuid(),
                emoji: encouragement.emoji.as_str(),
                message: encouragement.message.as_deref(),
                created_at: encouragement.created_at,
            })
            .returning(GroupEncouragementRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(group_error)?;
        Ok(GroupEncouragement::from(row))
    }

    async fn list_encouragements(
        &self,
        group: GroupId,
        limit: u32,
    ) -> Result<Vec<GroupEncouragement>, GroupRepositoryError> {
        let mut conn = self.connection().await?;
        let rows: Vec<GroupEncouragementRow> = group_encouragements::table
            .filter(group_encouragements::group_id.eq(group.get()))
            .order_by((
                group_encouragements::created_at.desc(),
                group_encouragements::id.desc(),
            ))
            .limit(i64::from(limit))
            .select(GroupEncouragementRow::as_select())
            .load(&mut conn)
            .await
            .map_err(group_error)?;
        Ok(rows.into_iter().map(GroupEncouragement::from).collect())
    }

    async fn add_reminder(&self, reminder: &GroupReminder) -> Result<(), GroupRepositoryError> {
        let mut conn = self.connection().await?;
        diesel::insert_into(group_reminders::table)
            .values(NewGroupReminderRow {
                group_id: reminder.group_id.get(),
                user_id: *reminder.user_id.as_uuid(),
                created_at: reminder.created_at,
            })
            .execute(&mut conn)
            .await
            .map_err(group_error)?;
        Ok(())
    }
}
