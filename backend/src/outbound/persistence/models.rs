//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types return a
//! plain message on malformed rows; each adapter wraps it in its own port
//! error.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{
    encouragements, friend_settings, friendships, group_encouragements, group_members,
    group_reminders, groups, notifications, reminders, users,
};
use crate::domain::{
    EncouragementId, FriendPermission, Friendship, Group, GroupEncouragement, GroupId,
    GroupMember, JoinCode, NewNotification, Notification, NotificationId, UserId, UserProfile,
};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub phone: String,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    pub timezone: String,
    pub last_checkin_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::from_uuid(row.id),
            phone: row.phone,
            nickname: row.nickname,
            avatar_url: row.avatar_url,
            timezone: row.timezone,
            last_checkin_at: row.last_checkin_at,
        }
    }
}

// ---------------------------------------------------------------------------
// Friendships and interactions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = friendships)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct FriendshipRow {
    pub requester_id: Uuid,
    pub recipient_id: Uuid,
    pub status: String,
    pub blocked_by: Option<Uuid>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<FriendshipRow> for Friendship {
    type Error = String;

    fn try_from(row: FriendshipRow) -> Result<Self, Self::Error> {
        Ok(Self {
            requester: UserId::from_uuid(row.requester_id),
            recipient: UserId::from_uuid(row.recipient_id),
            status: row.status.parse()?,
            blocked_by: row.blocked_by.map(UserId::from_uuid),
            message: row.message,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = friendships)]
pub(crate) struct NewFriendshipRow<'a> {
    pub requester_id: Uuid,
    pub recipient_id: Uuid,
    pub status: &'a str,
    pub blocked_by: Option<Uuid>,
    pub message: Option<&'a str>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl<'a> From<&'a Friendship> for NewFriendshipRow<'a> {
    fn from(friendship: &'a Friendship) -> Self {
        Self {
            requester_id: *friendship.requester.as_uuid(),
            recipient_id: *friendship.recipient.as_uuid(),
            status: friendship.status.as_str(),
            blocked_by: friendship.blocked_by.map(|id| *id.as_uuid()),
            message: friendship.message.as_deref(),
            created_at: friendship.created_at,
            updated_at: friendship.updated_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Queryable, Selectable)]
#[diesel(table_name = friend_settings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct FriendSettingRow {
    pub can_view_detail: bool,
    pub can_remind: bool,
}

impl From<FriendSettingRow> for FriendPermission {
    fn from(row: FriendSettingRow) -> Self {
        Self {
            can_view_detail: row.can_view_detail,
            can_remind: row.can_remind,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = friend_settings)]
pub(crate) struct NewFriendSettingRow {
    pub owner_id: Uuid,
    pub target_id: Uuid,
    pub can_view_detail: bool,
    pub can_remind: bool,
    pub updated_at: DateTime<Utc>,
}

impl NewFriendSettingRow {
    pub(crate) fn new(
        owner: &UserId,
        target: &UserId,
        permission: FriendPermission,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            owner_id: *owner.as_uuid(),
            target_id: *target.as_uuid(),
            can_view_detail: permission.can_view_detail,
            can_remind: permission.can_remind,
            updated_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reminders)]
pub(crate) struct NewReminderRow {
    pub from_user: Uuid,
    pub to_user: Uuid,
    pub local_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = encouragements)]
pub(crate) struct NewEncouragementRow<'a> {
    pub from_user: Uuid,
    pub to_user: Uuid,
    pub emoji: &'a str,
    pub message: Option<&'a str>,
    pub local_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = groups)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct GroupRow {
    pub id: i64,
    pub name: String,
    pub privacy: String,
    pub requires_approval: bool,
    pub join_code: String,
    pub owner_id: Uuid,
    pub announcement: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<GroupRow> for Group {
    type Error = String;

    fn try_from(row: GroupRow) -> Result<Self, Self::Error> {
        let join_code = JoinCode::parse(&row.join_code)
            .ok_or_else(|| format!("malformed join code for group {}", row.id))?;
        Ok(Self {
            id: GroupId::new(row.id),
            name: row.name,
            privacy: row.privacy.parse()?,
            requires_approval: row.requires_approval,
            join_code,
            owner: UserId::from_uuid(row.owner_id),
            announcement: row.announcement,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = groups)]
pub(crate) struct NewGroupRow<'a> {
    pub name: &'a str,
    pub privacy: &'a str,
    pub requires_approval: bool,
    pub join_code: &'a str,
    pub owner_id: Uuid,
    pub announcement: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = group_members)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct GroupMemberRow {
    pub group_id: i64,
    pub user_id: Uuid,
    pub role: String,
    pub status: String,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl TryFrom<GroupMemberRow> for GroupMember {
    type Error = String;

    fn try_from(row: GroupMemberRow) -> Result<Self, Self::Error> {
        Ok(Self {
            group_id: GroupId::new(row.group_id),
            user_id: UserId::from_uuid(row.user_id),
            role: row.role.parse()?,
            status: row.status.parse()?,
            requested_at: row.requested_at,
            approved_at: row.approved_at,
        })
    }
}

impl From<&GroupMember> for GroupMemberRow {
    fn from(member: &GroupMember) -> Self {
        Self {
            group_id: member.group_id.get(),
            user_id: *member.user_id.as_uuid(),
            role: member.role.as_str().to_owned(),
            status: member.status.as_str().to_owned(),
            requested_at: member.requested_at,
            approved_at: member.approved_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = group_encouragements)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct GroupEncouragementRow {
    pub id: i64,
    pub group_id: i64,
    pub author_id: Uuid,
    pub emoji: String,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<GroupEncouragementRow> for GroupEncouragement {
    fn from(row: GroupEncouragementRow) -> Self {
        Self {
            id: EncouragementId::new(row.id),
            group_id: GroupId::new(row.group_id),
            author: UserId::from_uuid(row.author_id),
            emoji: row.emoji,
            message: row.message,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = group_encouragements)]
pub(crate) struct NewGroupEncouragementRow<'a> {
    pub group_id: i64,
    pub author_id: Uuid,
    pub emoji: &'a str,
    pub message: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = group_reminders)]
pub(crate) struct NewGroupReminderRow {
    pub group_id: i64,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NotificationRow {
    pub id: i64,
    pub recipient_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub related_group_id: Option<i64>,
    pub related_user_id: Option<Uuid>,
    pub kind: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = String;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: NotificationId::new(row.id),
            recipient: UserId::from_uuid(row.recipient_id),
            actor: row.actor_id.map(UserId::from_uuid),
            related_group: row.related_group_id.map(GroupId::new),
            related_user: row.related_user_id.map(UserId::from_uuid),
            kind: row.kind.parse()?,
            message: row.message,
            created_at: row.created_at,
            read_at: row.read_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notifications)]
pub(crate) struct NewNotificationRow<'a> {
    pub recipient_id: Uuid,
    pub actor_id: Option<Uuid>,
    pub related_group_id: Option<i64>,
    pub related_user_id: Option<Uuid>,
    pub kind: &'a str,
    pub message: &'a str,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a NewNotification> for NewNotificationRow<'a> {
    fn from(notification: &'a NewNotification) -> Self {
        Self {
            recipient_id: *notification.recipient.as_uuid(),
            actor_id: notification.actor.map(|id| *id.as_uuid()),
            related_group_id: notification.related_group.map(GroupId::get),
            related_user_id: notification.related_user.map(|id| *id.as_uuid()),
            kind: notification.kind.as_str(),
            message: notification.message.as_str(),
            created_at: notification.created_at,
        }
    }
}
