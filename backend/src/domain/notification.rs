//! Notification log model.
//!
//! Notifications are append-mostly. After insertion a row only changes when
//! it is marked read, or when a [`Supersede`] rewrites an admin's join request
//! notice once that request has been decided.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GroupId, UserId, UserSummary};

/// Default page size for notification listings.
pub const NOTIFICATION_LIST_DEFAULT_LIMIT: u32 = 30;
/// Largest page size a caller may request.
pub const NOTIFICATION_LIST_MAX_LIMIT: u32 = 100;

/// Store-assigned notification identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(i64);

impl NotificationId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What triggered a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Remind,
    Encourage,
    GroupJoinRequest,
    GroupJoined,
    GroupJoinApproved,
    GroupJoinRejected,
}

impl NotificationKind {
    /// Stable storage identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Remind => "remind",
            Self::Encourage => "encourage",
            Self::GroupJoinRequest => "group_join_request",
            Self::GroupJoined => "group_joined",
            Self::GroupJoinApproved => "group_join_approved",
            Self::GroupJoinRejected => "group_join_rejected",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "remind" => Ok(Self::Remind),
            "encourage" => Ok(Self::Encourage),
            "group_join_request" => Ok(Self::GroupJoinRequest),
            "group_joined" => Ok(Self::GroupJoined),
            "group_join_approved" => Ok(Self::GroupJoinApproved),
            "group_join_rejected" => Ok(Self::GroupJoinRejected),
            other => Err(format!("unknown notification kind: {other}")),
        }
    }
}

/// Stored notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: UserId,
    pub actor: Option<UserId>,
    pub related_group: Option<GroupId>,
    pub related_user: Option<UserId>,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// Notification to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub recipient: UserId,
    pub actor: Option<UserId>,
    pub related_group: Option<GroupId>,
    pub related_user: Option<UserId>,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Notification content fanned out to every manager of a group.
///
/// The store resolves the recipients inside the same transaction as the
/// membership change that triggers it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManagerNotice {
    pub actor: UserId,
    pub kind: NotificationKind,
    pub message: String,
    /// Skip the actor when they are a manager themselves.
    pub exclude_actor: bool,
    pub created_at: DateTime<Utc>,
}

/// In-place rewrite of a decided join request notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Supersede {
    pub kind: NotificationKind,
    pub message: String,
    pub read_at: DateTime<Utc>,
}

/// Notification hydrated for its recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationView {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub message: String,
    /// The triggering user, when one exists and still resolves.
    pub from_user: Option<UserSummary>,
    pub related_group_id: Option<GroupId>,
    pub related_user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

/// Outcome of marking a whole inbox read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkAllReadOutcome {
    pub count: u64,
    pub read_at: DateTime<Utc>,
}

/// Clamp a requested page size into the accepted range.
///
/// # Examples
/// ```
/// use checkin_social::domain::clamp_notification_limit;
///
/// assert_eq!(clamp_notification_limit(None), 30);
/// assert_eq!(clamp_notification_limit(Some(0)), 1);
/// assert_eq!(clamp_notification_limit(Some(500)), 100);
/// ```
#[must_use]
pub fn clamp_notification_limit(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(NOTIFICATION_LIST_DEFAULT_LIMIT)
        .clamp(1, NOTIFICATION_LIST_MAX_LIMIT)
}

/// Rewritten message on an admin's approved join request notice.
pub const JOIN_APPROVED_BY_YOU: &str = "You approved this join request";
/// Rewritten message on an admin's declined join request notice.
pub const JOIN_DECLINED_BY_YOU: &str = "You declined this join request";

/// Message templates, one per notification kind.
pub mod messages {
    #[must_use]
    pub fn remind(actor: &str) -> String {
        format!("{actor} reminded you to check in")
    }

    #[must_use]
    pub fn encourage(actor: &str, emoji: &str) -> String {
        format!("{actor} cheered you on {emoji}")
    }

    #[must_use]
    pub fn join_request(actor: &str, group: &str) -> String {
        format!("{actor} asked to join {group}")
    }

    #[must_use]
    pub fn joined(actor: &str, group: &str) -> String {
        format!("{actor} joined {group}")
    }

    #[must_use]
    pub fn join_approved(group: &str) -> String {
        format!("You joined {group}")
    }

    #[must_use]
    pub fn join_rejected(group: &str) -> String {
        format!("Your request to join {group} was declined")
    }
}
