//! Reminder and encouragement facts.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{GroupId, UserId};

/// Default page size for the group encouragement wall.
pub const ENCOURAGEMENT_WALL_DEFAULT_LIMIT: u32 = 20;
/// Largest page size for the group encouragement wall.
pub const ENCOURAGEMENT_WALL_MAX_LIMIT: u32 = 100;
/// Author label used when the writer no longer resolves.
pub const UNKNOWN_AUTHOR: &str = "member";

/// "`from` reminded `to` on `local_date`"; unique per triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub from: UserId,
    pub to: UserId,
    /// The recipient's local date when the reminder was sent.
    pub local_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Free-form cheer sent to a friend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encouragement {
    pub from: UserId,
    pub to: UserId,
    pub emoji: String,
    pub message: Option<String>,
    /// The recipient's local date when the encouragement was sent.
    pub local_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

/// Whether a reminder had any effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemindOutcome {
    pub sent: bool,
    /// The daily reminder for this pair was already used.
    pub limited: bool,
}

impl RemindOutcome {
    /// A reminder was recorded and delivered.
    #[must_use]
    pub const fn sent() -> Self {
        Self {
            sent: true,
            limited: false,
        }
    }

    /// Today's reminder was already sent; nothing changed.
    #[must_use]
    pub const fn limited() -> Self {
        Self {
            sent: false,
            limited: true,
        }
    }
}

/// Store-assigned encouragement wall entry identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncouragementId(i64);

impl EncouragementId {
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

/// Post on a group's encouragement wall.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEncouragement {
    pub id: EncouragementId,
    pub group_id: GroupId,
    pub author: UserId,
    pub emoji: String,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl GroupEncouragement {
    /// Wall text: emoji followed by the optional message.
    ///
    /// # Examples
    /// ```
    /// use chrono::Utc;
    /// use checkin_social::domain::{EncouragementId, GroupEncouragement, GroupId, UserId};
    ///
    /// let post = GroupEncouragement {
    ///     id: EncouragementId::new(1),
    ///     group_id: GroupId::new(1),
    ///     author: UserId::random(),
    ///     emoji: "🔥".to_owned(),
    ///     message: None,
    ///     created_at: Utc::now(),
    /// };
    /// assert_eq!(post.text(), "🔥");
    /// ```
    #[must_use]
    pub fn text(&self) -> String {
        let message = self.message.as_deref().unwrap_or_default();
        format!("{} {}", self.emoji, message).trim().to_owned()
    }
}

/// Wall entry to append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroupEncouragement {
    pub group_id: GroupId,
    pub author: UserId,
    pub emoji: String,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// "`user` nudged `group`" fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReminder {
    pub group_id: GroupId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Wall entry hydrated for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEncouragementView {
    pub id: EncouragementId,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Clamp a requested wall page size into the accepted range.
#[must_use]
pub fn clamp_wall_limit(requested: Option<u32>) -> u32 {
    requested
        .unwrap_or(ENCOURAGEMENT_WALL_DEFAULT_LIMIT)
        .clamp(1, ENCOURAGEMENT_WALL_MAX_LIMIT)
}
