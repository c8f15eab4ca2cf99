//! Friendship relationship model.
//!
//! A friendship is stored as one row per unordered pair of users. The row is
//! ordered `(requester, recipient)`; the order only matters while the request
//! is pending, where it records who must accept.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{UserId, UserSummary};

/// Lifecycle state of a friendship row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    /// Terminal; there is no unblock transition.
    Blocked,
}

impl FriendshipStatus {
    /// Stable storage identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Blocked => "blocked",
        }
    }
}

impl std::str::FromStr for FriendshipStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            "blocked" => Ok(Self::Blocked),
            other => Err(format!("unknown friendship status: {other}")),
        }
    }
}

/// Canonical friendship row for an unordered pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Friendship {
    pub requester: UserId,
    pub recipient: UserId,
    pub status: FriendshipStatus,
    pub blocked_by: Option<UserId>,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Friendship {
    /// Start a pending request from `requester` to `recipient`.
    #[must_use]
    pub fn pending(
        requester: UserId,
        recipient: UserId,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            requester,
            recipient,
            status: FriendshipStatus::Pending,
            blocked_by: None,
            message,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `user` is one of the two parties.
    #[must_use]
    pub fn involves(&self, user: UserId) -> bool {
        self.requester == user || self.recipient == user
    }

    /// The party that is not `user`.
    #[must_use]
    pub fn other_party(&self, user: UserId) -> UserId {
        if self.requester == user {
            self.recipient
        } else {
            self.requester
        }
    }

    /// Direction-aware label for `viewer`.
    ///
    /// Blocked rows yield `None` because they are never shown.
    #[must_use]
    pub fn label_for(&self, viewer: UserId) -> Option<FriendStatusLabel> {
        match self.status {
            FriendshipStatus::Accepted => Some(FriendStatusLabel::Accepted),
            FriendshipStatus::Pending if self.requester == viewer => {
                Some(FriendStatusLabel::PendingOut)
            }
            FriendshipStatus::Pending => Some(FriendStatusLabel::PendingIn),
            FriendshipStatus::Blocked => None,
        }
    }

    /// Whether both parties may interact through this row.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.status == FriendshipStatus::Accepted
    }
}

/// How a relationship appears from one party's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FriendStatusLabel {
    /// The viewer sent a request that is still waiting.
    PendingOut,
    /// The other party sent a request the viewer can accept.
    PendingIn,
    Accepted,
}

impl FriendStatusLabel {
    /// Stable wire identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PendingOut => "pending_out",
            Self::PendingIn => "pending_in",
            Self::Accepted => "accepted",
        }
    }
}

/// Directed permission record owned by `owner` about `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FriendPermission {
    pub can_view_detail: bool,
    pub can_remind: bool,
}

impl Default for FriendPermission {
    fn default() -> Self {
        Self {
            can_view_detail: false,
            can_remind: true,
        }
    }
}

/// Partial permission update; absent fields keep their stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FriendPermissionPatch {
    pub can_view_detail: Option<bool>,
    pub can_remind: Option<bool>,
}

impl FriendPermission {
    /// Apply a partial update.
    ///
    /// # Examples
    /// ```
    /// use checkin_social::domain::{FriendPermission, FriendPermissionPatch};
    ///
    /// let updated = FriendPermission::default().apply(FriendPermissionPatch {
    ///     can_view_detail: Some(true),
    ///     can_remind: None,
    /// });
    /// assert!(updated.can_view_detail);
    /// assert!(updated.can_remind);
    /// ```
    #[must_use]
    pub fn apply(self, patch: FriendPermissionPatch) -> Self {
        Self {
            can_view_detail: patch.can_view_detail.unwrap_or(self.can_view_detail),
            can_remind: patch.can_remind.unwrap_or(self.can_remind),
        }
    }
}

/// Friend list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendView {
    pub user: UserSummary,
    pub status: FriendStatusLabel,
    pub message: Option<String>,
    /// Whether the friend has checked in on their own local today.
    pub checked_in_today: bool,
    pub streak_days: u32,
}

/// Friend list entry enriched with the viewer's permission settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendDetailView {
    pub friend: FriendView,
    pub phone: String,
    pub permission: FriendPermission,
    pub last_checkin_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn row(status: FriendshipStatus) -> (Friendship, UserId, UserId) {
        let requester = UserId::random();
        let recipient = UserId::random();
        let mut friendship = Friendship::pending(requester, recipient, None, Utc::now());
        friendship.status = status;
        (friendship, requester, recipient)
    }

    #[rstest]
    #[case(FriendshipStatus::Pending, Some(FriendStatusLabel::PendingOut), Some(FriendStatusLabel::PendingIn))]
    #[case(FriendshipStatus::Accepted, Some(FriendStatusLabel::Accepted), Some(FriendStatusLabel::Accepted))]
    #[case(FriendshipStatus::Blocked, None, None)]
    fn labels_are_direction_aware(
        #[case] status: FriendshipStatus,
        #[case] for_requester: Option<FriendStatusLabel>,
        #[case] for_recipient: Option<FriendStatusLabel>,
    ) {
        let (friendship, requester, recipient) = row(status);
        assert_eq!(friendship.label_for(requester), for_requester);
        assert_eq!(friendship.label_for(recipient), for_recipient);
    }

    #[test]
    fn other_party_is_symmetric() {
        let (friendship, requester, recipient) = row(FriendshipStatus::Accepted);
        assert_eq!(friendship.other_party(requester), recipient);
        assert_eq!(friendship.other_party(recipient), requester);
    }

    #[test]
    fn default_permission_allows_reminders_only() {
        let permission = FriendPermission::default();
        assert!(!permission.can_view_detail);
        assert!(permission.can_remind);
    }

    #[test]
    fn status_labels_serialise_as_snake_case() {
        let value = serde_json::to_value(FriendStatusLabel::PendingOut).expect("serialise");
        assert_eq!(value, "pending_out");
    }
}
