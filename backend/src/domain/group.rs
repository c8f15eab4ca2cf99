//! Group and membership model.
//!
//! Each `(group, user)` pair owns at most one membership row. Re-applying
//! reuses that row rather than adding another.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeDelta, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{UserId, UserSummary};

/// Number of digits in a join code.
pub const JOIN_CODE_LENGTH: usize = 6;

/// Attempts made to find an unused join code before giving up.
pub const JOIN_CODE_MAX_ATTEMPTS: usize = 64;

/// Hours a pending applicant must wait before re-applying.
pub const JOIN_APPLY_COOLDOWN_HOURS: i64 = 24;

/// Announcement given to newly created groups.
pub const DEFAULT_ANNOUNCEMENT: &str = "Welcome to the group!";

/// Re-apply cooldown for approval-gated groups.
#[must_use]
pub fn join_apply_cooldown() -> TimeDelta {
    TimeDelta::hours(JOIN_APPLY_COOLDOWN_HOURS)
}

/// Store-assigned group identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(i64);

impl GroupId {
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

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Short numeric invite token.
///
/// # Examples
/// ```
/// use checkin_social::domain::JoinCode;
///
/// assert!(JoinCode::parse("012345").is_some());
/// assert!(JoinCode::parse("12345").is_none());
/// assert!(JoinCode::parse("12a456").is_none());
/// assert_eq!(JoinCode::generate().as_str().len(), 6);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinCode(String);

impl JoinCode {
    /// Draw a fresh random code.
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_with(&mut rand::thread_rng())
    }

    /// Draw a code from the supplied random source.
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..JOIN_CODE_LENGTH)
            .map(|_| char::from(b'0' + rng.gen_range(0..10_u8)))
            .collect();
        Self(code)
    }

    /// Accept `raw` if it has the join code shape.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let well_formed = raw.len() == JOIN_CODE_LENGTH && raw.bytes().all(|b| b.is_ascii_digit());
        well_formed.then(|| Self(raw.to_owned()))
    }

    /// Borrow the code text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for JoinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Group visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupPrivacy {
    Public,
    /// Entry requires the live join code; announcement and roster are hidden
    /// from non-members.
    Private,
}

impl GroupPrivacy {
    /// Stable storage identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl FromStr for GroupPrivacy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            other => Err(format!("unknown group privacy: {other}")),
        }
    }
}

/// Persisted group record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub privacy: GroupPrivacy,
    pub requires_approval: bool,
    pub join_code: JoinCode,
    pub owner: UserId,
    pub announcement: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Group {
    /// Whether joining waits for an admin decision.
    ///
    /// Private groups never do: possessing the code is the approval.
    #[must_use]
    pub fn join_needs_approval(&self) -> bool {
        self.privacy == GroupPrivacy::Public && self.requires_approval
    }

    /// Whether `presented` grants entry through the invite code.
    #[must_use]
    pub fn code_matches(&self, presented: &str) -> bool {
        self.join_code.as_str() == presented
    }

    /// Whether this group is private.
    #[must_use]
    pub fn is_private(&self) -> bool {
        self.privacy == GroupPrivacy::Private
    }
}

/// Group about to be created; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    pub name: String,
    pub privacy: GroupPrivacy,
    pub requires_approval: bool,
    pub join_code: JoinCode,
    pub owner: UserId,
    pub announcement: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Role held by a member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Owner,
    Admin,
    Member,
}

impl MemberRole {
    /// Owners and admins manage the group.
    #[must_use]
    pub const fn can_manage(self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }

    /// Stable storage identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Member => "member",
        }
    }
}

impl FromStr for MemberRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "member" => Ok(Self::Member),
            other => Err(format!("unknown member role: {other}")),
        }
    }
}

/// Membership state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Pending,
    Accepted,
}

impl MemberStatus {
    /// Stable storage identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
        }
    }
}

impl FromStr for MemberStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "accepted" => Ok(Self::Accepted),
            other => Err(format!("unknown member status: {other}")),
        }
    }
}

/// Membership row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMember {
    pub group_id: GroupId,
    pub user_id: UserId,
    pub role: MemberRole,
    pub status: MemberStatus,
    pub requested_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl GroupMember {
    /// Accepted owner row seeded at group creation.
    #[must_use]
    pub fn owner(group_id: GroupId, user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            group_id,
            user_id,
            role: MemberRole::Owner,
            status: MemberStatus::Accepted,
            requested_at: now,
            approved_at: Some(now),
        }
    }

    /// Whether this row is an accepted membership.
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        self.status == MemberStatus::Accepted
    }

    /// Whether this row grants management rights.
    #[must_use]
    pub fn is_accepted_manager(&self) -> bool {
        self.is_accepted() && self.role.can_manage()
    }
}

/// The viewer's relationship to a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipLabel {
    None,
    Pending,
    Member,
}

impl MembershipLabel {
    /// Label for an optional membership row.
    #[must_use]
    pub fn of(member: Option<&GroupMember>) -> Self {
        match member.map(|row| row.status) {
            None => Self::None,
            Some(MemberStatus::Pending) => Self::Pending,
            Some(MemberStatus::Accepted) => Self::Member,
        }
    }

    /// Stable wire identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pending => "pending",
            Self::Member => "member",
        }
    }
}

/// Roster entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMemberView {
    pub user: UserSummary,
    pub role: MemberRole,
    /// Whether the member has checked in on their own local today.
    pub checked_in_today: bool,
}

/// Group detail as seen by a specific viewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupDetailView {
    pub id: GroupId,
    pub name: String,
    pub privacy: GroupPrivacy,
    pub requires_approval: bool,
    pub announcement: Option<String>,
    pub status: MembershipLabel,
    pub members: Vec<GroupMemberView>,
    /// Present only for accepted members of private groups.
    pub join_code: Option<String>,
}

/// Group list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSummaryView {
    pub id: GroupId,
    pub name: String,
    pub privacy: GroupPrivacy,
    pub requires_approval: bool,
    pub members_count: u32,
    /// Accepted members with a check-in on the viewer's local today.
    pub active_today: u32,
    pub status: MembershipLabel,
}
