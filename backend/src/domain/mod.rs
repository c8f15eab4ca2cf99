//! Domain primitives, aggregates and services.
//!
//! Purpose: model friendships, groups, reminders, encouragements and
//! notifications, and implement the driving ports on top of the driven
//! ports in [`ports`]. Types are transport agnostic; the inbound HTTP adapter
//! owns the wire representations.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - UserId / UserProfile: external identity as seen by the engine.
//! - FriendshipService, InteractionService, GroupService, NotificationService:
//!   driving port implementations.

pub mod calendar;
pub mod error;
pub mod friendship;
mod friendship_service;
pub mod group;
mod group_service;
pub mod interaction;
mod interaction_service;
mod lookup;
pub mod notification;
mod notification_service;
pub mod ports;
#[cfg(test)]
pub(crate) mod test_support;
pub mod trace_id;
pub mod user;

pub use self::calendar::{
    LocalCalendar, STREAK_WINDOW_DAYS, local_date_at, resolve_timezone, streak_days,
};
pub use self::error::{Error, ErrorCode};
pub use self::friendship::{
    FriendDetailView, FriendPermission, FriendPermissionPatch, FriendStatusLabel, FriendView,
    Friendship, FriendshipStatus,
};
pub use self::friendship_service::FriendshipService;
pub use self::group::{
    DEFAULT_ANNOUNCEMENT, Group, GroupDetailView, GroupId, GroupMember, GroupMemberView,
    GroupPrivacy, GroupSummaryView, JOIN_APPLY_COOLDOWN_HOURS, JOIN_CODE_LENGTH,
    JOIN_CODE_MAX_ATTEMPTS, JoinCode, MemberRole, MemberStatus, MembershipLabel, NewGroup,
    join_apply_cooldown,
};
pub use self::group_service::GroupService;
pub use self::interaction::{
    ENCOURAGEMENT_WALL_DEFAULT_LIMIT, ENCOURAGEMENT_WALL_MAX_LIMIT, Encouragement,
    EncouragementId, GroupEncouragement, GroupEncouragementView, GroupReminder,
    NewGroupEncouragement, RemindOutcome, Reminder, UNKNOWN_AUTHOR, clamp_wall_limit,
};
pub use self::interaction_service::InteractionService;
pub use self::notification::{
    JOIN_APPROVED_BY_YOU, JOIN_DECLINED_BY_YOU, ManagerNotice, MarkAllReadOutcome,
    NOTIFICATION_LIST_DEFAULT_LIMIT, NOTIFICATION_LIST_MAX_LIMIT, NewNotification,
    Notification, NotificationId, NotificationKind, NotificationView, Supersede,
    clamp_notification_limit, messages,
};
pub use self::notification_service::NotificationService;
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{UserId, UserProfile, UserSummary, UserValidationError};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use checkin_social::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::forbidden("nope"))
/// }
/// assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
