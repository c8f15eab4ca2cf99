//! User identity as seen by the social engine.
//!
//! Registration and authentication live elsewhere; this module only models
//! the read-only profile fields the engine needs for views and local dates.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors returned by [`UserId::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
///
/// # Examples
/// ```
/// use checkin_social::domain::UserId;
///
/// let id = UserId::new("3fa85f64-5717-4562-b3fc-2c963f66afa6").expect("valid id");
/// assert_eq!(id.to_string(), "3fa85f64-5717-4562-b3fc-2c963f66afa6");
/// assert!(UserId::new(" 3fa85f64-5717-4562-b3fc-2c963f66afa6").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = id.as_ref();
        if raw.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if raw.trim() != raw {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Wrap an already-parsed UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random [`UserId`].
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0.to_string()
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Read-only profile of a registered user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub phone: String,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    /// IANA timezone identifier; unknown values resolve to UTC.
    pub timezone: String,
    pub last_checkin_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    /// Name shown to other users: the nickname when set, otherwise the phone.
    ///
    /// # Examples
    /// ```
    /// use checkin_social::domain::{UserId, UserProfile};
    ///
    /// let mut profile = UserProfile {
    ///     id: UserId::random(),
    ///     phone: "5550100".to_owned(),
    ///     nickname: Some("  ".to_owned()),
    ///     avatar_url: None,
    ///     timezone: "UTC".to_owned(),
    ///     last_checkin_at: None,
    /// };
    /// assert_eq!(profile.display_name(), "5550100");
    /// profile.nickname = Some("Ada".to_owned());
    /// assert_eq!(profile.display_name(), "Ada");
    /// ```
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self.nickname.as_deref() {
            Some(nickname) if !nickname.trim().is_empty() => nickname,
            _ => self.phone.as_str(),
        }
    }
}

/// Public identity fields embedded in friend, member and notification views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub id: UserId,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

impl From<&UserProfile> for UserSummary {
    fn from(profile: &UserProfile) -> Self {
        Self {
            id: profile.id,
            display_name: profile.display_name().to_owned(),
            avatar_url: profile.avatar_url.clone(),
        }
    }
}
