//! Shared lookups against the read-only user and check-in ports.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;

use super::ports::{CheckinOracle, CheckinOracleError, UserDirectory, UserDirectoryError};
use super::{Error, LocalCalendar, UserId, UserProfile, streak_days};

pub(crate) fn map_user_directory_error(error: UserDirectoryError) -> Error {
    match error {
        UserDirectoryError::Connection { message } => {
            Error::service_unavailable(format!("user directory unavailable: {message}"))
        }
        UserDirectoryError::Query { message } => {
            Error::internal(format!("user directory error: {message}"))
        }
    }
}

pub(crate) fn map_checkin_oracle_error(error: CheckinOracleError) -> Error {
    match error {
        CheckinOracleError::Connection { message } => {
            Error::service_unavailable(format!("checkin store unavailable: {message}"))
        }
        CheckinOracleError::Query { message } => {
            Error::internal(format!("checkin store error: {message}"))
        }
    }
}

/// Load a profile that must exist.
pub(crate) async fn require_profile<U>(users: &U, id: &UserId) -> Result<UserProfile, Error>
where
    U: UserDirectory + ?Sized,
{
    users
        .find_by_id(id)
        .await
        .map_err(map_user_directory_error)?
        .ok_or_else(|| Error::not_found(format!("user {id} not found")))
}

/// Profiles for `ids`, keyed by id. Unknown ids are absent from the map.
pub(crate) async fn profiles_by_id<U>(
    users: &U,
    ids: &[UserId],
) -> Result<HashMap<UserId, UserProfile>, Error>
where
    U: UserDirectory + ?Sized,
{
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let unique: Vec<UserId> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
    let profiles = users
        .find_many(&unique)
        .await
        .map_err(map_user_directory_error)?;
    Ok(profiles
        .into_iter()
        .map(|profile| (profile.id, profile))
        .collect())
}

/// Check-in status of a user on their own local today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CheckinStanding {
    pub today: NaiveDate,
    pub checked_in_today: bool,
    pub streak_days: u32,
}

/// Resolve today's check-in and the trailing streak for `profile`.
pub(crate) async fn checkin_standing<C>(
    checkins: &C,
    calendar: &LocalCalendar,
    profile: &UserProfile,
) -> Result<CheckinStanding, Error>
where
    C: CheckinOracle + ?Sized,
{
    let today = calendar.today_for(profile);
    let dates = checkins
        .checkin_dates(&profile.id, LocalCalendar::streak_window_start(today), today)
        .await
        .map_err(map_checkin_oracle_error)?;
    Ok(CheckinStanding {
        today,
        checked_in_today: dates.contains(&today),
        streak_days: streak_days(&dates, today),
    })
}
