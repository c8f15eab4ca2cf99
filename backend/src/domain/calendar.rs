//! Local calendar resolution and streak arithmetic.
//!
//! Every "today" comparison in the engine is made in the frame of a specific
//! user's timezone. Time is read from an injected [`Clock`] so tests can pin
//! the instant.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, SubsecRound, Utc};
use chrono_tz::Tz;
use mockable::Clock;
use tracing::debug;

use super::UserProfile;

/// Trailing window, in days, inspected when computing a streak.
pub const STREAK_WINDOW_DAYS: u32 = 30;

/// Parse an IANA timezone identifier, falling back to UTC.
///
/// # Examples
/// ```
/// use chrono_tz::Tz;
/// use checkin_social::domain::resolve_timezone;
///
/// assert_eq!(resolve_timezone("Asia/Shanghai"), Tz::Asia__Shanghai);
/// assert_eq!(resolve_timezone("Mars/Olympus"), Tz::UTC);
/// ```
#[must_use]
pub fn resolve_timezone(identifier: &str) -> Tz {
    identifier.trim().parse::<Tz>().unwrap_or_else(|_| {
        debug!(timezone = identifier, "unknown timezone, using UTC");
        Tz::UTC
    })
}

/// Calendar date of `instant` in the given timezone.
#[must_use]
pub fn local_date_at(instant: DateTime<Utc>, timezone: &str) -> NaiveDate {
    instant.with_timezone(&resolve_timezone(timezone)).date_naive()
}

/// Count consecutive days ending at `today` that appear in `dates`.
///
/// The count stops at the first missing day and never exceeds
/// [`STREAK_WINDOW_DAYS`]. A missing `today` yields zero.
///
/// # Examples
/// ```
/// use std::collections::BTreeSet;
/// use chrono::NaiveDate;
/// use checkin_social::domain::streak_days;
///
/// let day = |d| NaiveDate::from_ymd_opt(2024, 3, d).expect("valid date");
/// let dates: BTreeSet<_> = [day(8), day(9), day(10), day(6)].into_iter().collect();
/// assert_eq!(streak_days(&dates, day(10)), 3);
/// assert_eq!(streak_days(&dates, day(11)), 0);
/// ```
#[must_use]
pub fn streak_days(dates: &BTreeSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut cursor = Some(today);
    while let Some(day) = cursor {
        if streak >= STREAK_WINDOW_DAYS || !dates.contains(&day) {
            break;
        }
        streak += 1;
        cursor = day.checked_sub_days(Days::new(1));
    }
    streak
}

/// Resolves "today" for users from an injected clock.
#[derive(Clone)]
pub struct LocalCalendar {
    clock: Arc<dyn Clock>,
}

impl LocalCalendar {
    /// Create a calendar reading time from `clock`.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Current instant in UTC, truncated to the microsecond precision of
    /// stored timestamps.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.utc().trunc_subsecs(6)
    }

    /// Today's date in the user's own timezone.
    #[must_use]
    pub fn today_for(&self, profile: &UserProfile) -> NaiveDate {
        local_date_at(self.now(), &profile.timezone)
    }

    /// First day of the streak window ending at `today`.
    #[must_use]
    pub fn streak_window_start(today: NaiveDate) -> NaiveDate {
        today
            .checked_sub_days(Days::new(u64::from(STREAK_WINDOW_DAYS - 1)))
            .unwrap_or(today)
    }
}
