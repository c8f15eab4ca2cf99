//! Shared fixtures for domain service unit tests.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;

use super::{LocalCalendar, UserId, UserProfile};

pub(crate) fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
        .single()
        .expect("valid fixture timestamp")
}

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub(crate) fn calendar_at(utc_now: DateTime<Utc>) -> LocalCalendar {
    LocalCalendar::new(Arc::new(FixtureClock { utc_now }))
}

pub(crate) fn fixture_calendar() -> LocalCalendar {
    calendar_at(fixture_timestamp())
}

pub(crate) fn profile(nickname: &str, phone: &str) -> UserProfile {
    UserProfile {
        id: UserId::random(),
        phone: phone.to_owned(),
        nickname: Some(nickname.to_owned()),
        avatar_url: None,
        timezone: "UTC".to_owned(),
        last_checkin_at: None,
    }
}
