//! Shared helper utilities for backend integration tests.
//!
//! Integration tests compile as separate crates under `backend/tests/`, so
//! the fixture world lives here rather than in each test file.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use mockable::Clock;

use checkin_social::domain::{
    FriendshipService, GroupService, InteractionService, LocalCalendar, NotificationService,
    UserId, UserProfile,
};
use checkin_social::outbound::memory::InMemorySocialStore;

type Store = InMemorySocialStore;

/// Clock pinned to an instant that tests move forward explicitly.
pub struct SteppingClock {
    now: Mutex<DateTime<Utc>>,
}

impl SteppingClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock");
        *now += by;
    }
}

impl Clock for SteppingClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

pub fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
        .single()
        .expect("valid fixture timestamp")
}

/// The four engines over one shared in-memory store.
pub struct SocialWorld {
    pub store: Store,
    pub clock: Arc<SteppingClock>,
    pub friendships: FriendshipService<Store, Store, Store>,
    pub interactions: InteractionService<Store, Store, Store>,
    pub groups: GroupService<Store, Store, Store>,
    pub notifications: NotificationService<Store, Store>,
}

impl SocialWorld {
    pub fn new() -> Self {
        let store = InMemorySocialStore::new();
        let shared = Arc::new(store.clone());
        let clock = Arc::new(SteppingClock::at(fixture_now()));
        let calendar = LocalCalendar::new(clock.clone());
        Self {
            friendships: FriendshipService::new(
                shared.clone(),
                shared.clone(),
                shared.clone(),
                calendar.clone(),
            ),
            interactions: InteractionService::new(
                shared.clone(),
                shared.clone(),
                shared.clone(),
                calendar.clone(),
            ),
            groups: GroupService::new(shared.clone(), shared.clone(), shared.clone(), calendar.clone()),
            notifications: NotificationService::new(shared.clone(), shared, calendar),
            store,
            clock,
        }
    }

    /// Register a user in `timezone` and return their id.
    pub fn user(&self, nickname: &str, phone: &str, timezone: &str) -> UserId {
        let id = UserId::random();
        self.store.add_user(UserProfile {
            id,
            phone: phone.to_owned(),
            nickname: Some(nickname.to_owned()),
            avatar_url: None,
            timezone: timezone.to_owned(),
            last_checkin_at: None,
        });
        id
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.utc().date_naive()
    }
}
