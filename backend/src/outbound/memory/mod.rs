//! In-process adapter implementing every driven port.
//!
//! All state lives behind one mutex and every port method takes the lock
//! exactly once, so each method is a single atomic unit just as each
//! PostgreSQL adapter method is one transaction. Used by integration tests
//! and as the development fallback when no database is configured.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;

use crate::domain::{
    Encouragement, FriendPermission, Friendship, FriendshipStatus, Group, GroupEncouragement,
    GroupId, GroupMember, GroupReminder, NewNotification, Notification, NotificationId, UserId,
    UserProfile,
};

mod directory;
mod friendships;
mod groups;
mod notifications;

/// Poisoned-lock failure, converted into each port's `Query` variant.
const POISONED: &str = "in-memory store lock poisoned";

#[derive(Debug, Default)]
struct State {
    users: HashMap<UserId, UserProfile>,
    checkins: HashSet<(UserId, NaiveDate)>,
    friendships: Vec<Friendship>,
    permissions: HashMap<(UserId, UserId), FriendPermission>,
    reminders: HashSet<(UserId, UserId, NaiveDate)>,
    encouragements: Vec<Encouragement>,
    notifications: Vec<Notification>,
    groups: BTreeMap<GroupId, Group>,
    members: BTreeMap<(GroupId, UserId), GroupMember>,
    wall: Vec<GroupEncouragement>,
    group_reminders: Vec<GroupReminder>,
    last_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn push_notification(&mut self, notification: &NewNotification) -> NotificationId {
        let id = NotificationId::new(self.next_id());
        self.notifications.push(Notification {
            id,
            recipient: notification.recipient,
            actor: notification.actor,
            related_group: notification.related_group,
            related_user: notification.related_user,
            kind: notification.kind,
            message: notification.message.clone(),
            created_at: notification.created_at,
            read_at: None,
        });
        id
    }

    fn friendship_between(&self, a: &UserId, b: &UserId) -> Option<&Friendship> {
        self.friendships
            .iter()
            .find(|row| row.involves(*a) && row.involves(*b))
    }
}

/// Social store held entirely in memory.
///
/// Cloning is cheap and clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemorySocialStore {
    state: Arc<Mutex<State>>,
}

impl InMemorySocialStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, &'static str> {
        self.state.lock().map_err(|_| POISONED)
    }

    /// Register or replace a user profile.
    pub fn add_user(&self, profile: UserProfile) {
        if let Ok(mut state) = self.lock() {
            state.users.insert(profile.id, profile);
        }
    }

    /// Record that `user` checked in on their local `date`.
    pub fn add_checkin(&self, user: UserId, date: NaiveDate) {
        if let Ok(mut state) = self.lock() {
            state.checkins.insert((user, date));
        }
    }

    /// Mark the pair's relationship blocked by `by`, creating the row if
    /// needed. The engine itself never blocks; this seeds that state.
    pub fn block(&self, by: UserId, other: UserId, at: chrono::DateTime<chrono::Utc>) {
        let Ok(mut state) = self.lock() else {
            return;
        };
        if let Some(row) = state
            .friendships
            .iter_mut()
            .find(|row| row.involves(by) && row.involves(other))
        {
            row.status = FriendshipStatus::Blocked;
            row.blocked_by = Some(by);
            row.updated_at = at;
            return;
        }
        state.friendships.push(Friendship {
            status: FriendshipStatus::Blocked,
            blocked_by: Some(by),
            ..Friendship::pending(by, other, None, at)
        });
    }

    /// Number of reminders `from` has sent to `to`, across all dates.
    #[must_use]
    pub fn reminder_count(&self, from: UserId, to: UserId) -> usize {
        self.lock().map_or(0, |state| {
            state
                .reminders
                .iter()
                .filter(|(sender, recipient, _)| *sender == from && *recipient == to)
                .count()
        })
    }

    /// Number of encouragements `from` has sent to `to`.
    #[must_use]
    pub fn encouragement_count(&self, from: UserId, to: UserId) -> usize {
        self.lock().map_or(0, |state| {
            state
                .encouragements
                .iter()
                .filter(|row| row.from == from && row.to == to)
                .count()
        })
    }

    /// Number of group-wide nudges recorded for `group`.
    #[must_use]
    pub fn group_reminder_count(&self, group: GroupId) -> usize {
        self.lock().map_or(0, |state| {
            state
                .group_reminders
                .iter()
                .filter(|row| row.group_id == group)
                .count()
        })
    }

    /// Friendship rows stored for the unordered pair.
    #[must_use]
    pub fn friendship_rows(&self, a: UserId, b: UserId) -> usize {
        self.lock().map_or(0, |state| {
            state
                .friendships
                .iter()
                .filter(|row| row.involves(a) && row.involves(b))
                .count()
        })
    }
}
