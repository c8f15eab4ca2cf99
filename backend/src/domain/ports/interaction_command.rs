//! Driving port for one-to-one nudges between friends.

use async_trait::async_trait;

use crate::domain::{Error, RemindOutcome, UserId};

/// Request to cheer a friend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncourageFriendRequest {
    pub actor: UserId,
    pub friend: UserId,
    pub emoji: String,
    pub message: Option<String>,
}

/// Driving port for reminders and encouragements.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InteractionCommand: Send + Sync {
    /// Remind `friend` to check in, at most once per friend-local day.
    ///
    /// A repeat on the same day is not an error; it reports `limited`.
    ///
    /// # Errors
    ///
    /// - `not_found` unless the pair are accepted friends.
    /// - `forbidden` when the friend has turned off reminders from the actor.
    async fn remind_friend(&self, actor: &UserId, friend: &UserId)
    -> Result<RemindOutcome, Error>;

    /// Send an encouragement. Never rate limited.
    ///
    /// # Errors
    ///
    /// Returns `not_found` unless the pair are accepted friends.
    async fn encourage_friend(&self, request: EncourageFriendRequest) -> Result<(), Error>;
}
