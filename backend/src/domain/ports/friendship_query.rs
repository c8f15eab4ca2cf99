//! Driving port for friendship read models.

use async_trait::async_trait;

use crate::domain::{Error, FriendDetailView, FriendPermission, FriendView, UserId};

/// Driving port for friend lists and details.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FriendshipQuery: Send + Sync {
    /// Every non-blocked relationship involving `actor`.
    async fn list_friends(&self, actor: &UserId) -> Result<Vec<FriendView>, Error>;

    /// One relationship plus the actor's permission settings.
    ///
    /// # Errors
    ///
    /// Returns `not_found` for missing or blocked relationships.
    async fn friend_detail(&self, actor: &UserId, friend: &UserId)
    -> Result<FriendDetailView, Error>;

    /// The actor's permission settings towards `friend`, defaulted if unset.
    ///
    /// # Errors
    ///
    /// Returns `not_found` for missing or blocked relationships.
    async fn permission(&self, actor: &UserId, friend: &UserId)
    -> Result<FriendPermission, Error>;
}
