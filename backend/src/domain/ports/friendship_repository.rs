//! Port for friendship and friend permission persistence.
//!
//! Adapters store one friendship row per unordered pair of users and enforce
//! that invariant with a uniqueness constraint, so concurrent requests for the
//! same pair cannot both create rows. Accepting a request and seeding the two
//! directed permission rows happen in one atomic unit.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{FriendPermission, Friendship, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by friendship repository adapters.
    pub enum FriendshipRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "friendship repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "friendship repository query failed: {message}",
        /// A row already exists for this unordered pair.
        DuplicatePair { message: String } =>
            "friendship already exists: {message}",
    }
}

/// Port for friendship rows and directed permission settings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FriendshipRepository: Send + Sync {
    /// Find the row for the unordered pair `{a, b}`, in either orientation.
    async fn find_between(
        &self,
        a: &UserId,
        b: &UserId,
    ) -> Result<Option<Friendship>, FriendshipRepositoryError>;

    /// Every row involving `user`, including blocked ones.
    async fn list_for(&self, user: &UserId) -> Result<Vec<Friendship>, FriendshipRepositoryError>;

    /// Insert a new pending request.
    ///
    /// Fails with [`FriendshipRepositoryError::DuplicatePair`] when any row
    /// already exists for the pair.
    async fn create_request(&self, request: &Friendship) -> Result<(), FriendshipRepositoryError>;

    /// Replace the message on a still-pending `requester → recipient` row.
    ///
    /// Returns the updated row, or `None` when no such pending row exists.
    async fn update_pending_message(
        &self,
        requester: &UserId,
        recipient: &UserId,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Friendship>, FriendshipRepositoryError>;

    /// Flip the pending `requester → recipient` row to accepted.
    ///
    /// In the same unit, clears any block marker and inserts default
    /// permission rows for both directions when absent. Returns `None` when
    /// no matching pending row exists.
    async fn accept_pending(
        &self,
        requester: &UserId,
        recipient: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Option<Friendship>, FriendshipRepositoryError>;

    /// Permission row owned by `owner` about `target`, if stored.
    async fn permission(
        &self,
        owner: &UserId,
        target: &UserId,
    ) -> Result<Option<FriendPermission>, FriendshipRepositoryError>;

    /// Upsert the permission row owned by `owner` about `target`.
    async fn save_permission(
        &self,
        owner: &UserId,
        target: &UserId,
        permission: FriendPermission,
        now: DateTime<Utc>,
    ) -> Result<(), FriendshipRepositoryError>;
}
