//! Driving port for friendship state transitions.
//!
//! Inbound adapters call [`FriendshipCommand`] with an already-authenticated
//! actor. Implementations enforce the one-row-per-pair invariant and the
//! `pending → accepted` state machine.

use async_trait::async_trait;

use crate::domain::{Error, FriendPermission, FriendPermissionPatch, FriendView, UserId};

/// Request to befriend the user registered under `target_phone`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendRequest {
    pub actor: UserId,
    pub target_phone: String,
    /// Optional note shown to the recipient.
    pub message: Option<String>,
}

/// Driving port for friendship mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FriendshipCommand: Send + Sync {
    /// Send a friend request, or accept one travelling the other way.
    ///
    /// # Errors
    ///
    /// - `not_found` when no user has the phone number.
    /// - `invalid_request` when the actor targets themselves.
    /// - `conflict` when the pair are already friends.
    /// - `forbidden` when the relationship is blocked.
    async fn request_friend(&self, request: FriendRequest) -> Result<FriendView, Error>;

    /// Accept the pending request `requester → actor`.
    ///
    /// # Errors
    ///
    /// Returns `not_found` when no such pending request exists.
    async fn accept_friend(&self, actor: &UserId, requester: &UserId)
    -> Result<FriendView, Error>;

    /// Update the actor's permission settings towards `friend`.
    ///
    /// # Errors
    ///
    /// Returns `not_found` when no visible relationship exists.
    async fn update_permission(
        &self,
        actor: &UserId,
        friend: &UserId,
        patch: FriendPermissionPatch,
    ) -> Result<FriendPermission, Error>;
}
