//! Port for read-only lookups of registered users.
//!
//! Identity is owned by the account service; the social engine only reads
//! profiles to render views and resolve each user's local date.

use async_trait::async_trait;

use crate::domain::{UserId, UserProfile};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user directory adapters.
    pub enum UserDirectoryError {
        /// Directory connection could not be established.
        Connection { message: String } =>
            "user directory connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "user directory query failed: {message}",
    }
}

/// Port for resolving user profiles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch a profile by id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserProfile>, UserDirectoryError>;

    /// Fetch a profile by exact phone number.
    async fn find_by_phone(&self, phone: &str) -> Result<Option<UserProfile>, UserDirectoryError>;

    /// Fetch every profile in `ids` that exists. Order is unspecified.
    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<UserProfile>, UserDirectoryError>;
}

/// Fixture directory that knows no users.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserDirectory;

#[async_trait]
impl UserDirectory for FixtureUserDirectory {
    async fn find_by_id(&self, _id: &UserId) -> Result<Option<UserProfile>, UserDirectoryError> {
        Ok(None)
    }

    async fn find_by_phone(&self, _phone: &str) -> Result<Option<UserProfile>, UserDirectoryError> {
        Ok(None)
    }

    async fn find_many(&self, _ids: &[UserId]) -> Result<Vec<UserProfile>, UserDirectoryError> {
        Ok(Vec::new())
    }
}
