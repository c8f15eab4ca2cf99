//! Port for one-to-one reminder and encouragement persistence.
//!
//! The daily reminder limit is the uniqueness of `(from, to, local_date)`.
//! Adapters insert the reminder and its notification together, and insert the
//! notification only when the reminder row was new.

use async_trait::async_trait;

use crate::domain::{Encouragement, NewNotification, Reminder};

use super::define_port_error;

define_port_error! {
    /// Errors raised by interaction repository adapters.
    pub enum InteractionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "interaction repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "interaction repository query failed: {message}",
    }
}

/// Result of attempting to record a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReminderWrite {
    /// The reminder and its notification were stored.
    Recorded,
    /// A reminder for the same pair and date already existed; nothing changed.
    AlreadySent,
}

/// Port for reminder and encouragement facts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InteractionRepository: Send + Sync {
    /// Atomically insert `reminder` and `notification` unless today's
    /// reminder for the pair already exists.
    async fn record_reminder(
        &self,
        reminder: &Reminder,
        notification: &NewNotification,
    ) -> Result<ReminderWrite, InteractionRepositoryError>;

    /// Atomically insert `encouragement` and `notification`.
    async fn record_encouragement(
        &self,
        encouragement: &Encouragement,
        notification: &NewNotification,
    ) -> Result<(), InteractionRepositoryError>;
}
