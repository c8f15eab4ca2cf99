//! Port for read-only check-in lookups.
//!
//! Check-in records belong to another subsystem. The social engine asks only
//! whether a user checked in on a given local date, which dates fall inside a
//! window (for streaks), and how many of a set of users checked in on a date.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by check-in oracle adapters.
    pub enum CheckinOracleError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "checkin oracle connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "checkin oracle query failed: {message}",
    }
}

/// Port for check-in facts keyed by user and local date.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckinOracle: Send + Sync {
    /// Whether `user` has a check-in recorded for `date`.
    async fn has_checkin(&self, user: &UserId, date: NaiveDate)
    -> Result<bool, CheckinOracleError>;

    /// Check-in dates for `user` within `from..=to`.
    async fn checkin_dates(
        &self,
        user: &UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>, CheckinOracleError>;

    /// Number of distinct users in `users` with a check-in for `date`.
    async fn count_checked_in(
        &self,
        users: &[UserId],
        date: NaiveDate,
    ) -> Result<u32, CheckinOracleError>;
}

/// Fixture oracle in which nobody has ever checked in.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCheckinOracle;

#[async_trait]
impl CheckinOracle for FixtureCheckinOracle {
    async fn has_checkin(
        &self,
        _user: &UserId,
        _date: NaiveDate,
    ) -> Result<bool, CheckinOracleError> {
        Ok(false)
    }

    async fn checkin_dates(
        &self,
        _user: &UserId,
        _from: NaiveDate,
        _to: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>, CheckinOracleError> {
        Ok(BTreeSet::new())
    }

    async fn count_checked_in(
        &self,
        _users: &[UserId],
        _date: NaiveDate,
    ) -> Result<u32, CheckinOracleError> {
        Ok(0)
    }
}
