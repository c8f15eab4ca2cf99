//! Read-only user and check-in lookups.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::InMemorySocialStore;
use crate::domain::ports::{CheckinOracle, CheckinOracleError, UserDirectory, UserDirectoryError};
use crate::domain::{UserId, UserProfile};

#[async_trait]
impl UserDirectory for InMemorySocialStore {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserProfile>, UserDirectoryError> {
        let state = self.lock().map_err(UserDirectoryError::query)?;
        Ok(state.users.get(id).cloned())
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<UserProfile>, UserDirectoryError> {
        let state = self.lock().map_err(UserDirectoryError::query)?;
        Ok(state
            .users
            .values()
            .find(|profile| profile.phone == phone)
            .cloned())
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<UserProfile>, UserDirectoryError> {
        let state = self.lock().map_err(UserDirectoryError::query)?;
        Ok(ids
            .iter()
            .filter_map(|id| state.users.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl CheckinOracle for InMemorySocialStore {
    async fn has_checkin(&self, user: &UserId, date: NaiveDate) -> Result<bool, CheckinOracleError> {
        let state = self.lock().map_err(CheckinOracleError::query)?;
        Ok(state.checkins.contains(&(*user, date)))
    }

    async fn checkin_dates(
        &self,
        user: &UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>, CheckinOracleError> {
        let state = self.lock().map_err(CheckinOracleError::query)?;
        Ok(state
            .checkins
            .iter()
            .filter(|(owner, date)| owner == user && (from..=to).contains(date))
            .map(|(_, date)| *date)
            .collect())
    }

    async fn count_checked_in(
        &self,
        users: &[UserId],
        date: NaiveDate,
    ) -> Result<u32, CheckinOracleError> {
        let state = self.lock().map_err(CheckinOracleError::query)?;
        let distinct: BTreeSet<&UserId> = users
            .iter()
            .filter(|user| state.checkins.contains(&(**user, date)))
            .collect();
        Ok(u32::try_from(distinct.len()).unwrap_or(u32::MAX))
    }
}
