//! PostgreSQL-backed `UserDirectory` and `CheckinOracle` implementations.
//!
//! Both ports are read-only views of tables owned by other services.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{CheckinOracle, CheckinOracleError, UserDirectory, UserDirectoryError};
use crate::domain::{UserId, UserProfile};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::UserRow;
use super::pool::DbPool;
use super::schema::{checkins, users};

/// Diesel-backed user directory.
#[derive(Clone)]
pub struct DieselUserDirectory {
    pool: DbPool,
}

impl DieselUserDirectory {
    /// Create a directory reading through `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn directory_error(error: diesel::result::Error) -> UserDirectoryError {
    map_diesel_error(
        error,
        UserDirectoryError::query,
        UserDirectoryError::connection,
    )
}

fn uuids(ids: &[UserId]) -> Vec<Uuid> {
    ids.iter().map(|id| *id.as_uuid()).collect()
}

#[async_trait]
impl UserDirectory for DieselUserDirectory {
    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserProfile>, UserDirectoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserDirectoryError::connection))?;
        let row = users::table
            .find(id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(directory_error)?;
        Ok(row.map(UserProfile::from))
    }

    async fn find_by_phone(&self, phone: &str) -> Result<Option<UserProfile>, UserDirectoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserDirectoryError::connection))?;
        let row = users::table
            .filter(users::phone.eq(phone))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(directory_error)?;
        Ok(row.map(UserProfile::from))
    }

    async fn find_many(&self, ids: &[UserId]) -> Result<Vec<UserProfile>, UserDirectoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserDirectoryError::connection))?;
        let rows: Vec<UserRow> = users::table
            .filter(users::id.eq_any(uuids(ids)))
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(directory_error)?;
        Ok(rows.into_iter().map(UserProfile::from).collect())
    }
}

/// Diesel-backed check-in lookups.
#[derive(Clone)]
pub struct DieselCheckinOracle {
    pool: DbPool,
}

impl DieselCheckinOracle {
    /// Create an oracle reading through `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn oracle_error(error: diesel::result::Error) -> CheckinOracleError {
    map_diesel_error(
        error,
        CheckinOracleError::query,
        CheckinOracleError::connection,
    )
}

#[async_trait]
impl CheckinOracle for DieselCheckinOracle {
    async fn has_checkin(
        &self,
        user: &UserId,
        date: NaiveDate,
    ) -> Result<bool, CheckinOracleError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, CheckinOracleError::connection))?;
        diesel::select(diesel::dsl::exists(
            checkins::table.find((user.as_uuid(), date)),
        ))
        .get_result(&mut conn)
        .await
        .map_err(oracle_error)
    }

    async fn checkin_dates(
        &self,
        user: &UserId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<BTreeSet<NaiveDate>, CheckinOracleError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, CheckinOracleError::connection))?;
        let dates: Vec<NaiveDate> = checkins::table
            .filter(checkins::user_id.eq(user.as_uuid()))
            .filter(checkins::local_date.between(from, to))
            .select(checkins::local_date)
            .load(&mut conn)
            .await
            .map_err(oracle_error)?;
        Ok(dates.into_iter().collect())
    }

    async fn count_checked_in(
        &self,
        users: &[UserId],
        date: NaiveDate,
    ) -> Result<u32, CheckinOracleError> {
        if users.is_empty() {
            return Ok(0);
        }
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, CheckinOracleError::connection))?;
        let count: i64 = checkins::table
            .filter(checkins::user_id.eq_any(uuids(users)))
            .filter(checkins::local_date.eq(date))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(oracle_error)?;
        u32::try_from(count).map_err(|_| CheckinOracleError::query("check-in count out of range"))
    }
}
