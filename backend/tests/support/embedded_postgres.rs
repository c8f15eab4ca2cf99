//! Embedded PostgreSQL helpers for the Diesel adapter suites.
//!
//! Each test gets its own database cloned from a template that already has
//! the embedded migrations applied. The template name carries a hash of the
//! migrations directory, so a schema change provisions a fresh template.
//!
//! Seeding uses `postgres` directly; users and check-ins are owned by other
//! services and have no write port in this crate.

use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

use checkin_social::domain::UserId;
use checkin_social::outbound::persistence::MIGRATIONS;
use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::MigrationHarness;
use pg_embedded_setup_unpriv::test_support::hash_directory;
use pg_embedded_setup_unpriv::{ClusterHandle, TemporaryDatabase};
use postgres::{Client, NoTls};
use uuid::Uuid;

static TEMPLATE_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const TEMPLATE_NAME_PREFIX: &str = "checkin_social_template";
const TEMPLATE_PROVISION_RETRIES: usize = 5;
const TEMPLATE_PROVISION_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Render a `postgres` error with its SQLSTATE and detail.
///
/// The plain `Display` output collapses database errors to `db error`.
pub fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };
    let mut summary = format!(
        "postgres error {:?}: {}",
        db_error.code(),
        db_error.message()
    );
    if let Some(detail) = db_error.detail() {
        summary.push_str("; detail: ");
        summary.push_str(detail);
    }
    summary
}

/// Whether `SKIP_TEST_CLUSTER` is set to a truthy value.
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Skip with a marker when `SKIP_TEST_CLUSTER` is set, otherwise fail loudly.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}

/// Process-wide embedded cluster.
pub fn shared_cluster() -> Result<&'static ClusterHandle, String> {
    pg_embedded_setup_unpriv::test_support::shared_cluster_handle()
        .map_err(|err| format!("start embedded cluster: {err:?}"))
}

fn migrations_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations")
}

fn template_database_name() -> Result<String, String> {
    let hash = hash_directory(migrations_dir()).map_err(|err| format!("hash migrations: {err}"))?;
    let short_hash = hash.get(..8).unwrap_or(&hash);
    Ok(format!("{TEMPLATE_NAME_PREFIX}_{short_hash}"))
}

fn migrate_schema(url: &str) -> Result<(), String> {
    let mut conn = PgConnection::establish(url).map_err(|err| format!("connect: {err}"))?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|err| format!("migration: {err}"))?;
    Ok(())
}

fn ensure_template_database(cluster: &ClusterHandle) -> Result<String, String> {
    let template_name = template_database_name()?;
    let _lock = TEMPLATE_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|err| err.into_inner());

    let exists = cluster
        .database_exists(template_name.as_str())
        .map_err(|err| format!("template check: {err:?}"))?;
    if !exists {
        cluster
            .create_database(template_name.as_str())
            .map_err(|err| format!("create template: {err:?}"))?;
        migrate_schema(&cluster.connection().database_url(&template_name))?;
    }
    Ok(template_name)
}

/// A fresh database cloned from the migrated template.
///
/// Retries a few times; concurrent clones of one template can briefly fail
/// while another session is still connected to it.
pub fn provision_template_database(cluster: &ClusterHandle) -> Result<TemporaryDatabase, String> {
    let mut last_error = String::from("no attempt made");
    for attempt in 1..=TEMPLATE_PROVISION_RETRIES {
        let cloned = ensure_template_database(cluster).and_then(|template| {
            cluster
                .temporary_database_from_template(
                    format!("test_{}", Uuid::new_v4().simple()).as_str(),
                    template.as_str(),
                )
                .map_err(|err| format!("clone template: {err:?}"))
        });
        match cloned {
            Ok(database) => return Ok(database),
            Err(error) => {
                last_error = format!("attempt {attempt}/{TEMPLATE_PROVISION_RETRIES}: {error}");
            }
        }
        if attempt < TEMPLATE_PROVISION_RETRIES {
            std::thread::sleep(TEMPLATE_PROVISION_RETRY_DELAY);
        }
    }
    Err(last_error)
}

/// Insert a user row in UTC and return its id.
pub fn seed_user(url: &str, phone: &str, nickname: &str) -> Result<UserId, String> {
    let mut client = Client::connect(url, NoTls).map_err(|err| format_postgres_error(&err))?;
    let id = UserId::random();
    client
        .execute(
            "INSERT INTO users (id, phone, nickname, timezone) VALUES ($1, $2, $3, 'UTC')",
            &[id.as_uuid(), &phone, &nickname],
        )
        .map_err(|err| format_postgres_error(&err))?;
    Ok(id)
}
