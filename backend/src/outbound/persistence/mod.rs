//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Each adapter implements one or two driven ports on top of a shared
//! [`DbPool`]. Every port write that spans several rows runs in a single
//! transaction. Row structs (`models.rs`) and table definitions
//! (`schema.rs`) stay private to this module.
//!
//! # Example
//!
//! ```no_run
//! use checkin_social::outbound::persistence::{DbPool, DieselGroupRepository, PoolConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/social")).await?;
//! let groups = DieselGroupRepository::new(pool);
//! # let _ = groups;
//! # Ok(())
//! # }
//! ```

mod diesel_friendship_repository;
mod diesel_group_repository;
mod diesel_notification_repository;
mod diesel_user_directory;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_friendship_repository::{DieselFriendshipRepository, DieselInteractionRepository};
pub use diesel_group_repository::DieselGroupRepository;
pub use diesel_notification_repository::DieselNotificationRepository;
pub use diesel_user_directory::{DieselCheckinOracle, DieselUserDirectory};
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
