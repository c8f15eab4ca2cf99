//! Outbound adapters implementing the driven ports.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM.
//! - **memory**: a single-process store for tests and local development.
//!
//! Adapters translate between domain types and storage representations and
//! hold no business rules.

pub mod memory;
pub mod persistence;
