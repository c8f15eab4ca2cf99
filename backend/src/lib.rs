//! Social relationship and membership engine for the daily check-in service.
//!
//! The crate is split along hexagonal lines:
//! - [`domain`] holds the rules and the ports they depend on.
//! - [`outbound`] provides PostgreSQL and in-memory adapters for those ports.
//! - [`inbound`] exposes the driving ports over HTTP.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
/// Request tracing middleware.
pub use middleware::Trace;
