//! HTTP inbound adapter exposing REST endpoints.

pub mod error;
pub mod friends;
pub mod groups;
pub mod health;
pub mod notifications;
pub mod schemas;
pub mod session;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;
