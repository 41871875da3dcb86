//! Identity reconciliation.
//!
//! Turns a provider-issued bearer token into claims, a filtered domain role
//! set, and a local user record kept in step with the provider.

pub mod claims;
pub mod decoder;
pub mod reconcile;
pub mod roles;
pub mod store;

use thiserror::Error;

/// Identity errors.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("No token supplied")]
    MissingToken,

    #[error("Token decode failed: {0}")]
    Decode(String),

    #[error("Decoder misconfigured: {0}")]
    Config(String),

    #[error("Token carries no preferred_username claim")]
    MissingUsername,

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("Database error: {0}")]
    DbError(#[from] sqlx::Error),
}
