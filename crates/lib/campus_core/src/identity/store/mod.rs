//! Persistence seam for local users and roles.
//!
//! The provider is the source of truth for identity attributes and roles;
//! the store keeps a local mirror so academic records can reference users.

pub mod memory;
pub mod postgres;

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};

pub use memory::MemoryIdentityStore;
pub use postgres::PgIdentityStore;

use super::IdentityError;
use crate::models::identity::{ProfileUpdate, Role, SyncOutcome, User, UserProfile};

/// Column width of `roles.name`.
pub const MAX_ROLE_NAME_LEN: usize = 100;

/// Prefix marking a password hash that can never match.
pub const UNUSABLE_PASSWORD_PREFIX: char = '!';

/// Generate an unusable password marker (`!` + 40 random alphanumerics).
///
/// Authentication is delegated to the provider; local passwords must never
/// authenticate.
pub fn unusable_password() -> String {
    let suffix: String = rng()
        .sample_iter(&Alphanumeric)
        .take(40)
        .map(char::from)
        .collect();
    format!("{UNUSABLE_PASSWORD_PREFIX}{suffix}")
}

/// Local user/role persistence.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Find-or-create the user keyed by `profile.username`, overwrite its
    /// provider-owned fields, and replace its role associations with `roles`.
    ///
    /// Runs as one atomic unit: on error nothing is visible.
    async fn sync_user(
        &self,
        profile: &UserProfile,
        roles: &BTreeSet<String>,
        now: DateTime<Utc>,
    ) -> Result<SyncOutcome, IdentityError>;

    async fn find_user(&self, id: i64) -> Result<Option<User>, IdentityError>;

    async fn find_user_by_username(&self, username: &str)
    -> Result<Option<User>, IdentityError>;

    /// All users ordered by last name, first name.
    async fn list_users(&self) -> Result<Vec<User>, IdentityError>;

    /// Returns `false` when no such user existed.
    async fn delete_user(&self, id: i64) -> Result<bool, IdentityError>;

    /// All roles ordered by name.
    async fn list_roles(&self) -> Result<Vec<Role>, IdentityError>;

    /// Apply a partial update to the locally-owned profile fields.
    async fn update_profile(&self, id: i64, update: &ProfileUpdate)
    -> Result<User, IdentityError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unusable_password_has_marker() {
        let p = unusable_password();
        assert!(p.starts_with(UNUSABLE_PASSWORD_PREFIX));
        assert_eq!(p.len(), 41);
    }

    #[test]
    fn unusable_passwords_differ() {
        assert_ne!(unusable_password(), unusable_password());
    }
}
