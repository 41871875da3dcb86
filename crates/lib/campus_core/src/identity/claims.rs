//! Identity claims carried by provider access tokens.
//!
//! Expected claims:
//! - `sub`: provider subject id
//! - `preferred_username`: local join key
//! - `email`, `email_verified`, `given_name`, `family_name`
//! - `realm_access.roles`: realm roles
//! - `resource_access.<client>.roles`: per-client roles

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::identity::UserProfile;

/// Claims decoded from a bearer token. Recomputed for every request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentityClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub preferred_username: Option<String>,
    #[serde(default)]
    pub realm_access: Option<RealmAccess>,
    #[serde(default)]
    pub resource_access: HashMap<String, ResourceAccess>,
    /// Expiry (unix timestamp), checked by the decoder when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Realm-level roles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RealmAccess {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Roles scoped to one client application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceAccess {
    #[serde(default)]
    pub roles: Vec<String>,
}

/// Identity attributes exposed to downstream handlers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: Option<String>,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub username: Option<String>,
}

impl IdentityClaims {
    /// Project the identity attributes.
    pub fn user_info(&self) -> UserInfo {
        UserInfo {
            id: self.sub.clone(),
            email: self.email.clone(),
            email_verified: self.email_verified,
            given_name: self.given_name.clone(),
            family_name: self.family_name.clone(),
            username: self.preferred_username.clone(),
        }
    }

    /// Non-empty preferred username, if any.
    pub fn username(&self) -> Option<&str> {
        self.preferred_username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    /// Provider-owned profile attributes, or `None` without a username.
    pub fn profile(&self) -> Option<UserProfile> {
        let username = self.username()?;
        Some(UserProfile {
            username: username.to_string(),
            email: self.email.clone(),
            email_verified: self.email_verified.unwrap_or(false),
            first_name: self.given_name.clone().unwrap_or_default(),
            last_name: self.family_name.clone().unwrap_or_default(),
        })
    }
}
