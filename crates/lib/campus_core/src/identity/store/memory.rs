//! In-memory identity store for tests and local development.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use super::{IdentityStore, MAX_ROLE_NAME_LEN, unusable_password};
use crate::identity::IdentityError;
use crate::models::identity::{ProfileUpdate, Role, SyncOutcome, User, UserProfile};

#[derive(Debug, Clone)]
struct StoredUser {
    user: User,
    password_hash: String,
    role_ids: BTreeSet<i64>,
}

#[derive(Debug, Clone, Default)]
struct State {
    next_user_id: i64,
    next_role_id: i64,
    users: BTreeMap<i64, StoredUser>,
    /// Role name → id.
    roles: BTreeMap<String, i64>,
}

impl State {
    fn role_names(&self, ids: &BTreeSet<i64>) -> Vec<String> {
        // `roles` iterates in name order, so the output is sorted.
        self.roles
            .iter()
            .filter(|(_, id)| ids.contains(id))
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn snapshot(&self, stored: &StoredUser) -> User {
        let mut user = stored.user.clone();
        user.roles = self.role_names(&stored.role_ids);
        user
    }

    fn user_id_by_username(&self, username: &str) -> Option<i64> {
        self.users
            .iter()
            .find(|(_, s)| s.user.username == username)
            .map(|(id, _)| *id)
    }

    fn ensure_role(&mut self, name: &str) -> Result<i64, IdentityError> {
        if let Some(id) = self.roles.get(name) {
            return Ok(*id);
        }
        if name.chars().count() > MAX_ROLE_NAME_LEN {
            return Err(IdentityError::Rejected(format!(
                "role name longer than {MAX_ROLE_NAME_LEN} characters"
            )));
        }
        self.next_role_id += 1;
        let id = self.next_role_id;
        self.roles.insert(name.to_string(), id);
        Ok(id)
    }
}

/// Identity store backed by process memory. A single mutex serializes every
/// operation; `sync_user` works on a draft copy that replaces the state only
/// on success. Role names follow the Postgres column width.
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    state: Mutex<State>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users.
    pub async fn user_count(&self) -> usize {
        self.state.lock().await.users.len()
    }

    /// Stored password hash for `username`.
    pub async fn password_hash(&self, username: &str) -> Option<String> {
        let state = self.state.lock().await;
        let id = state.user_id_by_username(username)?;
        state.users.get(&id).map(|s| s.password_hash.clone())
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn sync_user(
        &self,
        profile: &UserProfile,
        roles: &BTreeSet<String>,
        now: DateTime<Utc>,
    ) -> Result<SyncOutcome, IdentityError> {
        let mut guard = self.state.lock().await;
        let mut state = guard.clone();

        let (id, created) = match state.user_id_by_username(&profile.username) {
            Some(id) => {
                let stored = state
                    .users
                    .get_mut(&id)
                    .ok_or_else(|| IdentityError::UserNotFound(profile.username.clone()))?;
                stored.user.email = profile.email.clone();
                stored.user.first_name = profile.first_name.clone();
                stored.user.last_name = profile.last_name.clone();
                stored.user.email_verified = profile.email_verified;
                stored.user.last_login = Some(now);
                stored.password_hash = unusable_password();
                (id, false)
            }
            None => {
                state.next_user_id += 1;
                let id = state.next_user_id;
                let user = User {
                    id,
                    username: profile.username.clone(),
                    email: profile.email.clone(),
                    email_verified: profile.email_verified,
                    first_name: profile.first_name.clone(),
                    last_name: profile.last_name.clone(),
                    last_login: None,
                    date_joined: now,
                    sexe: None,
                    telephone: None,
                    date_naissance: None,
                    address_profil: None,
                    newsletter_abonne: false,
                    blog_posts: false,
                    roles: Vec::new(),
                };
                state.users.insert(
                    id,
                    StoredUser {
                        user,
                        password_hash: unusable_password(),
                        role_ids: BTreeSet::new(),
                    },
                );
                (id, true)
            }
        };

        let mut role_ids = BTreeSet::new();
        for role in roles {
            role_ids.insert(state.ensure_role(role)?);
        }
        if let Some(stored) = state.users.get_mut(&id) {
            stored.role_ids = role_ids;
        }

        let user = state
            .users
            .get(&id)
            .map(|stored| state.snapshot(stored))
            .ok_or_else(|| IdentityError::UserNotFound(profile.username.clone()))?;
        *guard = state;
        Ok(SyncOutcome { user, created })
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, IdentityError> {
        let state = self.state.lock().await;
        Ok(state.users.get(&id).map(|s| state.snapshot(s)))
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, IdentityError> {
        let state = self.state.lock().await;
        Ok(state
            .user_id_by_username(username)
            .and_then(|id| state.users.get(&id))
            .map(|s| state.snapshot(s)))
    }

    async fn list_users(&self) -> Result<Vec<User>, IdentityError> {
        let state = self.state.lock().await;
        let mut users: Vec<User> = state.users.values().map(|s| state.snapshot(s)).collect();
        users.sort_by(|a, b| {
            (a.last_name.as_str(), a.first_name.as_str())
                .cmp(&(b.last_name.as_str(), b.first_name.as_str()))
        });
        Ok(users)
    }

    async fn delete_user(&self, id: i64) -> Result<bool, IdentityError> {
        Ok(self.state.lock().await.users.remove(&id).is_some())
    }

    async fn list_roles(&self) -> Result<Vec<Role>, IdentityError> {
        let state = self.state.lock().await;
        Ok(state
            .roles
            .iter()
            .map(|(name, id)| Role {
                id: *id,
                name: name.clone(),
            })
            .collect())
    }

    async fn update_profile(
        &self,
        id: i64,
        update: &ProfileUpdate,
    ) -> Result<User, IdentityError> {
        let mut state = self.state.lock().await;
        let stored = state
            .users
            .get_mut(&id)
            .ok_or_else(|| IdentityError::UserNotFound(id.to_string()))?;
        update.apply(&mut stored.user);
        let stored = &state.users[&id];
        Ok(state.snapshot(stored))
    }
}
