//! PostgreSQL identity store.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::debug;

use super::{IdentityStore, unusable_password};
use crate::identity::IdentityError;
use crate::models::identity::{ProfileUpdate, Role, Sexe, SyncOutcome, User, UserProfile};

/// User row joined with its role names.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: Option<String>,
    email_verified: bool,
    first_name: String,
    last_name: String,
    last_login: Option<DateTime<Utc>>,
    date_joined: DateTime<Utc>,
    sexe: Option<String>,
    telephone: Option<String>,
    date_naissance: Option<NaiveDate>,
    address_profil: Option<String>,
    newsletter_abonne: bool,
    blog_posts: bool,
    roles: Vec<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            username: row.username,
            email: row.email,
            email_verified: row.email_verified,
            first_name: row.first_name,
            last_name: row.last_name,
            last_login: row.last_login,
            date_joined: row.date_joined,
            sexe: row.sexe.as_deref().and_then(Sexe::from_db),
            telephone: row.telephone,
            date_naissance: row.date_naissance,
            address_profil: row.address_profil,
            newsletter_abonne: row.newsletter_abonne,
            blog_posts: row.blog_posts,
            roles: row.roles,
        }
    }
}

/// Users with their roles aggregated into a sorted `text[]`.
const SELECT_USERS: &str = r#"
    SELECT u.id, u.username, u.email, u.email_verified, u.first_name, u.last_name,
           u.last_login, u.date_joined, u.sexe, u.telephone, u.date_naissance,
           u.address_profil, u.newsletter_abonne, u.blog_posts,
           COALESCE(
               array_agg(r.name::text ORDER BY r.name) FILTER (WHERE r.name IS NOT NULL),
               '{}'::text[]
           ) AS roles
    FROM users u
    LEFT JOIN user_roles ur ON ur.user_id = u.id
    LEFT JOIN roles r ON r.id = ur.role_id
"#;

/// Identity store on the `users`, `roles` and `user_roles` tables.
#[derive(Debug, Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn load_user(conn: &mut PgConnection, id: i64) -> Result<Option<User>, sqlx::Error> {
    let sql = format!("{SELECT_USERS} WHERE u.id = $1 GROUP BY u.id");
    let row = sqlx::query_as::<_, UserRow>(&sql)
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(row.map(User::from))
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn sync_user(
        &self,
        profile: &UserProfile,
        roles: &BTreeSet<String>,
        now: DateTime<Utc>,
    ) -> Result<SyncOutcome, IdentityError> {
        let mut tx = self.pool.begin().await?;

        // Lock the row so concurrent logins for one username serialize.
        let existing =
            sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE username = $1 FOR UPDATE")
                .bind(&profile.username)
                .fetch_optional(&mut *tx)
                .await?;

        let (user_id, created) = match existing {
            Some(id) => {
                sqlx::query(
                    r#"
                    UPDATE users
                    SET email = $2, first_name = $3, last_name = $4,
                        email_verified = $5, last_login = $6, password_hash = $7
                    WHERE id = $1
                    "#,
                )
                .bind(id)
                .bind(&profile.email)
                .bind(&profile.first_name)
                .bind(&profile.last_name)
                .bind(profile.email_verified)
                .bind(now)
                .bind(unusable_password())
                .execute(&mut *tx)
                .await?;
                (id, false)
            }
            None => {
                let id = sqlx::query_scalar::<_, i64>(
                    r#"
                    INSERT INTO users
                        (username, email, first_name, last_name, email_verified,
                         password_hash, date_joined)
                    VALUES ($1, $2, $3, $4, $5, $6, $7)
                    RETURNING id
                    "#,
                )
                .bind(&profile.username)
                .bind(&profile.email)
                .bind(&profile.first_name)
                .bind(&profile.last_name)
                .bind(profile.email_verified)
                .bind(unusable_password())
                .bind(now)
                .fetch_one(&mut *tx)
                .await?;
                (id, true)
            }
        };

        // Authoritative snapshot: drop every association, then re-attach.
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for role in roles {
            let role_id = sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO roles (name) VALUES ($1)
                ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
                RETURNING id
                "#,
            )
            .bind(role)
            .fetch_one(&mut *tx)
            .await?;

            sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(role_id)
                .execute(&mut *tx)
                .await?;
        }

        let user = load_user(&mut tx, user_id)
            .await?
            .ok_or_else(|| IdentityError::UserNotFound(profile.username.clone()))?;

        tx.commit().await?;
        debug!(user_id, created, roles = roles.len(), "user synchronized");
        Ok(SyncOutcome { user, created })
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, IdentityError> {
        let mut conn = self.pool.acquire().await?;
        Ok(load_user(&mut conn, id).await?)
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, IdentityError> {
        let sql = format!("{SELECT_USERS} WHERE u.username = $1 GROUP BY u.id");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn list_users(&self) -> Result<Vec<User>, IdentityError> {
        let sql = format!("{SELECT_USERS} GROUP BY u.id ORDER BY u.last_name, u.first_name");
        let rows = sqlx::query_as::<_, UserRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn delete_user(&self, id: i64) -> Result<bool, IdentityError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_roles(&self) -> Result<Vec<Role>, IdentityError> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name FROM roles ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(roles)
    }

    async fn update_profile(
        &self,
        id: i64,
        update: &ProfileUpdate,
    ) -> Result<User, IdentityError> {
        let mut conn = self.pool.acquire().await?;
        let result = sqlx::query(
            r#"
            UPDATE users
            SET sexe = COALESCE($2, sexe),
                telephone = COALESCE($3, telephone),
                date_naissance = COALESCE($4, date_naissance),
                address_profil = COALESCE($5, address_profil),
                newsletter_abonne = COALESCE($6, newsletter_abonne),
                blog_posts = COALESCE($7, blog_posts)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(update.sexe.map(|s| s.as_str()))
        .bind(&update.telephone)
        .bind(update.date_naissance)
        .bind(&update.address_profil)
        .bind(update.newsletter_abonne)
        .bind(update.blog_posts)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(IdentityError::UserNotFound(id.to_string()));
        }

        load_user(&mut conn, id)
            .await?
            .ok_or_else(|| IdentityError::UserNotFound(id.to_string()))
    }
}
