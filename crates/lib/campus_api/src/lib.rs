//! # campus_api
//!
//! HTTP API library for Campus.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::extract::Request;
use axum::middleware::{Next, from_fn, from_fn_with_state};
use axum::routing::{delete, get, post, put};
use campus_core::identity::decoder::ClaimsDecoder;
use campus_core::identity::roles::{ROLE_ADMIN, ROLE_STUDENT, ROLE_USER};
use campus_core::identity::store::{IdentityStore, PgIdentityStore};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::error::{AppError, AppResult};
use crate::handlers::{classes, enrollments, grades, health, students, user_info, users};
use crate::middleware::roles::require_any_role;
use crate::services::keycloak::{KeycloakTokenValidator, TokenValidator};

const USER_ONLY: &[&str] = &[ROLE_USER];
const ADMIN_ONLY: &[&str] = &[ROLE_ADMIN];
const ADMIN_OR_STUDENT: &[&str] = &[ROLE_ADMIN, ROLE_STUDENT];

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool.
    pub pool: PgPool,
    /// API configuration.
    pub config: ApiConfig,
    /// Local user/role persistence.
    pub identity: Arc<dyn IdentityStore>,
    /// Bearer token claims decoder.
    pub decoder: Arc<ClaimsDecoder>,
    /// Provider-side token liveness check.
    pub token_validator: Arc<dyn TokenValidator>,
}

impl AppState {
    /// Production wiring: Postgres identity store, Keycloak liveness check.
    pub fn new(pool: PgPool, config: ApiConfig) -> AppResult<Self> {
        let decoder = ClaimsDecoder::new(&config.identity.decoder_settings())?;
        let validator = KeycloakTokenValidator::new(&config.identity)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        Ok(Self {
            identity: Arc::new(PgIdentityStore::new(pool.clone())),
            decoder: Arc::new(decoder),
            token_validator: Arc::new(validator),
            pool,
            config,
        })
    }
}

/// Run embedded database migrations.
///
/// Delegates to `campus_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    campus_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new().route(routes::HEALTH, get(health::health));

    // Any authenticated caller
    let authenticated =
        Router::new().route(routes::USER_INFO_ROLES, get(user_info::list_roles_handler));

    let user = Router::new()
        .route(routes::USER_INFO, get(user_info::get_user_info_handler))
        .route(
            routes::USER_INFO_UPDATE,
            put(user_info::update_user_info_handler),
        )
        .route_layer(from_fn(|req: Request, next: Next| {
            require_any_role(USER_ONLY, req, next)
        }));

    let admin = Router::new()
        .route(routes::USERS, get(users::list_users_handler))
        .route(
            routes::USERS_ID,
            get(users::get_user_handler)
                .put(users::update_user_handler)
                .delete(users::delete_user_handler),
        )
        .route(
            routes::CLASSES,
            get(classes::list_classes_handler).post(classes::create_class_handler),
        )
        .route(
            routes::CLASSES_ID,
            get(classes::get_class_handler)
                .put(classes::update_class_handler)
                .delete(classes::delete_class_handler),
        )
        .route(
            routes::STUDENTS,
            get(students::list_students_handler).post(students::create_student_handler),
        )
        .route(
            routes::STUDENTS_ID,
            get(students::get_student_handler)
                .put(students::update_student_handler)
                .delete(students::delete_student_handler),
        )
        .route(
            routes::ENROLLMENTS,
            post(enrollments::create_enrollment_handler),
        )
        .route(
            routes::ENROLLMENTS_ID,
            delete(enrollments::delete_enrollment_handler),
        )
        .route(
            routes::SESSIONS,
            get(enrollments::list_sessions_handler).post(enrollments::create_session_handler),
        )
        .route(routes::GRADES, post(grades::create_grade_handler))
        .route(
            routes::GRADES_ID,
            get(grades::get_grade_handler)
                .put(grades::update_grade_handler)
                .delete(grades::delete_grade_handler),
        )
        .route(
            routes::STUDENTS_BY_CLASS_YEAR,
            get(students::students_by_class_year_handler),
        )
        .route_layer(from_fn(|req: Request, next: Next| {
            require_any_role(ADMIN_ONLY, req, next)
        }));

    let grades = Router::new()
        .route(routes::STUDENT_GRADES, get(students::student_grades_handler))
        .route_layer(from_fn(|req: Request, next: Next| {
            require_any_role(ADMIN_OR_STUDENT, req, next)
        }));

    // Protected routes (require a live, decodable token)
    let protected = Router::new()
        .merge(authenticated)
        .merge(user)
        .merge(admin)
        .merge(grades)
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::auth::require_identity,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
