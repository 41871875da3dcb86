//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use campus_core::academics::AcademicError;
use campus_core::identity::IdentityError;
use thiserror::Error;
use tracing::{error, warn};

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Numeric codes carried in error envelopes.
pub mod codes {
    pub const VALIDATION: i32 = -502;
    pub const UPDATE_VALIDATION: i32 = -503;
    pub const NOT_FOUND: i32 = -504;
    pub const RECONCILIATION: i32 = -509;
    pub const INTERNAL: i32 = -510;
    pub const NO_TOKEN: i32 = -511;
    pub const INVALID_TOKEN: i32 = -512;
    pub const FORBIDDEN: i32 = -513;
}

/// Application-level errors with HTTP status mapping.
///
/// Variants carrying a `String` keep internal detail for logs; the outward
/// message is fixed where the detail could leak internals.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("No bearer token")]
    NoToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid update: {0}")]
    InvalidUpdate(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Reconciliation failed: {0}")]
    Reconciliation(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Classify a failure of the user reconciliation step.
    pub fn reconciliation(e: IdentityError) -> Self {
        match e {
            IdentityError::MissingToken => AppError::NoToken,
            IdentityError::Decode(msg) => AppError::InvalidToken(msg),
            other => AppError::Reconciliation(other.to_string()),
        }
    }

    /// Classify a failure of an update endpoint: rejected input reports the
    /// update validation code.
    pub fn update(e: AcademicError) -> Self {
        match e {
            AcademicError::Validation(msg) | AcademicError::Conflict(msg) => {
                AppError::InvalidUpdate(msg)
            }
            other => AppError::from(other),
        }
    }

    fn parts(&self) -> (StatusCode, i32, String) {
        match self {
            AppError::NoToken => (
                StatusCode::UNAUTHORIZED,
                codes::NO_TOKEN,
                "Authentication credentials were not provided.".into(),
            ),
            AppError::InvalidToken(_) => (
                StatusCode::UNAUTHORIZED,
                codes::INVALID_TOKEN,
                "Invalid or expired token.".into(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                codes::FORBIDDEN,
                "You do not have permission to perform this action.".into(),
            ),
            AppError::Validation(m) => (StatusCode::BAD_REQUEST, codes::VALIDATION, m.clone()),
            AppError::InvalidUpdate(m) => {
                (StatusCode::BAD_REQUEST, codes::UPDATE_VALIDATION, m.clone())
            }
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, codes::NOT_FOUND, m.clone()),
            AppError::Reconciliation(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::RECONCILIATION,
                "Could not retrieve the user.".into(),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                codes::INTERNAL,
                format!("Operation failed (error code #{}).", -codes::INTERNAL),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Internal(detail) | AppError::Reconciliation(detail) => {
                error!(error = %detail, "request failed");
            }
            AppError::InvalidToken(detail) => warn!(reason = %detail, "token rejected"),
            _ => {}
        }
        let (status, code, msg) = self.parts();
        let body = Json(ErrorResponse {
            status: "error".to_string(),
            code,
            msg,
        });
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("row not found".into()),
            _ => AppError::Internal(e.to_string()),
        }
    }
}

impl From<IdentityError> for AppError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::MissingToken => AppError::NoToken,
            IdentityError::Decode(msg) => AppError::InvalidToken(msg),
            IdentityError::MissingUsername => {
                AppError::Reconciliation("token has no preferred_username".into())
            }
            IdentityError::UserNotFound(msg) => AppError::NotFound(format!("user {msg}")),
            IdentityError::Rejected(msg) => AppError::Reconciliation(msg),
            IdentityError::Config(msg) => AppError::Internal(msg),
            IdentityError::DbError(e) => AppError::from(e),
        }
    }
}

impl From<AcademicError> for AppError {
    fn from(e: AcademicError) -> Self {
        match e {
            AcademicError::Validation(msg) => AppError::Validation(msg),
            AcademicError::Conflict(msg) => AppError::Validation(msg),
            AcademicError::NotFound(msg) => AppError::NotFound(msg),
            AcademicError::InvalidData(msg) => AppError::Internal(msg),
            AcademicError::DbError(e) => AppError::from(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak() {
        let (status, json) = body_json(AppError::Internal("password=hunter2".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], codes::INTERNAL);
        assert!(!json["msg"].as_str().unwrap().contains("hunter2"));
    }

    #[tokio::test]
    async fn no_token_and_invalid_token_are_distinct() {
        let (s1, j1) = body_json(AppError::NoToken).await;
        let (s2, j2) = body_json(AppError::InvalidToken("bad".into())).await;
        assert_eq!(s1, StatusCode::UNAUTHORIZED);
        assert_eq!(s2, StatusCode::UNAUTHORIZED);
        assert_ne!(j1["code"], j2["code"]);
    }

    #[test]
    fn reconciliation_classifies_decode_failures() {
        assert!(matches!(
            AppError::reconciliation(IdentityError::Decode("x".into())),
            AppError::InvalidToken(_)
        ));
        assert!(matches!(
            AppError::reconciliation(IdentityError::MissingUsername),
            AppError::Reconciliation(_)
        ));
    }

    #[test]
    fn rejected_updates_use_update_code() {
        assert!(matches!(
            AppError::update(AcademicError::Validation("annee".into())),
            AppError::InvalidUpdate(_)
        ));
        assert!(matches!(
            AppError::update(AcademicError::NotFound("class 9".into())),
            AppError::NotFound(_)
        ));
    }

    #[test]
    fn academic_conflicts_are_validation_errors() {
        assert!(matches!(
            AppError::from(AcademicError::Conflict("class already exists".into())),
            AppError::Validation(_)
        ));
    }
}
