//! Enrollments and exam sessions.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use campus_core::academics::queries;
use campus_core::models::academics::{Enrollment, ExamSession, NewEnrollment, NewExamSession};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{DataResponse, WriteResponse};

/// `POST /inscription/` — enroll a student in a class for a year.
pub async fn create_enrollment_handler(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> AppResult<(StatusCode, Json<WriteResponse<Enrollment>>)> {
    let enrollment: NewEnrollment =
        serde_json::from_value(body).map_err(|e| AppError::Validation(e.to_string()))?;
    let created = queries::create_enrollment(&state.pool, &enrollment).await?;
    Ok((StatusCode::CREATED, Json(WriteResponse::added(created))))
}

/// `DELETE /inscription/{id}/`
pub async fn delete_enrollment_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<WriteResponse<()>>> {
    queries::delete_enrollment(&state.pool, id).await?;
    Ok(Json(WriteResponse::deleted()))
}

/// `GET /session/`
pub async fn list_sessions_handler(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ExamSession>>>> {
    let sessions = queries::list_sessions(&state.pool).await?;
    Ok(Json(DataResponse::success(sessions)))
}

/// `POST /session/` — create an exam session. The code is derived.
pub async fn create_session_handler(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> AppResult<(StatusCode, Json<WriteResponse<ExamSession>>)> {
    let session: NewExamSession =
        serde_json::from_value(body).map_err(|e| AppError::Validation(e.to_string()))?;
    let created = queries::create_session(&state.pool, &session).await?;
    Ok((StatusCode::CREATED, Json(WriteResponse::added(created))))
}
