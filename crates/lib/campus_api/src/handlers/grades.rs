//! Grade entry.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use campus_core::academics::queries;
use campus_core::models::academics::{Grade, GradeUpdate, NewGrade};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{DataResponse, WriteResponse};

/// `GET /note/{id}/`
pub async fn get_grade_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DataResponse<Grade>>> {
    let grade = queries::get_grade(&state.pool, id).await?;
    Ok(Json(DataResponse::success(grade)))
}

/// `POST /note/` — record a grade in [0, 20].
pub async fn create_grade_handler(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> AppResult<(StatusCode, Json<WriteResponse<Grade>>)> {
    let grade: NewGrade =
        serde_json::from_value(body).map_err(|e| AppError::Validation(e.to_string()))?;
    let created = queries::create_grade(&state.pool, &grade).await?;
    Ok((StatusCode::CREATED, Json(WriteResponse::added(created))))
}

/// `PUT /note/{id}/`
pub async fn update_grade_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> AppResult<Json<WriteResponse<Grade>>> {
    let update: GradeUpdate =
        serde_json::from_value(body).map_err(|e| AppError::InvalidUpdate(e.to_string()))?;
    let grade = queries::update_grade(&state.pool, id, &update)
        .await
        .map_err(AppError::update)?;
    Ok(Json(WriteResponse::updated(grade)))
}

/// `DELETE /note/{id}/`
pub async fn delete_grade_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<WriteResponse<()>>> {
    queries::delete_grade(&state.pool, id).await?;
    Ok(Json(WriteResponse::deleted()))
}
