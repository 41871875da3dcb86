//! Class administration.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use campus_core::academics::queries;
use campus_core::models::academics::{ClassGroup, ClassUpdate, NewClassGroup};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{DataResponse, WriteResponse};

/// `GET /classe/` — list classes.
pub async fn list_classes_handler(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<ClassGroup>>>> {
    let classes = queries::list_classes(&state.pool).await?;
    Ok(Json(DataResponse::success(classes)))
}

/// `GET /classe/{id}/` — fetch one class.
pub async fn get_class_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DataResponse<ClassGroup>>> {
    let class = queries::get_class(&state.pool, id).await?;
    Ok(Json(DataResponse::success(class)))
}

/// `POST /classe/` — create a class. A blank `code_classe` is derived from
/// level, year and track.
pub async fn create_class_handler(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> AppResult<(StatusCode, Json<WriteResponse<ClassGroup>>)> {
    let new_class: NewClassGroup =
        serde_json::from_value(body).map_err(|e| AppError::Validation(e.to_string()))?;
    let class = queries::create_class(&state.pool, &new_class).await?;
    Ok((StatusCode::CREATED, Json(WriteResponse::added(class))))
}

/// `PUT /classe/{id}/` — partial update of a class.
pub async fn update_class_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> AppResult<Json<WriteResponse<ClassGroup>>> {
    let update: ClassUpdate =
        serde_json::from_value(body).map_err(|e| AppError::InvalidUpdate(e.to_string()))?;
    let class = queries::update_class(&state.pool, id, &update)
        .await
        .map_err(AppError::update)?;
    Ok(Json(WriteResponse::updated(class)))
}

/// `DELETE /classe/{id}/` — delete a class.
pub async fn delete_class_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<WriteResponse<()>>> {
    queries::delete_class(&state.pool, id).await?;
    Ok(Json(WriteResponse::deleted()))
}
