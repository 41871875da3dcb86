//! User administration.

use axum::Json;
use axum::extract::{Path, State};
use campus_core::models::identity::{ProfileUpdate, User};

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::models::{DataResponse, WriteResponse};

/// `GET /utilisateur/` — list all users.
pub async fn list_users_handler(
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<User>>>> {
    let users = state.identity.list_users().await?;
    Ok(Json(DataResponse::success(users)))
}

/// `GET /utilisateur/{id}/` — fetch one user.
pub async fn get_user_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<DataResponse<User>>> {
    let user = state
        .identity
        .find_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))?;
    Ok(Json(DataResponse::success(user)))
}

/// `PUT /utilisateur/{id}/` — admin edit of a user's local profile fields.
pub async fn update_user_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> AppResult<Json<WriteResponse<User>>> {
    let update: ProfileUpdate =
        serde_json::from_value(body).map_err(|e| AppError::InvalidUpdate(e.to_string()))?;
    update
        .validate()
        .map_err(|errors| AppError::InvalidUpdate(errors.join("; ")))?;

    let user = state.identity.update_profile(id, &update).await?;
    Ok(Json(WriteResponse::updated(user)))
}

/// `DELETE /utilisateur/{id}/` — delete a user and its role links.
pub async fn delete_user_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<WriteResponse<()>>> {
    if !state.identity.delete_user(id).await? {
        return Err(AppError::NotFound(format!("user {id}")));
    }
    Ok(Json(WriteResponse::deleted()))
}
