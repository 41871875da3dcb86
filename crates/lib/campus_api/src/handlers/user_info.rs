//! Profile endpoints for the authenticated caller.
//!
//! Every call reconciles the local user from the request's claims first, so
//! the response always reflects the provider's current view.

use axum::Json;
use axum::extract::{Extension, Path, State};
use campus_core::identity::reconcile::reconcile;
use campus_core::models::identity::{ProfileUpdate, Role, User};
use chrono::Utc;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::RequestIdentity;

async fn current_user(state: &AppState, identity: &RequestIdentity) -> AppResult<User> {
    let outcome = reconcile(state.identity.as_ref(), &identity.claims, Utc::now())
        .await
        .map_err(AppError::reconciliation)?;
    Ok(outcome.user)
}

/// `GET /user-info/` — the caller's local record, synced from the token.
pub async fn get_user_info_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
) -> AppResult<Json<User>> {
    Ok(Json(current_user(&state, &identity).await?))
}

/// `PUT /user-info/update/{id}` — update the caller's local-only profile
/// fields. Provider-owned fields are not writable here.
pub async fn update_user_info_handler(
    State(state): State<AppState>,
    Extension(identity): Extension<RequestIdentity>,
    Path(id): Path<i64>,
    Json(body): Json<serde_json::Value>,
) -> AppResult<Json<User>> {
    let user = current_user(&state, &identity).await?;
    if user.id != id {
        return Err(AppError::Forbidden);
    }

    let update: ProfileUpdate =
        serde_json::from_value(body).map_err(|e| AppError::InvalidUpdate(e.to_string()))?;
    update
        .validate()
        .map_err(|errors| AppError::InvalidUpdate(errors.join("; ")))?;

    let updated = state.identity.update_profile(id, &update).await?;
    Ok(Json(updated))
}

/// `GET /user-info/roles/` — all known roles.
pub async fn list_roles_handler(State(state): State<AppState>) -> AppResult<Json<Vec<Role>>> {
    Ok(Json(state.identity.list_roles().await?))
}
