//! Role gate middleware.

use axum::{extract::Request, middleware::Next, response::Response};
use campus_core::identity::roles::has_any_role;

use super::auth::RequestIdentity;
use crate::error::AppError;

/// Admit the request iff its derived roles intersect `required`.
///
/// Must sit inside [`super::auth::require_identity`]; a request without an
/// identity is denied the same way as one with the wrong roles.
pub async fn require_any_role(
    required: &'static [&'static str],
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let allowed = request
        .extensions()
        .get::<RequestIdentity>()
        .is_some_and(|identity| has_any_role(&identity.roles, required));

    if !allowed {
        return Err(AppError::Forbidden);
    }
    Ok(next.run(request).await)
}
