//! Authentication middleware: Bearer token extraction, provider liveness
//! check, and claims decoding.

use std::collections::BTreeSet;

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use campus_core::identity::claims::{IdentityClaims, UserInfo};
use campus_core::identity::roles::derive_roles;
use tracing::debug;

use crate::AppState;
use crate::error::AppError;

/// Per-request identity context, stored in request extensions.
///
/// Computed once per request from the bearer token; never cached across
/// requests.
#[derive(Debug, Clone)]
pub struct RequestIdentity {
    pub claims: IdentityClaims,
    pub user_info: UserInfo,
    pub roles: BTreeSet<String>,
}

impl RequestIdentity {
    pub fn new(claims: IdentityClaims) -> Self {
        Self {
            user_info: claims.user_info(),
            roles: derive_roles(&claims),
            claims,
        }
    }
}

/// Pull the token out of an `Authorization` value.
///
/// Accepts `Bearer <token>` (scheme case-insensitive) or a bare token.
pub fn extract_token(header: &str) -> Option<&str> {
    let header = header.trim();
    if header.eq_ignore_ascii_case("bearer") {
        return None;
    }
    match header.split_once(char::is_whitespace) {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("bearer") => {
            let token = rest.trim();
            (!token.is_empty() && !token.contains(char::is_whitespace)).then_some(token)
        }
        Some(_) => None,
        None => (!header.is_empty()).then_some(header),
    }
}

/// Axum middleware: authenticates the request and injects [`RequestIdentity`]
/// into request extensions.
///
/// Runs before any handler or persistence call.
pub async fn require_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or(AppError::NoToken)?
        .to_str()
        .map_err(|_| AppError::InvalidToken("non-ASCII authorization header".into()))?;

    if header.trim().is_empty() {
        return Err(AppError::NoToken);
    }

    let token = extract_token(header)
        .ok_or_else(|| AppError::InvalidToken("malformed authorization header".into()))?
        .to_string();

    match state.token_validator.is_live(&token).await {
        Ok(true) => {}
        Ok(false) => {
            return Err(AppError::InvalidToken(
                "rejected by identity provider".into(),
            ));
        }
        Err(e) => {
            return Err(AppError::InvalidToken(format!("liveness check failed: {e}")));
        }
    }

    let claims = state.decoder.decode(&token)?;
    let identity = RequestIdentity::new(claims);

    debug!(
        username = identity.user_info.username.as_deref().unwrap_or("-"),
        roles = ?identity.roles,
        "request authenticated"
    );
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(extract_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_token("bearer   abc"), Some("abc"));
    }

    #[test]
    fn bare_token_is_accepted() {
        assert_eq!(extract_token("abc.def.ghi"), Some("abc.def.ghi"));
    }

    #[test]
    fn other_schemes_are_rejected() {
        assert_eq!(extract_token("Basic dXNlcjpwYXNz"), None);
    }

    #[test]
    fn empty_or_split_tokens_are_rejected() {
        assert_eq!(extract_token("Bearer "), None);
        assert_eq!(extract_token("BEARER"), None);
        assert_eq!(extract_token("Bearer a b"), None);
        assert_eq!(extract_token(""), None);
    }

    #[test]
    fn identity_derives_roles_and_info() {
        let claims: IdentityClaims = serde_json::from_value(serde_json::json!({
            "preferred_username": "jdoe",
            "realm_access": {"roles": ["ADMIN", "offline_access"]}
        }))
        .unwrap();
        let identity = RequestIdentity::new(claims);
        assert_eq!(identity.user_info.username.as_deref(), Some("jdoe"));
        assert_eq!(identity.roles.len(), 1);
        assert!(identity.roles.contains("ADMIN"));
    }
}
