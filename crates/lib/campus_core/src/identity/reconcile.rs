//! User reconciliation: bring the local user and its roles in line with the
//! token's claims.

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::IdentityError;
use super::claims::IdentityClaims;
use super::decoder::ClaimsDecoder;
use super::roles::derive_roles;
use super::store::IdentityStore;
use crate::models::identity::SyncOutcome;

/// Reconcile already-decoded claims against the store.
///
/// Idempotent in effect: a second call with the same claims only advances
/// `last_login`.
pub async fn reconcile(
    store: &dyn IdentityStore,
    claims: &IdentityClaims,
    now: DateTime<Utc>,
) -> Result<SyncOutcome, IdentityError> {
    let profile = claims.profile().ok_or(IdentityError::MissingUsername)?;
    let roles = derive_roles(claims);

    let outcome = store.sync_user(&profile, &roles, now).await?;
    info!(
        user = %outcome.user.display_name(),
        created = outcome.created,
        roles = ?outcome.user.roles,
        "user {}",
        if outcome.created { "created" } else { "updated" }
    );
    Ok(outcome)
}

/// Decode `token`, then reconcile. The store is never touched when decoding
/// fails.
pub async fn reconcile_token(
    decoder: &ClaimsDecoder,
    store: &dyn IdentityStore,
    token: &str,
    now: DateTime<Utc>,
) -> Result<SyncOutcome, IdentityError> {
    let claims = decoder.decode(token).inspect_err(|e| {
        warn!(error = %e, "cannot reconcile user: token rejected");
    })?;
    reconcile(store, &claims, now).await
}
