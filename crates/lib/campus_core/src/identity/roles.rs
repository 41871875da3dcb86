//! Role derivation and the role-gate predicate.

use std::collections::BTreeSet;

use super::claims::IdentityClaims;

/// Full administrative access.
pub const ROLE_ADMIN: &str = "ADMIN";
/// Any signed-in member.
pub const ROLE_USER: &str = "USER";
/// Enrolled student.
pub const ROLE_STUDENT: &str = "ETUDIANT";
/// Teaching staff.
pub const ROLE_TEACHER: &str = "ENSEIGNANT";

/// Provider bookkeeping roles that never become domain roles.
pub const EXCLUDED_ROLES: [&str; 6] = [
    "uma_authorization",
    "offline_access",
    "default-roles-my-realm",
    "view-profile",
    "manage-account-links",
    "manage-account",
];

/// Union of realm and per-client roles, minus [`EXCLUDED_ROLES`].
pub fn derive_roles(claims: &IdentityClaims) -> BTreeSet<String> {
    let realm = claims
        .realm_access
        .iter()
        .flat_map(|access| access.roles.iter());
    let clients = claims
        .resource_access
        .values()
        .flat_map(|access| access.roles.iter());

    realm
        .chain(clients)
        .filter(|role| !EXCLUDED_ROLES.contains(&role.as_str()))
        .cloned()
        .collect()
}

/// Role gate: passes iff `derived` and `required` share at least one role.
pub fn has_any_role<S: AsRef<str>>(derived: &BTreeSet<String>, required: &[S]) -> bool {
    required
        .iter()
        .any(|role| derived.contains(role.as_ref()))
}
