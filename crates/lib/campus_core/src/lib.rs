//! # campus_core
//!
//! Core domain logic for Campus: identity reconciliation against the
//! external identity provider, and academic record rules.

pub mod academics;
pub mod identity;
pub mod migrate;
pub mod models;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
