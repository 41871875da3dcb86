//! Outbound service clients.

pub mod keycloak;
