//! API server configuration.

use campus_core::identity::decoder::DecoderSettings;

/// Identity provider (Keycloak) settings.
#[derive(Clone, Debug)]
pub struct IdentityConfig {
    /// Provider base URL (e.g. "https://sso.example.org").
    pub server_url: String,
    /// Realm name.
    pub realm: String,
    /// Client id of this backend; used as the expected audience when
    /// signatures are verified.
    pub client_id: String,
    /// Verify token signatures locally. Off by default: tokens are only
    /// checked for liveness against the provider.
    pub verify_signature: bool,
    /// Realm RSA public key (PEM), required when `verify_signature` is set.
    pub public_key_pem: Option<String>,
    /// Timeout for the userinfo liveness call, in seconds.
    pub timeout_secs: u64,
}

impl IdentityConfig {
    /// OpenID Connect userinfo endpoint for the realm.
    pub fn userinfo_url(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/userinfo",
            self.server_url.trim_end_matches('/'),
            self.realm
        )
    }

    /// Settings for the claims decoder.
    pub fn decoder_settings(&self) -> DecoderSettings {
        DecoderSettings {
            verify_signature: self.verify_signature,
            public_key_pem: self.public_key_pem.clone(),
            audience: self
                .verify_signature
                .then(|| self.client_id.clone())
                .filter(|c| !c.is_empty()),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:3100").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub pg_connection_url: String,
    /// Identity provider settings.
    pub identity: IdentityConfig,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                    | Default                            |
    /// |-----------------------------|------------------------------------|
    /// | `BIND_ADDR`                 | `127.0.0.1:3100`                   |
    /// | `DATABASE_URL`              | `postgres://localhost:5432/campus` |
    /// | `KEYCLOAK_SERVER_URL`       | `http://localhost:8080`            |
    /// | `KEYCLOAK_REALM`            | `my-realm`                         |
    /// | `KEYCLOAK_CLIENT_ID`        | `campus`                           |
    /// | `KEYCLOAK_VERIFY_SIGNATURE` | `false`                            |
    /// | `KEYCLOAK_PUBLIC_KEY`       | unset                              |
    /// | `KEYCLOAK_TIMEOUT_SECS`     | `10`                               |
    pub fn from_env() -> Self {
        Self {
            bind_addr: env_or("BIND_ADDR", "127.0.0.1:3100"),
            pg_connection_url: env_or("DATABASE_URL", "postgres://localhost:5432/campus"),
            identity: IdentityConfig {
                server_url: env_or("KEYCLOAK_SERVER_URL", "http://localhost:8080"),
                realm: env_or("KEYCLOAK_REALM", "my-realm"),
                client_id: env_or("KEYCLOAK_CLIENT_ID", "campus"),
                verify_signature: std::env::var("KEYCLOAK_VERIFY_SIGNATURE")
                    .map(|v| parse_flag(&v))
                    .unwrap_or(false),
                public_key_pem: std::env::var("KEYCLOAK_PUBLIC_KEY")
                    .ok()
                    .filter(|k| !k.trim().is_empty()),
                timeout_secs: std::env::var("KEYCLOAK_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            },
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

/// `1`, `true`, `yes`, `on` (any case) are true.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(verify: bool) -> IdentityConfig {
        IdentityConfig {
            server_url: "https://sso.example.org/".into(),
            realm: "campus".into(),
            client_id: "campus-api".into(),
            verify_signature: verify,
            public_key_pem: None,
            timeout_secs: 5,
        }
    }

    #[test]
    fn userinfo_url_strips_trailing_slash() {
        assert_eq!(
            identity(false).userinfo_url(),
            "https://sso.example.org/realms/campus/protocol/openid-connect/userinfo"
        );
    }

    #[test]
    fn audience_only_when_verifying() {
        assert!(identity(false).decoder_settings().audience.is_none());
        assert_eq!(
            identity(true).decoder_settings().audience.as_deref(),
            Some("campus-api")
        );
    }

    #[test]
    fn flags_parse_loosely() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag(" 1 "));
        assert!(!parse_flag("0"));
        assert!(!parse_flag(""));
    }
}
