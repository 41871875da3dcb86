//! Token liveness check against the identity provider.
//!
//! One `GET` to the realm's userinfo endpoint per request. Only `200 OK`
//! counts as live; there are no retries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::IdentityConfig;

/// Liveness check errors.
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("Invalid userinfo URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Decides whether a bearer token is still accepted by the provider.
#[async_trait]
pub trait TokenValidator: Send + Sync {
    async fn is_live(&self, token: &str) -> Result<bool, ValidatorError>;
}

/// Keycloak userinfo-based validator.
#[derive(Debug, Clone)]
pub struct KeycloakTokenValidator {
    http: reqwest::Client,
    userinfo_url: Url,
}

impl KeycloakTokenValidator {
    pub fn new(config: &IdentityConfig) -> Result<Self, ValidatorError> {
        let userinfo_url = Url::parse(&config.userinfo_url())?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, userinfo_url })
    }

    pub fn userinfo_url(&self) -> &Url {
        &self.userinfo_url
    }
}

#[async_trait]
impl TokenValidator for KeycloakTokenValidator {
    async fn is_live(&self, token: &str) -> Result<bool, ValidatorError> {
        let response = self
            .http
            .get(self.userinfo_url.clone())
            .bearer_auth(token)
            .send()
            .await?;
        let status = response.status();
        debug!(status = status.as_u16(), "userinfo liveness check");
        Ok(status == StatusCode::OK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(server_url: &str) -> IdentityConfig {
        IdentityConfig {
            server_url: server_url.into(),
            realm: "my-realm".into(),
            client_id: "campus".into(),
            verify_signature: false,
            public_key_pem: None,
            timeout_secs: 1,
        }
    }

    #[test]
    fn builds_userinfo_url() {
        let validator = KeycloakTokenValidator::new(&config("http://localhost:8080")).unwrap();
        assert_eq!(
            validator.userinfo_url().as_str(),
            "http://localhost:8080/realms/my-realm/protocol/openid-connect/userinfo"
        );
    }

    #[test]
    fn rejects_unparseable_server_url() {
        assert!(matches!(
            KeycloakTokenValidator::new(&config("not a url")),
            Err(ValidatorError::Url(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_provider_is_an_error() {
        // Port 9 (discard) is closed on test hosts.
        let validator = KeycloakTokenValidator::new(&config("http://127.0.0.1:9")).unwrap();
        assert!(validator.is_live("token").await.is_err());
    }
}
