//! HTTP Basic authentication.
//!
//! # Responsibilities
//! - Parse `Authorization: Basic <token>` at `authenticateRequest`
//! - Reject malformed user names before they reach the provider
//! - Delegate the credential check to an [`AuthProvider`]
//!
//! # Design Decisions
//! - No header, or a header that is not Basic, leaves the request anonymous
//! - An undecodable token is treated like no header at all
//! - A provider rejection is 401; the provider chooses the message

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;
use base64::Engine as _;
use regex::Regex;

use crate::config::AuthConfig;
use crate::http::{HttpContext, HttpError, User};
use crate::pipeline::{Handler, Stage};

static USER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9.@_-]{1,255}$").expect("static user name regex"));

pub const BASIC_AUTHENTICATION: &str = "Basic";

/// Checks credentials. The real user store is external.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn login(&self, user_name: &str, password: &str) -> Result<User, HttpError>;
}

/// Credentials listed in `[settings.auth]`.
#[derive(Debug, Clone, Default)]
pub struct ConfigAuthProvider {
    users: HashMap<String, String>,
}

impl ConfigAuthProvider {
    pub fn from_config(config: &AuthConfig) -> Self {
        Self {
            users: config
                .users
                .iter()
                .map(|u| (u.name.to_lowercase(), u.password.clone()))
                .collect(),
        }
    }
}

#[async_trait]
impl AuthProvider for ConfigAuthProvider {
    async fn login(&self, user_name: &str, password: &str) -> Result<User, HttpError> {
        match self.users.get(&user_name.to_lowercase()) {
            Some(expected) if expected == password => Ok(User {
                name: user_name.to_string(),
                authentication_type: BASIC_AUTHENTICATION.to_string(),
            }),
            _ => Err(HttpError::Unauthorized("Unknown username or bad password.".into())),
        }
    }
}

/// Credentials carried by an `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub user_name: String,
    pub password: String,
}

/// Parse a Basic authorization header value.
pub fn parse_basic_authorization(value: &str) -> Option<BasicCredentials> {
    let value = value.trim();
    let (scheme, token) = value.split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case(BASIC_AUTHENTICATION) {
        return None;
    }
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(token.trim())
        .ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user_name, password) = decoded.split_once(':')?;
    Some(BasicCredentials {
        user_name: user_name.to_string(),
        password: password.to_string(),
    })
}

pub struct BasicAuthHandler {
    provider: Arc<dyn AuthProvider>,
}

impl BasicAuthHandler {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Handler for BasicAuthHandler {
    fn name(&self) -> &'static str {
        "basic-auth"
    }

    fn stages(&self) -> &'static [Stage] {
        &[Stage::AuthenticateRequest]
    }

    async fn authenticate_request(&self, ctx: &mut HttpContext) -> Result<(), HttpError> {
        let Some(credentials) = ctx.header(AUTHORIZATION).and_then(parse_basic_authorization) else {
            return Ok(());
        };
        if !USER_NAME.is_match(&credentials.user_name) {
            return Err(HttpError::BadRequest(
                "Wrong username format. Please contact to system administrator.".into(),
            ));
        }

        let user = self
            .provider
            .login(&credentials.user_name, &credentials.password)
            .await?;
        tracing::debug!(request_id = %ctx.request_id, user = %user.name, "Authenticated");
        ctx.user = Some(user);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserCredentials;

    fn token(raw: &str) -> String {
        format!("Basic {}", base64::engine::general_purpose::STANDARD.encode(raw))
    }

    #[test]
    fn test_parse_basic_authorization() {
        let parsed = parse_basic_authorization(&token("admin:s3:cret")).unwrap();
        assert_eq!(parsed.user_name, "admin");
        assert_eq!(parsed.password, "s3:cret");

        assert!(parse_basic_authorization("Bearer abc").is_none());
        assert!(parse_basic_authorization("Basic !!!").is_none());
        assert!(parse_basic_authorization(&token("no-colon")).is_none());
    }

    #[test]
    fn test_user_name_format() {
        assert!(USER_NAME.is_match("user.name@example.com"));
        assert!(!USER_NAME.is_match("user name"));
        assert!(!USER_NAME.is_match(""));
    }

    #[tokio::test]
    async fn test_config_provider() {
        let provider = ConfigAuthProvider::from_config(&AuthConfig {
            users: vec![UserCredentials {
                name: "Admin".into(),
                password: "secret".into(),
            }],
        });
        let user = provider.login("admin", "secret").await.unwrap();
        assert_eq!(user.authentication_type, BASIC_AUTHENTICATION);
        assert_eq!(
            provider.login("admin", "wrong").await.unwrap_err().status(),
            axum::http::StatusCode::UNAUTHORIZED
        );
    }
}
