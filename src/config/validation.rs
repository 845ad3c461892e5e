//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every route pattern compiles and is declared once
//! - Check MIME registrations and restricted-location regexes
//! - Check the handler order lists each handler at most once
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Handler names are checked against the registry when the application is
//!   built, since custom handlers are registered in code

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::routing::RoutePattern;

/// Upper bound for the per-stage watchdog (one hour).
pub const MAX_STAGE_TIMEOUT_MS: u64 = 3_600_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route #{index} ({url}): {reason}")]
    InvalidRoute {
        index: usize,
        url: String,
        reason: String,
    },

    #[error("route #{index}: duplicate url {url}")]
    DuplicateRoute { index: usize, url: String },

    #[error("mime {extension}: {reason}")]
    InvalidMime { extension: String, reason: String },

    #[error("handler {0} listed more than once")]
    DuplicateHandler(String),

    #[error("restricted location {pattern}: {reason}")]
    InvalidRestrictedLocation { pattern: String, reason: String },

    #[error("stage_timeout_ms {0} exceeds {MAX_STAGE_TIMEOUT_MS}")]
    StageTimeout(u64),

    #[error("listener.max_body_size must be greater than zero")]
    BodyLimit,
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut urls = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        if let Err(err) = RoutePattern::compile(&route.url) {
            errors.push(ValidationError::InvalidRoute {
                index,
                url: route.url.clone(),
                reason: err.to_string(),
            });
        } else if !urls.insert(route.url.as_str()) {
            errors.push(ValidationError::DuplicateRoute {
                index,
                url: route.url.clone(),
            });
        }
    }

    let mut extensions = HashSet::new();
    for mime in &config.mimes {
        let reason = if !mime.extension.starts_with('.') || mime.extension.len() < 2 {
            Some("extension must start with '.'")
        } else if mime.mime_type.trim().is_empty() {
            Some("type must not be empty")
        } else if !extensions.insert(mime.extension.to_ascii_lowercase()) {
            Some("extension registered more than once")
        } else {
            None
        };
        if let Some(reason) = reason {
            errors.push(ValidationError::InvalidMime {
                extension: mime.extension.clone(),
                reason: reason.to_string(),
            });
        }
    }

    let mut handlers = HashSet::new();
    for name in &config.handlers.order {
        if !handlers.insert(name.as_str()) {
            errors.push(ValidationError::DuplicateHandler(name.clone()));
        }
    }

    for pattern in &config.settings.restricted_locations {
        if let Err(err) = regex::Regex::new(pattern) {
            errors.push(ValidationError::InvalidRestrictedLocation {
                pattern: pattern.clone(),
                reason: err.to_string(),
            });
        }
    }

    if config.settings.stage_timeout_ms > MAX_STAGE_TIMEOUT_MS {
        errors.push(ValidationError::StageTimeout(config.settings.stage_timeout_ms));
    }

    if config.listener.max_body_size == 0 {
        errors.push(ValidationError::BodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{MimeConfig, RouteConfig};

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&AppConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AppConfig::default();
        config.routes.push(RouteConfig::new("/pages/:name"));
        config.routes.push(RouteConfig::new("/pages/:name"));
        config.routes.push(RouteConfig::new("/a/:"));
        config.mimes.push(MimeConfig::new(".HTML", "text/html", None));
        config.handlers.order.push("query".into());
        config.settings.stage_timeout_ms = MAX_STAGE_TIMEOUT_MS + 1;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5, "{:?}", errors);
        assert!(matches!(errors[0], ValidationError::DuplicateRoute { index: 1, .. }));
        assert!(matches!(errors[1], ValidationError::InvalidRoute { index: 2, .. }));
        assert!(errors.contains(&ValidationError::DuplicateHandler("query".into())));
    }
}
