//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for an
//! application. All types derive Serde traits for deserialization from
//! config files.

use serde::{Deserialize, Serialize};

/// Built-in handler names, in the recommended registration order.
pub const DEFAULT_HANDLER_ORDER: [&str; 7] =
    ["query", "basic-auth", "static", "mvc", "multipart", "json", "post"];

/// Root configuration for an application.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// Route definitions, in match-priority order.
    pub routes: Vec<RouteConfig>,

    /// MIME types served for static files and file results.
    pub mimes: Vec<MimeConfig>,

    /// Data models known to the application (feeds controller fallback).
    pub models: Vec<ModelConfig>,

    /// Handler registration order.
    pub handlers: HandlersConfig,

    /// Application settings.
    pub settings: SettingsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            routes: Vec::new(),
            mimes: default_mimes(),
            models: Vec::new(),
            handlers: HandlersConfig::default(),
            settings: SettingsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum buffered request body in bytes.
    pub max_body_size: usize,

    /// Whole-request timeout in seconds, enforced by the server layer.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_size: 2 * 1024 * 1024, // 2MB
            request_timeout_secs: 30,
        }
    }
}

/// One route: request pattern, response template and dispatch hints.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct RouteConfig {
    /// Request pattern (e.g. `/pages/:name`).
    pub url: String,

    /// Response template (e.g. `/pages/:name.html`).
    pub route: Option<String>,

    /// Controller name; overrides `:controller` and the path convention.
    pub controller: Option<String>,

    /// Action name; overrides `:action`.
    pub action: Option<String>,

    pub mime: Option<String>,

    /// Views sub-directory.
    pub path: Option<String>,

    /// CORS methods; takes precedence over `allow_methods`.
    pub allow: Option<String>,
    pub allow_origin: Option<String>,
    pub allow_credentials: Option<bool>,
    pub allow_headers: Option<String>,
    pub allow_methods: Option<String>,
}

impl RouteConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

/// A MIME registration keyed by file extension.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MimeConfig {
    /// Extension including the dot (e.g. ".html").
    pub extension: String,

    #[serde(rename = "type")]
    pub mime_type: String,

    pub encoding: Option<String>,
}

impl MimeConfig {
    pub fn new(extension: &str, mime_type: &str, encoding: Option<&str>) -> Self {
        Self {
            extension: extension.to_string(),
            mime_type: mime_type.to_string(),
            encoding: encoding.map(str::to_string),
        }
    }
}

fn default_mimes() -> Vec<MimeConfig> {
    vec![
        MimeConfig::new(".html", "text/html", Some("utf-8")),
        MimeConfig::new(".htm", "text/html", Some("utf-8")),
        MimeConfig::new(".css", "text/css", Some("utf-8")),
        MimeConfig::new(".js", "text/javascript", Some("utf-8")),
        MimeConfig::new(".json", "application/json", Some("utf-8")),
        MimeConfig::new(".xml", "text/xml", Some("utf-8")),
        MimeConfig::new(".txt", "text/plain", Some("utf-8")),
        MimeConfig::new(".svg", "image/svg+xml", None),
        MimeConfig::new(".png", "image/png", None),
        MimeConfig::new(".jpg", "image/jpeg", None),
        MimeConfig::new(".jpeg", "image/jpeg", None),
        MimeConfig::new(".gif", "image/gif", None),
        MimeConfig::new(".ico", "image/x-icon", None),
        MimeConfig::new(".pdf", "application/pdf", None),
        MimeConfig::new(".woff", "font/woff", None),
        MimeConfig::new(".woff2", "font/woff2", None),
    ]
}

/// A data model the external ORM knows about.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct ModelConfig {
    pub name: String,

    /// Type category, used to pick a controller (defaults to "data").
    #[serde(rename = "type", default)]
    pub model_type: Option<String>,
}

/// Handler registration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HandlersConfig {
    /// Handler names in registration order.
    pub order: Vec<String>,
}

impl Default for HandlersConfig {
    fn default() -> Self {
        Self {
            order: DEFAULT_HANDLER_ORDER.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Application settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// Application root; static files and `views/` live under it.
    pub root: String,

    /// Path regexes the MVC handler refuses with 403.
    pub restricted_locations: Vec<String>,

    /// Watchdog per lifecycle stage in milliseconds (0 disables).
    pub stage_timeout_ms: u64,

    pub auth: AuthConfig,

    pub localization: LocalizationConfig,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            restricted_locations: vec![
                "^/controllers/".to_string(),
                "^/models/".to_string(),
                "^/extensions/".to_string(),
                "^/handlers/".to_string(),
                "^/views/".to_string(),
            ],
            stage_timeout_ms: 30_000,
            auth: AuthConfig::default(),
            localization: LocalizationConfig::default(),
        }
    }
}

/// Cultures a request may resolve to.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LocalizationConfig {
    /// Lower-case culture names (e.g. "en-us", "el-gr").
    pub cultures: Vec<String>,

    /// Culture used when nothing in the request matches.
    pub default: String,
}

impl Default for LocalizationConfig {
    fn default() -> Self {
        Self {
            cultures: vec!["en-us".to_string()],
            default: "en-us".to_string(),
        }
    }
}

/// Credentials for the built-in auth provider.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    pub users: Vec<UserCredentials>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct UserCredentials {
    pub name: String,
    pub password: String,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the human format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.handlers.order, DEFAULT_HANDLER_ORDER.to_vec());
        assert!(config.mimes.iter().any(|m| m.extension == ".html"));
        assert_eq!(config.settings.stage_timeout_ms, 30_000);
        assert!(config.routes.is_empty());
    }

    #[test]
    fn test_default_config_has_mime_table() {
        let config = AppConfig::default();
        assert!(config.mimes.iter().any(|m| m.extension == ".css"));
        assert_eq!(config.mimes, default_mimes());
        assert_eq!(config.settings.localization.default, "en-us");
    }

    #[test]
    fn test_routes_keep_file_order() {
        let config: AppConfig = toml::from_str(
            r#"
            [[routes]]
            url = "/pages/:name"
            route = "/pages/:name.html"

            [[routes]]
            url = "/:controller/:action"
            allow = "GET, PATCH"
            allow_credentials = false

            [[models]]
            name = "Order"
            type = "data"
            "#,
        )
        .unwrap();
        assert_eq!(config.routes[0].url, "/pages/:name");
        assert_eq!(config.routes[0].route.as_deref(), Some("/pages/:name.html"));
        assert_eq!(config.routes[1].allow.as_deref(), Some("GET, PATCH"));
        assert_eq!(config.routes[1].allow_credentials, Some(false));
        assert_eq!(config.models[0].model_type.as_deref(), Some("data"));
    }
}
