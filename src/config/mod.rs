//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → ApplicationBuilder compiles routes, handlers, catalogs
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server rebuilds the Application
//!     → atomic swap of Arc<Application>
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    AppConfig, AuthConfig, HandlersConfig, ListenerConfig, LocalizationConfig, MimeConfig, ModelConfig,
    ObservabilityConfig, RouteConfig, SettingsConfig, UserCredentials, DEFAULT_HANDLER_ORDER,
};
pub use validation::{validate_config, ValidationError};
pub use watcher::ConfigWatcher;
