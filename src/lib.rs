//! MVC web framework library.
//!
//! # Data Flow
//! ```text
//! HttpServer (axum, catch-all route)
//!     → Application::process
//!     → pipeline: beginRequest … postMapRequest (handlers in configured order)
//!     → claimed Processor (static file or controller action)
//!     → ActionResult::execute
//!     → endRequest
//!     → response (finalized once)
//! ```

pub mod app;
pub mod config;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod mvc;
pub mod observability;
pub mod pipeline;
pub mod resilience;
pub mod results;
pub mod routing;

pub use app::{Application, ApplicationBuilder, BuildError};
pub use config::AppConfig;
pub use http::{HttpContext, HttpError, HttpServer};
pub use lifecycle::Shutdown;
pub use mvc::{ActionMethod, Controller};
pub use results::ActionResult;
