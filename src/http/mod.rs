//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → context.rs (per-request state carried through the pipeline)
//!     → cors.rs (route CORS headers)
//!     → response.rs (errors become responses)
//!     → Send to client
//! ```

pub mod context;
pub mod cors;
pub mod error;
pub mod request;
pub mod response;
pub mod server;

pub use context::{HttpContext, Params, ResponseState, UploadedFile, User};
pub use error::HttpError;
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
