//! Built-in lifecycle handlers.
//!
//! # Data Flow
//! ```text
//! beginRequest:        query (query string) → multipart / json / post (body)
//! authenticateRequest: basic-auth (Authorization header → ctx.user)
//! authorizeRequest:    mvc (restricted locations)
//! mapRequest:          static (file under root) → mvc (route table)
//! postMapRequest:      mvc (CORS)
//! ```
//!
//! # Design Decisions
//! - Each handler listens only to the stages it needs
//! - Body parsers check the content type and leave other bodies alone
//! - The configured order is the registration order; the recommended one
//!   puts static files ahead of MVC so a file always wins over a route

pub mod basic_auth;
pub mod form;
pub mod json;
pub mod multipart;
pub mod post;
pub mod querystring;
pub mod static_files;

pub use basic_auth::{AuthProvider, BasicAuthHandler, ConfigAuthProvider};
pub use json::JsonHandler;
pub use multipart::MultipartHandler;
pub use post::PostHandler;
pub use querystring::QueryStringHandler;
pub use static_files::{StaticHandler, StaticProcessor};
