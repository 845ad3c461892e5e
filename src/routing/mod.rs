//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → router.rs (first matching route, declaration order)
//!     → matcher.rs (anchored pattern match, parameter extraction)
//!     → Return: RouteMatch { route, params } or no match
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Compile each `url` pattern
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - First match wins; declaration order is the priority
//! - Per-request values live on RouteMatch, never on the shared Route

pub mod matcher;
pub mod router;

pub use matcher::{format_template, PatternError, RouteMismatchError, RouteParam, RoutePattern};
pub use router::{controller_from_path, Route, RouteMatch, RouteTable, DEFAULT_ACTION, ROOT_CONTROLLER};
