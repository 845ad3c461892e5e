//! Controllers, actions and the MVC dispatcher.
//!
//! # Data Flow
//! ```text
//! RouteMatch (from mapRequest)
//!     → registry.rs   (controller name → Controller via fallback chain)
//!     → dispatcher.rs (claim request, CORS, processRequest)
//!     → controller.rs (action name + verb → ActionMethod)
//!     → consumer.rs   (per-action guard chain)
//!     → ActionMethod body → ActionResult
//! ```
//!
//! # Design Decisions
//! - Controllers are registered explicitly by name; there is no dynamic
//!   loading
//! - Naming conventions (dasherized controller keys, camel-cased action
//!   lookup) live in naming.rs

pub mod consumer;
pub mod controller;
pub mod dispatcher;
pub mod naming;
pub mod registry;

pub use consumer::{Consumer, RequireAuthenticated, RequireParams};
pub use controller::{ActionFuture, ActionMethod, Args, Controller, ResultCallback};
pub use dispatcher::{MvcProcessor, ViewHandler, MVC_HANDLER};
pub use registry::{ControllerFactory, ControllerRegistry, ModelCatalog, ModelInfo, Resolution};
