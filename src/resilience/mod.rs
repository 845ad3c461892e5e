//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline stage future
//!     → timeouts.rs (per-stage watchdog)
//!     → On expiry: HttpError::Timeout through the normal error path
//! ```
//!
//! # Design Decisions
//! - A handler that never completes must not stall a request forever
//! - Nothing at this layer is retried

pub mod timeouts;
