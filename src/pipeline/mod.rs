//! Request lifecycle pipeline.
//!
//! # Data Flow
//! ```text
//! HttpContext (fresh per request)
//!     → beginRequest → validateRequest → authenticateRequest
//!     → authorizeRequest → mapRequest → postMapRequest
//!     → HEAD?  yes → endRequest
//!              no  → claimed processor.processRequest → endRequest
//!     → Ok(()) or the first HttpError
//! ```
//!
//! # Design Decisions
//! - Stage order is fixed; handlers within a stage run in registration order
//! - The first failing handler ends the run; remaining stages are skipped
//! - No claimed processor after mapping is NotFound
//! - Finalizing the response is the caller's job and happens exactly once
//!   (see `Application::process`)

pub mod handler;
pub mod registry;
pub mod stage;

pub use handler::{Handler, Processor};
pub use registry::HandlerRegistry;
pub use stage::Stage;

use axum::http::Method;

use crate::http::{HttpContext, HttpError};
use crate::resilience::timeouts::with_stage_deadline;

/// Run every stage for one request.
pub async fn run(ctx: &mut HttpContext) -> Result<(), HttpError> {
    let app = ctx.app().clone();
    let handlers = app.handlers();
    let deadline = app.stage_deadline();

    for stage in Stage::BEFORE_PROCESS {
        handlers.emit(stage, ctx, deadline).await?;
    }

    if ctx.is(&Method::HEAD) {
        tracing::debug!(request_id = %ctx.request_id, "HEAD request, skipping processRequest");
        return handlers.emit(Stage::EndRequest, ctx, deadline).await;
    }

    let processor = ctx.take_processor().ok_or_else(|| {
        tracing::debug!(request_id = %ctx.request_id, path = %ctx.path(), "No handler claimed the request");
        HttpError::not_found()
    })?;

    tracing::debug!(
        request_id = %ctx.request_id,
        handler = processor.name(),
        "Processing request"
    );
    with_stage_deadline(Stage::ProcessRequest, deadline, processor.process_request(ctx)).await?;

    handlers.emit(Stage::EndRequest, ctx, deadline).await
}
