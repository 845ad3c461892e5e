//! Error responder.
//!
//! The single place a pipeline error turns into a response. Server errors
//! are logged with their detail; the client only ever sees the status line
//! and the error's public message.

use crate::http::context::HttpContext;
use crate::http::error::HttpError;

/// Replace the response with `err`.
pub fn respond_error(ctx: &mut HttpContext, err: &HttpError) {
    let status = err.status();
    if status.is_server_error() {
        tracing::error!(
            request_id = %ctx.request_id,
            method = %ctx.method(),
            path = %ctx.path(),
            status = status.as_u16(),
            error = ?err,
            "Request failed"
        );
    } else {
        tracing::debug!(
            request_id = %ctx.request_id,
            method = %ctx.method(),
            path = %ctx.path(),
            status = status.as_u16(),
            error = %err,
            "Request rejected"
        );
    }
    ctx.write_error(err);
}
