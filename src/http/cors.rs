//! CORS preflight headers.
//!
//! Applied by the MVC handler once a request has been mapped to a controller.
//! Each header is only set if nothing earlier in the pipeline set it.

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN,
};

use crate::http::context::HttpContext;

pub const DEFAULT_ALLOW_ORIGIN: &str = "*";
pub const DEFAULT_ALLOW_HEADERS: &str =
    "Origin, X-Requested-With, Content-Type, Content-Language, Accept, Accept-Language, Authorization";
pub const DEFAULT_ALLOW_METHODS: &str = "GET, OPTIONS, PUT, POST, DELETE";

/// Per-route overrides of the default CORS policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorsOverrides {
    pub allow_origin: Option<String>,
    pub allow_credentials: Option<bool>,
    pub allow_headers: Option<String>,
    pub allow_methods: Option<String>,
}

/// Set the four `Access-Control-Allow-*` headers on the response.
pub fn apply_preflight_headers(ctx: &mut HttpContext) {
    let overrides = ctx
        .route
        .as_ref()
        .map(|m| m.route.cors.clone())
        .unwrap_or_default();

    let allow_origin = overrides
        .allow_origin
        .unwrap_or_else(|| DEFAULT_ALLOW_ORIGIN.to_string());
    let allow_credentials = overrides.allow_credentials.unwrap_or(true);
    let allow_headers = overrides
        .allow_headers
        .unwrap_or_else(|| DEFAULT_ALLOW_HEADERS.to_string());
    let allow_methods = overrides
        .allow_methods
        .unwrap_or_else(|| DEFAULT_ALLOW_METHODS.to_string());

    if !ctx.response.has_header(&ACCESS_CONTROL_ALLOW_ORIGIN) {
        match ctx.header(ORIGIN).map(str::to_string) {
            Some(origin) => {
                // The request origin is echoed when allowed; otherwise no header.
                if allow_origin == "*" || allow_origin.contains(origin.as_str()) {
                    ctx.response.set_header(ACCESS_CONTROL_ALLOW_ORIGIN, &origin);
                }
            }
            None => ctx.response.set_header(ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        }
    }

    if !ctx.response.has_header(&ACCESS_CONTROL_ALLOW_CREDENTIALS) {
        ctx.response.set_header(
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
            if allow_credentials { "true" } else { "false" },
        );
    }

    if !ctx.response.has_header(&ACCESS_CONTROL_ALLOW_HEADERS) {
        ctx.response
            .set_header(ACCESS_CONTROL_ALLOW_HEADERS, &allow_headers);
    }

    if !ctx.response.has_header(&ACCESS_CONTROL_ALLOW_METHODS) {
        ctx.response
            .set_header(ACCESS_CONTROL_ALLOW_METHODS, &allow_methods);
    }
}
