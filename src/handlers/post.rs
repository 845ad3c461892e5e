//! URL-encoded form bodies.

use async_trait::async_trait;

use crate::handlers::form::parse_form;
use crate::http::{HttpContext, HttpError};
use crate::pipeline::{Handler, Stage};

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Parses `application/x-www-form-urlencoded` bodies into `ctx.params`,
/// with bracket notation for nested values.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostHandler;

#[async_trait]
impl Handler for PostHandler {
    fn name(&self) -> &'static str {
        "post"
    }

    fn stages(&self) -> &'static [Stage] {
        &[Stage::BeginRequest]
    }

    async fn begin_request(&self, ctx: &mut HttpContext) -> Result<(), HttpError> {
        if ctx.content_type().as_deref() != Some(FORM_URLENCODED) || ctx.body().is_empty() {
            return Ok(());
        }
        let pairs = url::form_urlencoded::parse(ctx.body())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect::<Vec<_>>();
        let form = parse_form(pairs)?;
        tracing::trace!(request_id = %ctx.request_id, fields = form.len(), "Form body parsed");
        ctx.params.extend(form);
        Ok(())
    }
}
