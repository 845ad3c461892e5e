//! JSON request bodies.

use async_trait::async_trait;
use serde_json::Value;

use crate::http::{HttpContext, HttpError};
use crate::pipeline::{Handler, Stage};

/// Parameter holding a parsed JSON body.
pub const DATA_PARAM: &str = "data";

/// Parses `application/json` bodies into `params["data"]` at `beginRequest`.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonHandler;

fn is_json(content_type: &str) -> bool {
    content_type == "application/json" || content_type.ends_with("+json")
}

#[async_trait]
impl Handler for JsonHandler {
    fn name(&self) -> &'static str {
        "json"
    }

    fn stages(&self) -> &'static [Stage] {
        &[Stage::BeginRequest]
    }

    async fn begin_request(&self, ctx: &mut HttpContext) -> Result<(), HttpError> {
        if !ctx.content_type().is_some_and(|ct| is_json(&ct)) || ctx.body().is_empty() {
            return Ok(());
        }
        let data: Value = serde_json::from_slice(ctx.body()).map_err(|err| {
            tracing::debug!(request_id = %ctx.request_id, error = %err, "Malformed JSON body");
            HttpError::BadRequest("Invalid JSON data.".into())
        })?;
        ctx.params.insert(DATA_PARAM, data);
        Ok(())
    }
}
