//! Multipart form bodies.
//!
//! Text fields go through the same bracket-notation folding as URL-encoded
//! forms. File fields are stored on `ctx.files` and described in
//! `ctx.params` by name, content type and size.

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::{FromRequest, Multipart};
use axum::http::Request;
use serde_json::json;

use crate::handlers::form::parse_form;
use crate::http::{HttpContext, HttpError, UploadedFile};
use crate::pipeline::{Handler, Stage};

const MULTIPART_FORM_DATA: &str = "multipart/form-data";

#[derive(Debug, Default, Clone, Copy)]
pub struct MultipartHandler;

fn malformed(err: impl std::fmt::Display) -> HttpError {
    tracing::debug!(error = %err, "Malformed multipart body");
    HttpError::BadRequest("Invalid multipart body.".into())
}

#[async_trait]
impl Handler for MultipartHandler {
    fn name(&self) -> &'static str {
        "multipart"
    }

    fn stages(&self) -> &'static [Stage] {
        &[Stage::BeginRequest]
    }

    async fn begin_request(&self, ctx: &mut HttpContext) -> Result<(), HttpError> {
        if ctx.content_type().as_deref() != Some(MULTIPART_FORM_DATA) {
            return Ok(());
        }

        let mut request = Request::new(Body::from(ctx.body().clone()));
        *request.headers_mut() = ctx.headers().clone();
        let mut multipart = Multipart::from_request(request, &()).await.map_err(malformed)?;

        let mut fields = Vec::new();
        while let Some(field) = multipart.next_field().await.map_err(malformed)? {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field.bytes().await.map_err(malformed)?;

            if file_name.is_some() {
                ctx.params.insert(
                    name.clone(),
                    json!({
                        "fileName": file_name,
                        "contentType": content_type,
                        "size": data.len(),
                    }),
                );
                ctx.files.insert(
                    name.clone(),
                    UploadedFile {
                        field: name,
                        file_name,
                        content_type,
                        data,
                    },
                );
            } else {
                fields.push((name, String::from_utf8_lossy(&data).into_owned()));
            }
        }

        tracing::trace!(
            request_id = %ctx.request_id,
            fields = fields.len(),
            files = ctx.files.len(),
            "Multipart body parsed"
        );
        ctx.params.extend(parse_form(fields)?);
        Ok(())
    }
}
