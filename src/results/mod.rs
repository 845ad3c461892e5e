//! Action results.
//!
//! # Data Flow
//! ```text
//! Controller action
//!     → ActionResult (immutable, built by the action)
//!     → execute(ctx): preExecuteResult → write response → postExecuteResult
//!        file.rs  (ETag / 304 / MIME lookup)
//!        view.rs  (view lookup, external engine renders)
//!        xml.rs   (JSON value → XML text)
//! ```
//!
//! # Design Decisions
//! - One sum type; each variant knows how to write itself
//! - `execute` takes `self`, so a result is consumed exactly once
//! - Missing backing files are 404, unknown MIME types 403, never 500

pub mod file;
pub mod view;
pub mod xml;

use std::path::{Path, PathBuf};

use axum::http::{header, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::http::{HttpContext, HttpError};
use crate::pipeline::Stage;

pub const HTML_CONTENT_TYPE: &str = "text/html;charset=utf-8";
pub const JSON_CONTENT_TYPE: &str = "application/json;charset=utf-8";
pub const JAVASCRIPT_CONTENT_TYPE: &str = "text/javascript;charset=utf-8";
pub const XML_CONTENT_TYPE: &str = "text/xml;charset=utf-8";

/// What an action hands back to the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionResult {
    /// Writes nothing.
    Empty,
    Content {
        body: String,
        content_type: String,
        status: Option<StatusCode>,
    },
    Json {
        body: String,
        status: Option<StatusCode>,
    },
    Javascript {
        body: String,
        status: Option<StatusCode>,
    },
    Xml {
        body: String,
        status: Option<StatusCode>,
    },
    /// 302 to `url`.
    Redirect { url: String },
    File {
        path: PathBuf,
        file_name: Option<String>,
    },
    /// Rendered by a registered view engine. `name` defaults to the action.
    View {
        name: Option<String>,
        data: Value,
        status: Option<StatusCode>,
    },
}

impl ActionResult {
    pub fn empty() -> Self {
        Self::Empty
    }

    pub fn content(body: impl Into<String>) -> Self {
        Self::Content {
            body: body.into(),
            content_type: HTML_CONTENT_TYPE.to_string(),
            status: None,
        }
    }

    pub fn content_with_type(body: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self::Content {
            body: body.into(),
            content_type: content_type.into(),
            status: None,
        }
    }

    /// JSON from a value; null object members are dropped.
    pub fn json(data: Value) -> Self {
        Self::Json {
            body: strip_nulls(data).to_string(),
            status: None,
        }
    }

    /// JSON from any serializable value.
    pub fn json_from<T: Serialize>(data: &T) -> Result<Self, HttpError> {
        let value = serde_json::to_value(data).map_err(HttpError::internal)?;
        Ok(Self::json(value))
    }

    pub fn javascript(body: impl Into<String>) -> Self {
        Self::Javascript {
            body: body.into(),
            status: None,
        }
    }

    /// XML from a value: strings pass through, anything else is serialized.
    pub fn xml(data: Value) -> Self {
        let body = match data {
            Value::Null => String::new(),
            Value::String(s) => s,
            other => xml::to_xml(&other, xml::default_root(&other)),
        };
        Self::Xml { body, status: None }
    }

    pub fn redirect(url: impl Into<String>) -> Self {
        Self::Redirect { url: url.into() }
    }

    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::File {
            path: path.as_ref().to_path_buf(),
            file_name: None,
        }
    }

    /// File served as a download under `file_name`.
    pub fn attachment(path: impl AsRef<Path>, file_name: impl Into<String>) -> Self {
        Self::File {
            path: path.as_ref().to_path_buf(),
            file_name: Some(file_name.into()),
        }
    }

    pub fn view(data: Value) -> Self {
        Self::View {
            name: None,
            data,
            status: None,
        }
    }

    pub fn view_named(name: impl Into<String>, data: Value) -> Self {
        Self::View {
            name: Some(name.into()),
            data,
            status: None,
        }
    }

    /// Override the response status. Ignored by `Empty`, `Redirect` and `File`.
    pub fn with_status(mut self, code: StatusCode) -> Self {
        match &mut self {
            Self::Content { status, .. }
            | Self::Json { status, .. }
            | Self::Javascript { status, .. }
            | Self::Xml { status, .. }
            | Self::View { status, .. } => *status = Some(code),
            Self::Empty | Self::Redirect { .. } | Self::File { .. } => {}
        }
        self
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Content { .. } => "content",
            Self::Json { .. } => "json",
            Self::Javascript { .. } => "javascript",
            Self::Xml { .. } => "xml",
            Self::Redirect { .. } => "redirect",
            Self::File { .. } => "file",
            Self::View { .. } => "view",
        }
    }

    /// Write this result to the response, bracketed by the result stages.
    pub async fn execute(self, ctx: &mut HttpContext) -> Result<(), HttpError> {
        let app = ctx.app().clone();
        let deadline = app.stage_deadline();
        tracing::debug!(request_id = %ctx.request_id, result = self.kind(), "Executing result");

        app.handlers().emit(Stage::PreExecuteResult, ctx, deadline).await?;
        self.write(ctx).await?;
        app.handlers().emit(Stage::PostExecuteResult, ctx, deadline).await
    }

    async fn write(self, ctx: &mut HttpContext) -> Result<(), HttpError> {
        match self {
            Self::Empty => Ok(()),
            Self::Content {
                body,
                content_type,
                status,
            } => {
                write_text(ctx, status, &content_type, body);
                Ok(())
            }
            Self::Json { body, status } => {
                write_text(ctx, status, JSON_CONTENT_TYPE, body);
                Ok(())
            }
            Self::Javascript { body, status } => {
                write_text(ctx, status, JAVASCRIPT_CONTENT_TYPE, body);
                Ok(())
            }
            Self::Xml { body, status } => {
                write_text(ctx, status, XML_CONTENT_TYPE, body);
                Ok(())
            }
            Self::Redirect { url } => {
                ctx.response.set_header(header::LOCATION, &url);
                ctx.response.write_head(StatusCode::FOUND, None);
                Ok(())
            }
            Self::File { path, file_name } => {
                file::serve_file(ctx, &path, file_name.as_deref()).await
            }
            Self::View { name, data, status } => {
                let html = render_view(ctx, name, &data).await?;
                write_text(ctx, status, HTML_CONTENT_TYPE, html);
                Ok(())
            }
        }
    }
}

fn write_text(ctx: &mut HttpContext, status: Option<StatusCode>, content_type: &str, body: String) {
    ctx.response
        .write_head(status.unwrap_or(StatusCode::OK), Some(content_type));
    ctx.response.write(body);
}

async fn render_view(ctx: &HttpContext, name: Option<String>, data: &Value) -> Result<String, HttpError> {
    let mut view = name
        .or_else(|| ctx.action.clone())
        .ok_or_else(HttpError::not_found)?;
    if let Some(prefix) = ctx
        .route
        .as_ref()
        .and_then(|m| m.route.view_path.clone().or_else(|| m.data("path").map(str::to_string)))
    {
        view = format!("{}/{}", prefix.trim_end_matches('/'), view);
    }
    let controller = ctx.controller.clone().unwrap_or_else(|| "shared".to_string());

    let app = ctx.app();
    let engines = app.view_engines();
    let extensions: Vec<&str> = engines.iter().map(|e| e.extension()).collect();
    let (index, path) = view::locate_view(app.root(), &controller, &view, &extensions)
        .await
        .ok_or_else(|| {
            tracing::debug!(controller = %controller, view = %view, "View not found");
            HttpError::NotFound(format!("View {} cannot be found", view))
        })?;

    tracing::debug!(engine = engines[index].name(), path = %path.display(), "Rendering view");
    engines[index].render(&path, data, ctx).await
}

/// Drop null members from objects, recursively.
fn strip_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(strip_nulls).collect()),
        other => other,
    }
}
