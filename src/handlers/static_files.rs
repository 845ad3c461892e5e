//! Static files under the application root.
//!
//! # Data Flow
//! ```text
//! mapRequest:     already claimed? → skip
//!                 decode path → join under root → canonicalize
//!                 outside root, missing or not a file? → leave unclaimed
//!                 ctx.execution_path = file, claim StaticProcessor
//! processRequest: serve_file (ETag / 304 / MIME / 403)
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::http::{HttpContext, HttpError};
use crate::pipeline::{Handler, Processor, Stage};
use crate::results::file::serve_file;

pub const STATIC_HANDLER: &str = "static";

#[derive(Debug, Clone)]
pub struct StaticHandler {
    root: PathBuf,
}

impl StaticHandler {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Physical file for a request path, if it is a file inside the root.
    pub async fn map_path(&self, request_path: &str) -> Option<PathBuf> {
        let relative = relative_path(request_path)?;
        let root = tokio::fs::canonicalize(&self.root).await.ok()?;
        let candidate = tokio::fs::canonicalize(root.join(relative)).await.ok()?;
        if !candidate.starts_with(&root) {
            return None;
        }
        let metadata = tokio::fs::metadata(&candidate).await.ok()?;
        metadata.is_file().then_some(candidate)
    }
}

/// Decode and validate the path segments of a request path.
fn relative_path(request_path: &str) -> Option<PathBuf> {
    let mut relative = PathBuf::new();
    for segment in request_path.split('/').filter(|s| !s.is_empty()) {
        let decoded = urlencoding::decode(segment).ok()?;
        if decoded == "." || decoded == ".." || decoded.contains(['/', '\\', '\0']) {
            return None;
        }
        relative.push(&*decoded);
    }
    (!relative.as_os_str().is_empty()).then_some(relative)
}

#[async_trait]
impl Handler for StaticHandler {
    fn name(&self) -> &'static str {
        STATIC_HANDLER
    }

    fn stages(&self) -> &'static [Stage] {
        &[Stage::MapRequest]
    }

    async fn map_request(&self, ctx: &mut HttpContext) -> Result<(), HttpError> {
        if ctx.is_claimed() {
            return Ok(());
        }
        if let Some(file) = self.map_path(ctx.path()).await {
            tracing::debug!(request_id = %ctx.request_id, file = %file.display(), "Static file mapped");
            ctx.execution_path = Some(file);
            ctx.claim(Box::new(StaticProcessor));
        }
        Ok(())
    }
}

/// Serves the file recorded in `ctx.execution_path`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticProcessor;

#[async_trait]
impl Processor for StaticProcessor {
    fn name(&self) -> &'static str {
        STATIC_HANDLER
    }

    async fn process_request(self: Box<Self>, ctx: &mut HttpContext) -> Result<(), HttpError> {
        let path = ctx
            .execution_path
            .clone()
            .ok_or_else(|| HttpError::Server("Invalid request handler.".into()))?;
        serve_file(ctx, Path::new(&path), None).await
    }
}
