//! View engine seam and view lookup.
//!
//! Engines are external; this module only decides which file an engine is
//! asked to render. For a controller `c`, view `v` and an engine with
//! extension `e`, the candidates are `views/c/v.html.e` then
//! `views/shared/v.html.e`, engines tried in registration order.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use crate::http::{HttpContext, HttpError};

/// A template engine able to render one file extension.
#[async_trait]
pub trait ViewEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Extension without the dot, e.g. `ejs`.
    fn extension(&self) -> &str;

    async fn render(&self, path: &Path, data: &Value, ctx: &HttpContext) -> Result<String, HttpError>;
}

/// Find the first existing view file, returning it with its engine index.
pub async fn locate_view(
    root: &Path,
    controller: &str,
    view: &str,
    extensions: &[&str],
) -> Option<(usize, PathBuf)> {
    for (index, ext) in extensions.iter().enumerate() {
        let file = format!("{}.html.{}", view, ext);
        let own = root.join("views").join(controller).join(&file);
        if is_file(&own).await {
            return Some((index, own));
        }
        let shared = root.join("views").join("shared").join(&file);
        if is_file(&shared).await {
            return Some((index, shared));
        }
    }
    None
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}
