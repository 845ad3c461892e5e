//! File responses with ETag revalidation.
//!
//! Shared by the static-file handler and `ActionResult::File`. The ETag is a
//! digest of the file's modification time, so it changes exactly when the
//! file does. A missing file is 404; a file whose extension has no
//! registered MIME type is 403.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::http::{header, StatusCode};
use base64::Engine as _;
use sha2::{Digest, Sha256};

use crate::http::{HttpContext, HttpError};

/// Strong entity tag for a modification time: a quoted base64 digest.
pub fn compute_etag(modified: SystemTime) -> String {
    let stamp = modified
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
        .to_string();
    let digest = Sha256::digest(stamp.as_bytes());
    format!("\"{}\"", base64::engine::general_purpose::STANDARD.encode(digest))
}

/// Whether an `If-None-Match` value matches `etag` (weak comparison).
pub fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || candidate.trim_start_matches("W/") == etag)
}

/// Extension of `name` including the leading dot, lower-cased.
pub fn extension_of(name: &Path) -> Option<String> {
    name.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
}

/// Write `path` to the response, or a 304 if the client copy is current.
pub async fn serve_file(
    ctx: &mut HttpContext,
    path: &Path,
    file_name: Option<&str>,
) -> Result<(), HttpError> {
    let metadata = tokio::fs::metadata(path).await.map_err(HttpError::from)?;
    if !metadata.is_file() {
        return Err(HttpError::not_found());
    }

    let etag = compute_etag(metadata.modified().map_err(HttpError::from)?);
    if ctx
        .header(header::IF_NONE_MATCH)
        .is_some_and(|value| etag_matches(value, &etag))
    {
        tracing::debug!(request_id = %ctx.request_id, path = %path.display(), "Not modified");
        ctx.response.write_head(StatusCode::NOT_MODIFIED, None);
        ctx.response.write(Vec::new());
        return Ok(());
    }

    let lookup_name = file_name.map(Path::new).unwrap_or(path);
    let content_type = extension_of(lookup_name)
        .and_then(|ext| ctx.app().mime_for(&ext))
        .map(|mime| match &mime.encoding {
            Some(encoding) => format!("{};charset={}", mime.mime_type, encoding),
            None => mime.mime_type.clone(),
        })
        .ok_or_else(|| {
            tracing::debug!(path = %path.display(), "No MIME type registered for file");
            HttpError::forbidden()
        })?;

    let data = tokio::fs::read(path).await.map_err(HttpError::from)?;

    ctx.response.set_header(header::ETAG, &etag);
    if let Some(name) = file_name {
        ctx.response.set_header(
            header::CONTENT_DISPOSITION,
            &format!("attachment; filename=\"{}\"", name.replace('"', "")),
        );
    }
    ctx.response.write_head(StatusCode::OK, Some(&content_type));
    ctx.response.write(data);
    Ok(())
}
