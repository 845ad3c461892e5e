//! Per-request context.
//!
//! One `HttpContext` exists per incoming request. It owns the buffered
//! request, the evolving parameter map, the claimed processor and the
//! response being built. It is never shared or pooled; `into_response`
//! consumes it, so a context is finalized at most once.
//!
//! The request path is percent-decoded once, at construction, segment by
//! segment as the static handler decodes it. Location checks read
//! `decoded_path`, never the raw URI.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, Response, StatusCode, Uri};
use serde_json::{Map, Value};

use crate::app::Application;
use crate::http::error::HttpError;
use crate::pipeline::Processor;
use crate::routing::RouteMatch;

/// Request parameters: query string, route values, parsed body fields and
/// uploaded file descriptors, merged in pipeline order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Map<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Case-insensitive lookup; an exact match wins.
    pub fn get_ignore_case(&self, name: &str) -> Option<&Value> {
        self.0.get(name).or_else(|| {
            self.0
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v)
        })
    }

    /// String form of a parameter, if it is a scalar.
    pub fn get_str(&self, name: &str) -> Option<String> {
        match self.get(name)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    pub fn extend(&mut self, other: Map<String, Value>) {
        self.0.extend(other);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// A file received in a multipart body.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// The authenticated principal, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub authentication_type: String,
}

impl User {
    pub fn anonymous() -> Self {
        Self {
            name: "anonymous".into(),
            authentication_type: "None".into(),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.authentication_type == "None"
    }
}

/// Response under construction.
#[derive(Debug)]
pub struct ResponseState {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    head_written: bool,
}

impl Default for ResponseState {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            head_written: false,
        }
    }
}

impl ResponseState {
    /// Set status and content type. Headers already set are kept.
    pub fn write_head(&mut self, status: StatusCode, content_type: Option<&str>) {
        self.status = status;
        if let Some(ct) = content_type.and_then(|ct| HeaderValue::from_str(ct).ok()) {
            self.headers.insert(header::CONTENT_TYPE, ct);
        }
        self.head_written = true;
    }

    pub fn write(&mut self, body: impl Into<Bytes>) {
        self.body = body.into();
    }

    pub fn set_header(&mut self, name: HeaderName, value: &str) {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.insert(name, value);
        }
    }

    pub fn has_header(&self, name: &HeaderName) -> bool {
        self.headers.contains_key(name)
    }

    pub fn head_written(&self) -> bool {
        self.head_written
    }
}

/// Everything the pipeline knows about one request.
pub struct HttpContext {
    app: Arc<Application>,
    pub request_id: String,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    decoded_path: String,
    cookies: HashMap<String, String>,
    pub params: Params,
    pub files: HashMap<String, UploadedFile>,
    pub user: Option<User>,
    /// Route bound during mapping.
    pub route: Option<RouteMatch>,
    /// Lower-cased name of the resolved controller.
    pub controller: Option<String>,
    /// Resolved action name.
    pub action: Option<String>,
    /// Physical file targeted by the request, when one was mapped.
    pub execution_path: Option<PathBuf>,
    processor: Option<Box<dyn Processor>>,
    handled_by: Option<&'static str>,
    pub response: ResponseState,
}

impl std::fmt::Debug for HttpContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpContext")
            .field("request_id", &self.request_id)
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("params", &self.params)
            .field("controller", &self.controller)
            .field("action", &self.action)
            .field("claimed", &self.processor.as_ref().map(|p| p.name()))
            .finish()
    }
}

impl HttpContext {
    pub fn new(
        app: Arc<Application>,
        request_id: impl Into<String>,
        method: Method,
        uri: Uri,
        headers: HeaderMap,
        body: Bytes,
    ) -> Self {
        let decoded_path = decode_path(uri.path());
        let cookies = parse_cookies(&headers);
        Self {
            app,
            request_id: request_id.into(),
            method,
            uri,
            headers,
            body,
            decoded_path,
            cookies,
            params: Params::new(),
            files: HashMap::new(),
            user: None,
            route: None,
            controller: None,
            action: None,
            execution_path: None,
            processor: None,
            handled_by: None,
            response: ResponseState::default(),
        }
    }

    pub fn app(&self) -> &Arc<Application> {
        &self.app
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn is(&self, method: &Method) -> bool {
        self.method == *method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Percent-decoded path with empty segments collapsed.
    pub fn decoded_path(&self) -> &str {
        &self.decoded_path
    }

    pub fn query(&self) -> Option<&str> {
        self.uri.query()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Request media type without parameters, lower-cased.
    pub fn content_type(&self) -> Option<String> {
        self.header(header::CONTENT_TYPE)
            .map(|ct| ct.split(';').next().unwrap_or_default().trim().to_ascii_lowercase())
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Cookies sent with the request.
    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }

    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Culture for this request.
    ///
    /// The `lang` parameter wins over the first `Accept-Language` entry. The
    /// candidate matches a configured culture exactly or by its two-letter
    /// language prefix; otherwise the configured default applies.
    pub fn culture(&self) -> String {
        let localization = &self.app.config().settings.localization;
        let requested = self.params.get_str("lang").or_else(|| {
            self.header(header::ACCEPT_LANGUAGE)
                .and_then(|value| value.split([',', ';']).next())
                .map(|lang| lang.trim().to_string())
        });
        requested
            .map(|lang| lang.to_ascii_lowercase())
            .filter(|lang| !lang.is_empty())
            .and_then(|lang| {
                localization.cultures.iter().find(|culture| {
                    let culture = culture.to_ascii_lowercase();
                    culture == lang
                        || matches!((culture.get(..2), lang.get(..2)), (Some(a), Some(b)) if a == b)
                })
            })
            .cloned()
            .unwrap_or_else(|| localization.default.clone())
    }

    /// Claim the request for `processor`. The first claim wins.
    pub fn claim(&mut self, processor: Box<dyn Processor>) -> bool {
        if self.processor.is_some() {
            return false;
        }
        tracing::debug!(
            request_id = %self.request_id,
            handler = processor.name(),
            "Request claimed"
        );
        self.processor = Some(processor);
        true
    }

    pub fn is_claimed(&self) -> bool {
        self.processor.is_some()
    }

    pub fn claimed_by(&self) -> Option<&str> {
        self.processor.as_ref().map(|p| p.name())
    }

    pub(crate) fn take_processor(&mut self) -> Option<Box<dyn Processor>> {
        let processor = self.processor.take()?;
        self.handled_by = Some(processor.name());
        Some(processor)
    }

    /// Name of the processor that ran (or was about to run) for this request.
    pub fn handled_by(&self) -> Option<&'static str> {
        self.handled_by.or_else(|| self.processor.as_ref().map(|p| p.name()))
    }

    /// Write an error as the response (`"<status> <message>"`, plain text).
    pub fn write_error(&mut self, err: &HttpError) {
        let status = err.status();
        self.response = ResponseState::default();
        self.response.write_head(status, Some("text/plain"));
        self.response
            .write(format!("{} {}\n", status.as_u16(), err.message()));
    }

    /// Finalize into a wire response. Consumes the context.
    pub fn into_response(self) -> Response<Body> {
        let ResponseState {
            status,
            headers,
            body,
            ..
        } = self.response;
        let body = if self.method == Method::HEAD {
            Body::empty()
        } else {
            Body::from(body)
        };
        let mut response = Response::new(body);
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

/// Decode each path segment and rejoin, dropping empty segments.
pub fn decode_path(raw: &str) -> String {
    let mut decoded = String::with_capacity(raw.len());
    for segment in raw.split('/').filter(|s| !s.is_empty()) {
        decoded.push('/');
        decoded.push_str(&String::from_utf8_lossy(&urlencoding::decode_binary(
            segment.as_bytes(),
        )));
    }
    if decoded.is_empty() || raw.ends_with('/') {
        decoded.push('/');
    }
    decoded
}

fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    let mut cookies = HashMap::new();
    for value in headers.get_all(header::COOKIE) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for cookie in value.split(';') {
            if let Some((name, value)) = cookie.trim().split_once('=') {
                let value = urlencoding::decode(value)
                    .map(|v| v.into_owned())
                    .unwrap_or_else(|_| value.to_string());
                cookies.insert(name.trim().to_string(), value);
            }
        }
    }
    cookies
}
