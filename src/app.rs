//! The application handle.
//!
//! # Responsibilities
//! - Own everything a request needs: config, route table, handlers,
//!   controllers, model catalog, view engines, auth provider
//! - Turn one HTTP request into one response through the pipeline
//! - Run synthetic requests in-process
//!
//! # Data Flow
//! ```text
//! Request<Body>
//!     → buffer body (listener.max_body_size)
//!     → HttpContext::new(Arc<Application>, ...)
//!     → pipeline::run
//!     → Err? → error responder
//!     → metrics + completion log
//!     → HttpContext::into_response (consumes the context)
//! ```
//!
//! # Design Decisions
//! - Passed explicitly as `Arc<Application>`; there is no global instance
//! - Immutable once built; a config reload builds a new one
//! - The builder keeps code-registered parts (controllers, engines, custom
//!   handlers) so a reload can rebuild with the same registrations

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::{Body, Bytes};
use axum::http::{HeaderMap, Method, Request, Response, Uri};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use thiserror::Error;

use crate::config::{validate_config, AppConfig, MimeConfig, ValidationError};
use crate::handlers::{
    AuthProvider, BasicAuthHandler, ConfigAuthProvider, JsonHandler, MultipartHandler, PostHandler,
    QueryStringHandler, StaticHandler,
};
use crate::http::request::request_id_of;
use crate::http::response::respond_error;
use crate::http::{HttpContext, HttpError};
use crate::mvc::{Controller, ControllerRegistry, ModelCatalog, ViewHandler};
use crate::observability::metrics;
use crate::pipeline::{self, Handler, HandlerRegistry};
use crate::results::view::ViewEngine;
use crate::routing::{PatternError, RouteTable};

/// Error building an [`Application`] from configuration.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid configuration: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    Invalid(Vec<ValidationError>),

    #[error(transparent)]
    Route(#[from] PatternError),

    #[error("invalid restricted location: {0}")]
    RestrictedLocation(#[from] regex::Error),

    #[error("unknown handler `{0}` in handlers.order")]
    UnknownHandler(String),
}

/// Everything a request is processed against.
pub struct Application {
    config: AppConfig,
    root: PathBuf,
    routes: RouteTable,
    handlers: HandlerRegistry,
    controllers: ControllerRegistry,
    models: ModelCatalog,
    view_engines: Vec<Arc<dyn ViewEngine>>,
    auth_provider: Arc<dyn AuthProvider>,
    stage_deadline: Option<Duration>,
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Application")
            .field("root", &self.root)
            .field("routes", &self.routes.len())
            .field("handlers", &self.handlers)
            .field("controllers", &self.controllers)
            .field("view_engines", &self.view_engines.iter().map(|e| e.name()).collect::<Vec<_>>())
            .field("stage_deadline", &self.stage_deadline)
            .finish()
    }
}

impl Application {
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Directory holding static files and `views/`.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn handlers(&self) -> &HandlerRegistry {
        &self.handlers
    }

    pub fn controllers(&self) -> &ControllerRegistry {
        &self.controllers
    }

    pub fn models(&self) -> &ModelCatalog {
        &self.models
    }

    pub fn view_engines(&self) -> &[Arc<dyn ViewEngine>] {
        &self.view_engines
    }

    pub fn auth_provider(&self) -> &Arc<dyn AuthProvider> {
        &self.auth_provider
    }

    /// Watchdog applied to every stage, if enabled.
    pub fn stage_deadline(&self) -> Option<Duration> {
        self.stage_deadline
    }

    /// MIME registration for an extension such as `.css`.
    pub fn mime_for(&self, extension: &str) -> Option<&MimeConfig> {
        self.config
            .mimes
            .iter()
            .find(|m| m.extension.eq_ignore_ascii_case(extension))
    }

    /// Process one request. Always produces exactly one response.
    pub async fn process(self: &Arc<Self>, request: Request<Body>) -> Response<Body> {
        let start = Instant::now();
        let (parts, body) = request.into_parts();
        let request_id = request_id_of(&parts.headers);

        let (body, read_error) = match read_body(body, self.config.listener.max_body_size).await {
            Ok(bytes) => (bytes, None),
            Err(err) => (Bytes::new(), Some(err)),
        };

        let mut ctx = HttpContext::new(
            self.clone(),
            request_id,
            parts.method,
            parts.uri,
            parts.headers,
            body,
        );

        let outcome = match read_error {
            Some(err) => {
                tracing::debug!(request_id = %ctx.request_id, error = %err, "Request body rejected");
                Err(err)
            }
            None => pipeline::run(&mut ctx).await,
        };

        Self::finish(ctx, outcome, start)
    }

    /// Run a synthetic request in-process. `uri` must be a local path.
    pub async fn execute_request(
        self: &Arc<Self>,
        method: Method,
        uri: &str,
        headers: HeaderMap,
        body: impl Into<Bytes>,
    ) -> Result<Response<Body>, HttpError> {
        if !uri.starts_with('/') {
            return Err(HttpError::BadRequest(
                "Internal request url must be a local path.".into(),
            ));
        }
        let uri: Uri = uri
            .parse()
            .map_err(|_| HttpError::BadRequest("Internal request url is invalid.".into()))?;

        let mut request = Request::new(Body::from(body.into()));
        *request.method_mut() = method;
        *request.uri_mut() = uri;
        *request.headers_mut() = headers;
        Ok(self.process(request).await)
    }

    fn finish(mut ctx: HttpContext, outcome: Result<(), HttpError>, start: Instant) -> Response<Body> {
        if let Err(err) = &outcome {
            respond_error(&mut ctx, err);
        }

        let status = ctx.response.status.as_u16();
        let handler = ctx.handled_by().unwrap_or("none");
        metrics::record_request(ctx.method().as_str(), status, handler, start);
        tracing::info!(
            request_id = %ctx.request_id,
            method = %ctx.method(),
            path = %ctx.path(),
            status,
            handler,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Request completed"
        );

        ctx.into_response()
    }
}

/// Buffer a request body of at most `limit` bytes.
async fn read_body(body: Body, limit: usize) -> Result<Bytes, HttpError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(err) if exceeds_limit(&*err) => Err(HttpError::payload_too_large()),
        Err(_) => Err(HttpError::BadRequest("Request body could not be read.".into())),
    }
}

/// Whether a body error (or anything it wraps) is a length-limit error,
/// including one raised by the server's body limit layer.
fn exceeds_limit(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(err) = current {
        if err.is::<LengthLimitError>() {
            return true;
        }
        current = err.source();
    }
    false
}

/// Collects code-registered parts; [`ApplicationBuilder::build`] combines
/// them with a configuration.
#[derive(Clone, Default)]
pub struct ApplicationBuilder {
    controllers: ControllerRegistry,
    view_engines: Vec<Arc<dyn ViewEngine>>,
    auth_provider: Option<Arc<dyn AuthProvider>>,
    handlers: Vec<Arc<dyn Handler>>,
}

impl ApplicationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller factory under `name`.
    pub fn controller<F>(mut self, name: &str, factory: F) -> Self
    where
        F: Fn() -> Controller + Send + Sync + 'static,
    {
        self.controllers.register(name, factory);
        self
    }

    /// Add a view engine. Engines are tried in the order they are added.
    pub fn view_engine(mut self, engine: impl ViewEngine + 'static) -> Self {
        self.view_engines.push(Arc::new(engine));
        self
    }

    /// Replace the credential check used by the `basic-auth` handler.
    pub fn auth_provider(mut self, provider: impl AuthProvider + 'static) -> Self {
        self.auth_provider = Some(Arc::new(provider));
        self
    }

    /// Add a custom handler. It runs at its position in `handlers.order`
    /// when listed there (replacing a built-in of the same name), otherwise
    /// after every configured handler.
    pub fn handler(mut self, handler: impl Handler + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    pub fn build(self, config: AppConfig) -> Result<Arc<Application>, BuildError> {
        validate_config(&config).map_err(BuildError::Invalid)?;

        let root = PathBuf::from(&config.settings.root);
        let routes = RouteTable::from_config(&config.routes)?;
        let auth_provider = self
            .auth_provider
            .unwrap_or_else(|| Arc::new(ConfigAuthProvider::from_config(&config.settings.auth)));

        let mut registry = HandlerRegistry::new();
        let mut placed = vec![false; self.handlers.len()];
        for name in &config.handlers.order {
            let custom = self.handlers.iter().position(|h| h.name() == name);
            let handler: Arc<dyn Handler> = match (custom, name.as_str()) {
                (Some(index), _) => {
                    placed[index] = true;
                    self.handlers[index].clone()
                }
                (None, "query") => Arc::new(QueryStringHandler),
                (None, "basic-auth") => Arc::new(BasicAuthHandler::new(auth_provider.clone())),
                (None, "static") => Arc::new(StaticHandler::new(root.clone())),
                (None, "mvc") => Arc::new(ViewHandler::new(&config.settings.restricted_locations)?),
                (None, "multipart") => Arc::new(MultipartHandler),
                (None, "json") => Arc::new(JsonHandler),
                (None, "post") => Arc::new(PostHandler),
                (None, other) => return Err(BuildError::UnknownHandler(other.to_string())),
            };
            registry.register(handler);
        }
        for (handler, placed) in self.handlers.iter().zip(placed) {
            if !placed {
                registry.register(handler.clone());
            }
        }

        let stage_deadline = match config.settings.stage_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };

        tracing::info!(
            routes = routes.len(),
            handlers = ?registry.names(),
            controllers = self.controllers.len(),
            view_engines = self.view_engines.len(),
            root = %root.display(),
            "Application built"
        );

        Ok(Arc::new(Application {
            models: ModelCatalog::from_config(&config.models),
            config,
            root,
            routes,
            handlers: registry,
            controllers: self.controllers,
            view_engines: self.view_engines,
            auth_provider,
            stage_deadline,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RouteConfig;
    use axum::http::StatusCode;

    #[test]
    fn test_default_handler_order() {
        let app = Application::builder().build(AppConfig::default()).unwrap();
        assert_eq!(
            app.handlers().names(),
            vec!["query", "basic-auth", "static", "mvc", "multipart", "json", "post"]
        );
        assert_eq!(app.stage_deadline(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_unknown_handler_is_rejected() {
        let mut config = AppConfig::default();
        config.handlers.order = vec!["query".into(), "directives".into()];
        assert!(matches!(
            Application::builder().build(config),
            Err(BuildError::UnknownHandler(name)) if name == "directives"
        ));
    }

    #[test]
    fn test_invalid_routes_fail_the_build() {
        let mut config = AppConfig::default();
        config.routes.push(RouteConfig::new(""));
        assert!(matches!(Application::builder().build(config), Err(BuildError::Invalid(_))));
    }

    #[tokio::test]
    async fn test_oversized_body_is_payload_too_large() {
        let mut config = AppConfig::default();
        config.listener.max_body_size = 16;
        let app = Application::builder().build(config).unwrap();

        let chunks = (0..4).map(|_| Ok::<_, std::io::Error>(Bytes::from_static(b"0123456789")));
        let request = Request::builder()
            .method(Method::POST)
            .uri("/upload")
            .body(Body::from_stream(futures_util::stream::iter(chunks)))
            .unwrap();
        let response = app.process(request).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let response = app
            .execute_request(Method::POST, "/upload", HeaderMap::new(), vec![b'x'; 64])
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_mime_lookup_ignores_case() {
        let app = Application::builder().build(AppConfig::default()).unwrap();
        assert_eq!(app.mime_for(".CSS").map(|m| m.mime_type.as_str()), Some("text/css"));
        assert!(app.mime_for(".exe").is_none());
    }
}
