//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router that sends every path to the application
//! - Wire up middleware (request ID, tracing, body limit, timeout)
//! - Swap in a rebuilt application when the configuration changes
//! - Serve until the shutdown signal fires, then drain
//!
//! # Design Decisions
//! - One catch-all route: routing belongs to the lifecycle pipeline, not Axum
//! - The live application sits behind `ArcSwap`; in-flight requests keep the
//!   `Arc` they loaded, new requests see the replacement
//! - A configuration that fails to build is logged and ignored; the previous
//!   application keeps serving

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{Request, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::app::{Application, ApplicationBuilder, BuildError};
use crate::config::AppConfig;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};

type SharedApplication = Arc<ArcSwap<Application>>;

/// HTTP front end for an [`Application`].
pub struct HttpServer {
    builder: ApplicationBuilder,
    application: SharedApplication,
    router: Router,
}

impl HttpServer {
    /// Build the application from `config` and prepare the router.
    pub fn new(builder: ApplicationBuilder, config: AppConfig) -> Result<Self, BuildError> {
        let listener = config.listener.clone();
        let application = Arc::new(ArcSwap::new(builder.clone().build(config)?));
        let router = Self::build_router(
            application.clone(),
            listener.max_body_size,
            Duration::from_secs(listener.request_timeout_secs),
        );
        Ok(Self {
            builder,
            application,
            router,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(application: SharedApplication, max_body_size: usize, timeout: Duration) -> Router {
        Router::new()
            .route("/", any(dispatch))
            .route("/{*path}", any(dispatch))
            .with_state(application)
            .layer(
                ServiceBuilder::new()
                    .layer(set_request_id_layer())
                    .layer(TraceLayer::new_for_http())
                    .layer(propagate_request_id_layer())
                    .layer(RequestBodyLimitLayer::new(max_body_size))
                    .layer(TimeoutLayer::new(timeout)),
            )
    }

    /// The application currently serving requests.
    pub fn application(&self) -> Arc<Application> {
        self.application.load_full()
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configurations arriving on `config_updates` replace the application;
    /// the listener settings of the first configuration stay in effect.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<AppConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let builder = self.builder;
        let application = self.application.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                match builder.clone().build(config) {
                    Ok(next) => {
                        application.store(next);
                        tracing::info!("Configuration reloaded");
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "Reloaded configuration rejected; keeping previous");
                    }
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

async fn dispatch(State(application): State<SharedApplication>, request: Request<Body>) -> Response<Body> {
    application.load_full().process(request).await
}
