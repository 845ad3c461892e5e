//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging and metrics
//! - Build the application and bind the listener
//! - Start the config watcher when asked
//! - Serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listener binds last (traffic only when ready)

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::app::{ApplicationBuilder, BuildError};
use crate::config::{load_config, AppConfig, ConfigError, ConfigWatcher};
use crate::http::HttpServer;
use crate::lifecycle::Shutdown;
use crate::observability::{logging, metrics};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("application: {0}")]
    Build(#[from] BuildError),

    #[error("invalid metrics address `{0}`")]
    MetricsAddress(String),

    #[error("metrics exporter: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("config watcher: {0}")]
    Watch(#[from] notify::Error),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Command-line choices that shape startup.
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    /// TOML configuration; built-in defaults when absent.
    pub config_path: Option<PathBuf>,
    /// Reload the configuration file when it changes.
    pub watch: bool,
    /// Overrides `listener.bind_address`.
    pub bind_address: Option<String>,
}

/// Run the server until SIGINT or SIGTERM.
pub async fn run(builder: ApplicationBuilder, options: StartupOptions) -> Result<(), StartupError> {
    let mut config = match &options.config_path {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = &options.bind_address {
        config.listener.bind_address = bind.clone();
    }

    if let Err(err) = logging::init(&config.observability) {
        eprintln!("logging already initialized: {err}");
    }
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?options.config_path,
        "mvc-web starting"
    );

    if config.observability.metrics_enabled {
        let addr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(builder, config)?;

    let (config_updates, _watcher) = match (&options.config_path, options.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (updates, Some(watcher.run()?))
        }
        _ => {
            let (_, updates) = mpsc::unbounded_channel();
            (updates, None)
        }
    };

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();
    server.run(listener, config_updates, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
