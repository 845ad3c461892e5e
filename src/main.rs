//! mvc-web server.
//!
//! Serves static files and views from `settings.root` and dispatches routed
//! requests through the lifecycle pipeline. Controllers are registered by
//! applications embedding the library; this binary runs with the base
//! controller only.

use std::path::PathBuf;

use clap::Parser;
use mvc_web::lifecycle::{self, StartupOptions};
use mvc_web::ApplicationBuilder;

#[derive(Debug, Parser)]
#[command(name = "mvc-web", version, about = "MVC web application server")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reload the configuration file when it changes
    #[arg(short, long, requires = "config")]
    watch: bool,

    /// Override listener.bind_address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let options = StartupOptions {
        config_path: cli.config,
        watch: cli.watch,
        bind_address: cli.bind,
    };
    lifecycle::run(ApplicationBuilder::new(), options).await?;
    Ok(())
}
