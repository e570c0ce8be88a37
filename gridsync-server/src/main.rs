//! gridsync action server
//!
//! Serves the table reconciliation actions over HTTP:
//!   POST /api/v1/actions   {"action": "upsert-rows-by-key", ...}
//!   GET  /api/v1/actions   registered action names
//!   GET  /api/v1/health
//!
//! Usage:
//!   gridsync-server --config gridsync.json --port 8080

use anyhow::{Context, Result};
use clap::Parser;
use gridsync_server::{build_router, AppState, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gridsync-server")]
#[command(about = "Spreadsheet table synchronization server")]
struct Args {
    /// Path to a JSON config file
    #[arg(short, long, env = "GRIDSYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Interface to bind
    #[arg(long, env = "GRIDSYNC_HOST")]
    host: Option<String>,

    /// HTTP port
    #[arg(short, long, env = "GRIDSYNC_PORT")]
    port: Option<u16>,

    /// Stored OAuth credential file
    #[arg(long, env = "GRIDSYNC_CREDENTIALS")]
    credentials: Option<PathBuf>,

    /// OAuth2 client ID
    #[arg(long, env = "GRIDSYNC_CLIENT_ID")]
    client_id: Option<String>,

    /// OAuth2 client secret
    #[arg(long, env = "GRIDSYNC_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::from_file(path)?,
            None => ServerConfig::default(),
        };
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(credentials) = self.credentials {
            config.credentials_path = credentials;
        }
        if let Some(client_id) = self.client_id {
            config.graph.client_id = client_id;
        }
        if let Some(client_secret) = self.client_secret {
            config.graph.client_secret = client_secret;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    let config = args.into_config()?;
    info!(
        api = %config.graph.api_base_url,
        credentials = %config.credentials_path.display(),
        "gridsync server starting"
    );

    let state = AppState::from_config(&config).context("Failed to initialize workbook client")?;
    let app = build_router(Arc::new(state));

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Listening on {}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("gridsync server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}
