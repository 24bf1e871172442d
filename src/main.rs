mod config;
mod env;
mod envelope;
mod error;
mod relay;
mod routes;
mod upstream;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use crate::env::SystemEnv;
use crate::relay::TokenRelay;
use crate::routes::AppState;
use crate::upstream::HttpTokenFetcher;

/// Access token relay — fetches an access token from the upstream token API
/// on every GET and returns it wrapped in a JSON envelope.
#[derive(Parser, Debug)]
#[command(name = "access-token-relay", version, about)]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind (overrides config file)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides config file)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut cfg = match config::load_config(cli.config.as_deref(), &SystemEnv) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    // CLI flags override config
    if let Some(host) = cli.host {
        cfg.server.host = host;
    }
    if let Some(port) = cli.port {
        cfg.server.port = port;
    }

    tracing::info!(
        route = %cfg.server.route,
        upstream = %cfg.upstream.base_url,
        timeout_secs = ?cfg.upstream.timeout_secs,
        appid_env = %cfg.credentials.appid_env,
        secret_env = %cfg.credentials.secret_env,
        "Configuration loaded successfully"
    );

    let fetcher = match HttpTokenFetcher::new(&cfg.upstream.base_url, cfg.upstream.timeout()) {
        Ok(f) => f,
        Err(e) => {
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };

    let relay = TokenRelay::new(
        Arc::new(SystemEnv),
        Arc::new(fetcher),
        cfg.credentials.clone(),
    );
    let app = routes::router(&cfg.server.route, AppState { relay });

    let bind_addr = format!("{}:{}", cfg.server.host, cfg.server.port);
    tracing::info!("Listening on {bind_addr}");

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind to {bind_addr}: {e}");
            std::process::exit(1);
        });

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    });
}
