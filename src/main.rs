//! Instrumented demo server.
//!
//! Serves a few routes behind `HoneycombLayer` so every request produces one
//! Honeycomb event:
//!
//! ```text
//!   Client ──▶ TraceLayer ──▶ HoneycombLayer ──▶ handlers
//!                                  │
//!                                  └──▶ telemetry client (one per worker) ──▶ collector
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use axum::{extract::Path, http::StatusCode, routing::get, Router};
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use honeycomb_middleware::config::{load_config, AppConfig};
use honeycomb_middleware::observability::{logging, metrics};
use honeycomb_middleware::{HoneycombLayer, RequestContext};

#[derive(Parser)]
#[command(name = "honeycomb-middleware")]
#[command(about = "HTTP server that emits one Honeycomb event per request", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init_logging(&config.observability);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        honeycomb = ?config.honeycomb,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let app = router(HoneycombLayer::new(config.honeycomb.clone()));

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn router(honeycomb: HoneycombLayer) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/users/{id}", get(show_user))
        .route("/health", get(health))
        .layer(honeycomb)
        .layer(TraceLayer::new_for_http())
}

async fn index() -> &'static str {
    "Hello from an instrumented server\n"
}

/// Attaches the user id to the request's telemetry event.
async fn show_user(Path(id): Path<String>, ctx: RequestContext) -> String {
    ctx.add_metadata("user_id", id.as_str());
    format!("user {}\n", id)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
