//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber for the server binary
//! - Pick plain or JSON output
//!
//! # Design Decisions
//! - `RUST_LOG` overrides the configured level when set
//! - The middleware only emits `tracing` events; installing a subscriber
//!   is left to the embedding application

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install the global tracing subscriber.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=debug", config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_logs {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
