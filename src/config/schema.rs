//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.
//! Every field has a default so an empty file is a valid configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Root configuration for the instrumented server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Telemetry middleware settings.
    pub honeycomb: InstrumentorConfig,

    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Options recognized by the request instrumentor.
///
/// Unset values fall back to the telemetry client's defaults.
#[derive(Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct InstrumentorConfig {
    /// Credential for the telemetry backend.
    pub writekey: Option<String>,

    /// Logical destination for events.
    pub dataset: Option<String>,

    /// Collector endpoint override.
    pub api_host: Option<String>,

    /// Send a partial event (with an `error` field) when the wrapped
    /// service fails. Off by default: failed requests produce no event.
    pub emit_on_error: bool,
}

impl fmt::Debug for InstrumentorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstrumentorConfig")
            .field("writekey", &self.writekey.as_ref().map(|_| "<redacted>"))
            .field("dataset", &self.dataset)
            .field("api_host", &self.api_host)
            .field("emit_on_error", &self.emit_on_error)
            .finish()
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive (e.g. "info", "honeycomb_middleware=debug").
    pub log_level: String,

    /// Emit logs as JSON lines.
    pub json_logs: bool,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
