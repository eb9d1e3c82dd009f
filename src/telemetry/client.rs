//! Telemetry client.

use std::fmt;
use std::sync::Arc;

use crate::config::InstrumentorConfig;
use crate::telemetry::event::Event;
use crate::telemetry::transmission::{HttpTransmission, Transmission};
use crate::telemetry::TelemetryError;

/// Collector endpoint used when no `api_host` is configured.
pub const DEFAULT_API_HOST: &str = "https://api.honeycomb.io/";

/// Credentials and destination for a client.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ClientOptions {
    pub writekey: Option<String>,
    pub dataset: Option<String>,
    pub api_host: Option<String>,
}

impl ClientOptions {
    /// The configured api host, or [`DEFAULT_API_HOST`].
    pub fn api_host(&self) -> &str {
        self.api_host.as_deref().unwrap_or(DEFAULT_API_HOST)
    }
}

impl From<&InstrumentorConfig> for ClientOptions {
    fn from(config: &InstrumentorConfig) -> Self {
        Self {
            writekey: config.writekey.clone(),
            dataset: config.dataset.clone(),
            api_host: config.api_host.clone(),
        }
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("writekey", &self.writekey.as_ref().map(|_| "<redacted>"))
            .field("dataset", &self.dataset)
            .field("api_host", &self.api_host)
            .finish()
    }
}

/// Creates events bound to one transmission.
pub struct Client {
    options: ClientOptions,
    transmission: Arc<dyn Transmission>,
}

impl Client {
    /// Create a client that delivers events over HTTP.
    ///
    /// Only builds the HTTP client; no connection is opened until an event is sent.
    pub fn new(options: ClientOptions) -> Result<Self, TelemetryError> {
        let transmission = HttpTransmission::new(&options)?;
        Ok(Self::with_transmission(options, Arc::new(transmission)))
    }

    /// Create a client on top of a custom transmission.
    pub fn with_transmission(options: ClientOptions, transmission: Arc<dyn Transmission>) -> Self {
        Self {
            options,
            transmission,
        }
    }

    /// Start a new, empty event for the configured dataset.
    pub fn new_event(&self) -> Event {
        Event::new(self.options.dataset.clone(), self.transmission.clone())
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
