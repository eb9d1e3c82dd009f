//! Event delivery.
//!
//! # Responsibilities
//! - Serialize event fields as a JSON object
//! - POST to `{api_host}/1/events/{dataset}` with the writekey header
//! - Keep the request path non-blocking (delivery runs on a spawned task)
//!
//! # Design Decisions
//! - One request per event; batching and retries belong to a real collector client
//! - Missing credentials fail at submission, before anything is spawned

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use url::Url;

use crate::observability::metrics;
use crate::telemetry::client::ClientOptions;
use crate::telemetry::event::EventPayload;
use crate::telemetry::TelemetryError;

/// Header carrying the writekey.
pub const TEAM_HEADER: &str = "X-Honeycomb-Team";

/// Header carrying the event creation time (RFC 3339).
pub const EVENT_TIME_HEADER: &str = "X-Honeycomb-Event-Time";

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Destination for sent events.
pub trait Transmission: Send + Sync + 'static {
    /// Accept one event for delivery. Returning `Ok` does not imply it was delivered.
    fn transmit(&self, event: EventPayload) -> Result<(), TelemetryError>;
}

/// Delivers each event with its own HTTP request.
#[derive(Debug, Clone)]
pub struct HttpTransmission {
    http: reqwest::Client,
    api_host: Url,
    writekey: Option<String>,
}

impl HttpTransmission {
    pub fn new(options: &ClientOptions) -> Result<Self, TelemetryError> {
        let api_host = Url::parse(options.api_host())
            .map_err(|_| TelemetryError::InvalidApiHost(options.api_host().to_string()))?;
        if api_host.cannot_be_a_base() {
            return Err(TelemetryError::InvalidApiHost(api_host.to_string()));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(DELIVERY_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_host,
            writekey: options.writekey.clone(),
        })
    }

    /// Events endpoint for a dataset. The dataset is percent-encoded as one path segment.
    pub fn events_url(&self, dataset: &str) -> Result<Url, TelemetryError> {
        let mut url = self.api_host.clone();
        url.path_segments_mut()
            .map_err(|_| TelemetryError::InvalidApiHost(self.api_host.to_string()))?
            .pop_if_empty()
            .extend(["1", "events", dataset]);
        Ok(url)
    }
}

impl Transmission for HttpTransmission {
    fn transmit(&self, event: EventPayload) -> Result<(), TelemetryError> {
        let writekey = self
            .writekey
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(TelemetryError::MissingWritekey)?;
        let dataset = event
            .dataset
            .as_deref()
            .filter(|d| !d.is_empty())
            .ok_or(TelemetryError::MissingDataset)?;
        let url = self.events_url(dataset)?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| TelemetryError::NoRuntime)?;

        let request = self
            .http
            .post(url)
            .header(TEAM_HEADER, writekey)
            .header(EVENT_TIME_HEADER, event.created_at.to_rfc3339())
            .json(&event.fields);

        runtime.spawn(async move {
            match request.send().await.and_then(|res| res.error_for_status()) {
                Ok(res) => {
                    metrics::record_delivery(true);
                    tracing::trace!(status = %res.status(), "Event delivered");
                }
                Err(e) => {
                    metrics::record_delivery(false);
                    tracing::warn!(error = %e, "Event delivery failed");
                }
            }
        });

        Ok(())
    }
}

/// Keeps sent events in memory. Useful for tests and local inspection.
#[derive(Debug, Default)]
pub struct MemoryTransmission {
    events: Mutex<Vec<EventPayload>>,
}

impl MemoryTransmission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every event received so far.
    pub fn events(&self) -> Vec<EventPayload> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Transmission for MemoryTransmission {
    fn transmit(&self, event: EventPayload) -> Result<(), TelemetryError> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
        Ok(())
    }
}
