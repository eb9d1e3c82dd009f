//! Telemetry client subsystem.
//!
//! # Data Flow
//! ```text
//! ClientRegistry (one Client per worker thread)
//!     → client.rs (Client::new_event)
//!     → event.rs (add_field / add_fields, then send)
//!     → transmission.rs (HttpTransmission POSTs the fields as JSON)
//!     → collector
//! ```
//!
//! # Design Decisions
//! - Clients are created lazily and never per request
//! - The registry is owned by the middleware instance, not a process global
//! - Delivery is fire-and-forget; no batching or retries here

pub mod client;
pub mod event;
pub mod registry;
pub mod transmission;

pub use client::{Client, ClientOptions, DEFAULT_API_HOST};
pub use event::{Event, EventPayload, FieldValue};
pub use registry::{ClientBuilder, ClientRegistry};
pub use transmission::{HttpTransmission, MemoryTransmission, Transmission};

/// Errors raised while creating clients or submitting events.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("writekey is not configured")]
    MissingWritekey,

    #[error("dataset is not configured")]
    MissingDataset,

    #[error("invalid api host `{0}`")]
    InvalidApiHost(String),

    #[error("no tokio runtime available to deliver the event")]
    NoRuntime,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}
