//! Per-request Honeycomb instrumentation for tower and axum services.
//!
//! ```no_run
//! use axum::{routing::get, Router};
//! use honeycomb_middleware::{HoneycombLayer, InstrumentorConfig, RequestContext};
//!
//! async fn show_user(ctx: RequestContext) -> &'static str {
//!     ctx.add_metadata("user_id", "abc");
//!     "ok"
//! }
//!
//! let app: Router = Router::new()
//!     .route("/me", get(show_user))
//!     .layer(HoneycombLayer::new(InstrumentorConfig {
//!         writekey: Some("key".into()),
//!         dataset: Some("requests".into()),
//!         ..Default::default()
//!     }));
//! ```

pub mod config;
pub mod http;
pub mod observability;
pub mod telemetry;

pub use config::{AppConfig, InstrumentorConfig};
pub use http::{Honeycomb, HoneycombLayer, RequestContext, METADATA_PREFIX};
pub use telemetry::{Client, ClientOptions, Event, FieldValue, TelemetryError};
