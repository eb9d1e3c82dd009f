//! HTTP request instrumentation subsystem.
//!
//! # Data Flow
//! ```text
//! Request
//!     → middleware/instrument.rs (HoneycombLayer, times the inner service)
//!     → context.rs (RequestContext in the request extensions)
//!     → [application handlers, may attach honeycomb.* metadata]
//!     → fields.rs (response, timing, metadata and request attributes)
//!     → telemetry::Event::send
//! ```

pub mod context;
pub mod fields;
pub mod middleware;

pub use context::{RequestContext, METADATA_PREFIX};
pub use middleware::{Honeycomb, HoneycombLayer};
