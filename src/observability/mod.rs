//! Observability of the middleware itself.
//!
//! # Data Flow
//! ```text
//! Middleware and transmission produce:
//!     → logging.rs (tracing events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (plain or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
