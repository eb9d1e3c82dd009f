//! Tower middleware.

pub mod instrument;

pub use instrument::{Honeycomb, HoneycombLayer};
