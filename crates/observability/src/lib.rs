//! `tindahan-observability` — logging bootstrap for embedding processes.

pub mod tracing;

pub use tracing::{init, init_with_filter};
