//! Logging utilities
//!
//! Installs the `tracing` subscriber used by the request layer's spans and
//! events.

pub mod logging;

pub use logging::init_tracing;
