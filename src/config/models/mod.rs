//! Configuration data models
//!
//! This module defines the configuration structures loaded once at startup.

pub mod logging;
pub mod provider;
pub mod router;

// Re-export all configuration types
pub use logging::*;
pub use provider::*;
pub use router::*;

/// Default fallback setting
pub fn default_fallback_enabled() -> bool {
    true
}

/// Default number of concurrent map calls
pub fn default_max_in_flight() -> usize {
    4
}

/// Default maximum retry attempts per backend call
pub fn default_num_retries() -> u32 {
    2
}

/// Default base delay between retries in milliseconds
pub fn default_retry_base_delay_ms() -> u64 {
    500
}

/// Default cap on the delay between retries in milliseconds
pub fn default_retry_max_delay_ms() -> u64 {
    30_000
}

/// Default log level
pub fn default_log_level() -> String {
    "info".to_string()
}

pub(crate) fn default_true() -> bool {
    true
}
