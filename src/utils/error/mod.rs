//! Error handling utilities
//!
//! This module provides the crate-level error type and its result alias.

pub mod error;

// Re-export commonly used types
pub use error::*;
