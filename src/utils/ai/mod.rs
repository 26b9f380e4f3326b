//! AI and Model utilities
//!
//! This module provides token estimation for context-window checks.

pub mod counter;

// Re-export commonly used types and functions
pub use counter::{ModelTokenConfig, PerCharEstimator, TokenCounter, TokenEstimator};
