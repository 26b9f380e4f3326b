//! Token estimation utilities
//!
//! This module provides the [`TokenEstimator`] contract and the ratio-based
//! [`TokenCounter`] used by default.

pub mod token_counter;
pub mod types;

pub use token_counter::{PerCharEstimator, TokenCounter, TokenEstimator};
pub use types::ModelTokenConfig;
