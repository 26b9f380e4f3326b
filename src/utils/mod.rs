//! Utility modules
//!
//! ## Module Organization
//!
//! - **ai**: Token estimation for context-window checks and chunking
//! - **error**: Crate error type and result alias
//! - **logging**: Tracing subscriber setup

pub mod ai;
pub mod error;
pub mod logging;

pub use ai::{TokenCounter, TokenEstimator};
pub use error::{GatewayError, Result};
pub use logging::init_tracing;
