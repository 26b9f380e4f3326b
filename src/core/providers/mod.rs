//! Backend invocation seam
//!
//! This module holds the [`Invoker`] trait the request layer calls through and
//! the unified [`ProviderError`] every invoker reports.

pub mod invoker;
pub mod unified_provider;

// Export main types
pub use invoker::{InvokeOptions, InvokeOutput, Invoker};
pub use unified_provider::ProviderError;
