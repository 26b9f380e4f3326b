//! Invoker trait definition
//!
//! An [`Invoker`] performs the actual backend call. The request layer never
//! talks to a network client directly; it validates, picks a provider, and then
//! hands the final prompt to the invoker.

use super::unified_provider::ProviderError;
use crate::core::types::{ResponseFormat, TokenUsage};
use async_trait::async_trait;
use serde_json::Value;

/// Options for one backend call, resolved by the router
#[derive(Debug, Clone, PartialEq)]
pub struct InvokeOptions {
    /// Catalog id of the provider serving this call
    pub provider: String,
    /// Output token cap sent to the backend; `None` leaves the backend default
    pub max_output_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub response_format: ResponseFormat,
}

/// Result of one backend call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvokeOutput {
    pub text: String,
    /// Structured payload, when the backend produced one
    pub structured: Option<Value>,
    pub usage: TokenUsage,
}

impl InvokeOutput {
    pub fn new(text: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            text: text.into(),
            structured: None,
            usage,
        }
    }

    pub fn with_structured(mut self, structured: Value) -> Self {
        self.structured = Some(structured);
        self
    }
}

/// Performs backend calls
///
/// Implementations own transport, authentication and request shaping. Errors
/// are reported as [`ProviderError`] and passed through unchanged.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use ctxgate::{InvokeOptions, InvokeOutput, Invoker, ProviderError, TokenUsage};
///
/// struct Echo;
///
/// #[async_trait]
/// impl Invoker for Echo {
///     async fn invoke(
///         &self,
///         prompt: &str,
///         _options: &InvokeOptions,
///     ) -> Result<InvokeOutput, ProviderError> {
///         Ok(InvokeOutput::new(prompt, TokenUsage::new(1, 1)))
///     }
/// }
/// ```
#[async_trait]
pub trait Invoker: Send + Sync {
    /// Send `prompt` to the backend named in `options`
    async fn invoke(
        &self,
        prompt: &str,
        options: &InvokeOptions,
    ) -> Result<InvokeOutput, ProviderError>;
}
