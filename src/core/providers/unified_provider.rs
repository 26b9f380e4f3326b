//! Unified Provider Error Handling
//!
//! Single error type for every failure an [`Invoker`](super::Invoker) can report.
//! The request layer passes these through unchanged; it only looks at
//! [`ProviderError::is_retryable`] for per-call retries and at
//! [`ProviderError::ContextLengthExceeded`] to trigger fallback when the backend
//! counted more tokens than the estimator did.
//!
//! | Variant | Purpose | Retryable |
//! |------|------|--------|
//! | Authentication | Credentials rejected | No |
//! | RateLimit | Rate limit exceeded | Yes (after delay) |
//! | ModelNotFound | Model not found | No |
//! | InvalidRequest | Invalid request | No |
//! | Network | Transport failure | Yes |
//! | ProviderUnavailable | Backend down | Yes |
//! | Timeout | Call timed out | Yes |
//! | ContextLengthExceeded | Backend rejected prompt size | No (falls back instead) |
//! | ContentFiltered | Safety filter | No |
//! | ApiError | Status-coded error | 429 and 5xx |
//! | ResponseParsing | Unreadable response | No |
//! | Cancelled | Call cancelled | No |
//! | Other | Anything else | No |
//!
//! ## Usage
//!
//! ```rust
//! use ctxgate::ProviderError;
//!
//! let err = ProviderError::rate_limit("gpt-4", Some(2));
//! assert!(err.is_retryable());
//! assert_eq!(err.retry_delay(), Some(2));
//! ```

/// Unified provider error type
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    #[error("Authentication failed for {provider}: {message}")]
    Authentication { provider: String, message: String },

    #[error("Rate limit exceeded for {provider}: {message}")]
    RateLimit {
        provider: String,
        message: String,
        /// Seconds the backend asked us to wait
        retry_after: Option<u64>,
    },

    #[error("Model '{model}' not found for {provider}")]
    ModelNotFound { provider: String, model: String },

    #[error("Invalid request for {provider}: {message}")]
    InvalidRequest { provider: String, message: String },

    #[error("Network error for {provider}: {message}")]
    Network { provider: String, message: String },

    #[error("Provider {provider} is unavailable: {message}")]
    ProviderUnavailable { provider: String, message: String },

    #[error("Timeout for {provider}: {message}")]
    Timeout { provider: String, message: String },

    /// Context length exceeded as reported by the backend itself
    #[error("Context length exceeded for {provider}: max {max} tokens, got {actual} tokens")]
    ContextLengthExceeded {
        provider: String,
        max: usize,
        actual: usize,
    },

    /// Content filtered by safety systems
    #[error("Content filtered by {provider} safety systems: {reason}")]
    ContentFiltered { provider: String, reason: String },

    /// API error with status code
    #[error("API error for {provider} (status {status}): {message}")]
    ApiError {
        provider: String,
        status: u16,
        message: String,
    },

    #[error("Failed to parse {provider} response: {message}")]
    ResponseParsing { provider: String, message: String },

    #[error("Operation cancelled for {provider}: {message}")]
    Cancelled { provider: String, message: String },

    #[error("{provider} error: {message}")]
    Other { provider: String, message: String },
}

impl ProviderError {
    /// Create authentication error
    pub fn authentication(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Authentication {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create rate limit error
    pub fn rate_limit(provider: impl Into<String>, retry_after: Option<u64>) -> Self {
        Self::RateLimit {
            provider: provider.into(),
            message: match retry_after {
                Some(seconds) => format!("Rate limit exceeded. Retry after {} seconds", seconds),
                None => "Rate limit exceeded".to_string(),
            },
            retry_after,
        }
    }

    /// Create model not found error
    pub fn model_not_found(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self::ModelNotFound {
            provider: provider.into(),
            model: model.into(),
        }
    }

    /// Create invalid request error
    pub fn invalid_request(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create network error
    pub fn network(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create provider unavailable error
    pub fn provider_unavailable(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ProviderUnavailable {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create timeout error
    pub fn timeout(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Timeout {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create context length exceeded error with structured data
    pub fn context_length_exceeded(provider: impl Into<String>, max: usize, actual: usize) -> Self {
        Self::ContextLengthExceeded {
            provider: provider.into(),
            max,
            actual,
        }
    }

    /// Create content filtered error
    pub fn content_filtered(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ContentFiltered {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Create API error with status code
    pub fn api_error(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    /// Create response parsing error
    pub fn response_parsing(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ResponseParsing {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create cancellation error
    pub fn cancelled(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Cancelled {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create other/generic error
    pub fn other(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Other {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Get the provider name that caused this error
    pub fn provider(&self) -> &str {
        match self {
            Self::Authentication { provider, .. }
            | Self::RateLimit { provider, .. }
            | Self::ModelNotFound { provider, .. }
            | Self::InvalidRequest { provider, .. }
            | Self::Network { provider, .. }
            | Self::ProviderUnavailable { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::ContextLengthExceeded { provider, .. }
            | Self::ContentFiltered { provider, .. }
            | Self::ApiError { provider, .. }
            | Self::ResponseParsing { provider, .. }
            | Self::Cancelled { provider, .. }
            | Self::Other { provider, .. } => provider,
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. }
            | Self::Timeout { .. }
            | Self::RateLimit { .. }
            | Self::ProviderUnavailable { .. } => true,

            // API errors depend on status code
            Self::ApiError { status, .. } => matches!(*status, 429 | 500..=599),

            Self::Authentication { .. }
            | Self::ModelNotFound { .. }
            | Self::InvalidRequest { .. }
            | Self::ContextLengthExceeded { .. }
            | Self::ContentFiltered { .. }
            | Self::ResponseParsing { .. }
            | Self::Cancelled { .. }
            | Self::Other { .. } => false,
        }
    }

    /// Get the backend-requested retry delay in seconds
    pub fn retry_delay(&self) -> Option<u64> {
        match self {
            Self::RateLimit { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        Self::response_parsing("unknown", err.to_string())
    }
}
