//! Error handling for the request layer
//!
//! This module defines the crate-level error type. Backend failures keep their
//! [`ProviderError`] shape and are only wrapped with phase context when they
//! happen inside a chunked run.

use crate::core::chunking::ChunkingError;
use crate::core::providers::unified_provider::ProviderError;
use crate::core::types::Phase;
use thiserror::Error;

/// Result type alias for the request layer
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Main error type for the request layer
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The prompt plus its output reservation does not fit any reachable provider
    #[error(
        "Context window exceeded on {provider}: prompt is {prompt_tokens} tokens, input budget is {max_tokens} (attempted {attempted:?})"
    )]
    ContextWindowExceeded {
        /// Estimated prompt tokens on the last provider checked
        prompt_tokens: u32,
        /// Input budget of the last provider checked
        max_tokens: u32,
        /// Last provider checked
        provider: String,
        /// Every provider checked, in order
        attempted: Vec<String>,
    },

    /// A map or refinement call failed for one chunk
    #[error("{phase} call failed for chunk {ordinal} of {total}: {source}")]
    ChunkProcessing {
        phase: Phase,
        /// Zero-based chunk ordinal
        ordinal: usize,
        total: usize,
        source: Box<GatewayError>,
    },

    /// The combining call failed after every map output was collected
    #[error("Reduce call over {chunks} chunk outputs failed: {source}")]
    Reduce {
        chunks: usize,
        source: Box<GatewayError>,
    },

    /// Pass-through backend failure
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The fallback graph revisited a provider
    #[error("Fallback cycle detected: {}", chain.join(" -> "))]
    FallbackCycle { chain: Vec<String> },

    /// Provider id or alias is not in the catalog
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    /// Chunker rejected the text or configuration
    #[error("Chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    /// Malformed request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The whole operation ran past its deadline
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// The whole operation was cancelled by the caller
    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GatewayError {
    /// Create a context window error
    pub fn context_window_exceeded(
        prompt_tokens: u32,
        max_tokens: u32,
        provider: impl Into<String>,
        attempted: Vec<String>,
    ) -> Self {
        Self::ContextWindowExceeded {
            prompt_tokens,
            max_tokens,
            provider: provider.into(),
            attempted,
        }
    }

    /// Wrap an error raised while processing one chunk
    pub fn chunk_processing(
        phase: Phase,
        ordinal: usize,
        total: usize,
        source: GatewayError,
    ) -> Self {
        Self::ChunkProcessing {
            phase,
            ordinal,
            total,
            source: Box::new(source),
        }
    }

    /// Wrap an error raised by the reduce call
    pub fn reduce(chunks: usize, source: GatewayError) -> Self {
        Self::Reduce {
            chunks,
            source: Box::new(source),
        }
    }

    /// Phase in which a chunked run failed, if this error carries one
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::ChunkProcessing { phase, .. } => Some(*phase),
            Self::Reduce { .. } => Some(Phase::Reduce),
            _ => None,
        }
    }

    /// Ordinal of the chunk that failed, if this error carries one
    pub fn chunk_ordinal(&self) -> Option<usize> {
        match self {
            Self::ChunkProcessing { ordinal, .. } => Some(*ordinal),
            _ => None,
        }
    }

    /// Innermost error, skipping chunk and reduce wrappers
    pub fn root_cause(&self) -> &GatewayError {
        match self {
            Self::ChunkProcessing { source, .. } | Self::Reduce { source, .. } => {
                source.root_cause()
            }
            other => other,
        }
    }

    /// Backend error at the root of this error, if any
    pub fn provider_error(&self) -> Option<&ProviderError> {
        match self.root_cause() {
            Self::Provider(err) => Some(err),
            _ => None,
        }
    }

    /// Check whether the root cause is a context window failure
    pub fn is_context_window_exceeded(&self) -> bool {
        matches!(self.root_cause(), Self::ContextWindowExceeded { .. })
    }
}
