//! Request types

use crate::core::chunking::ChunkingConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Shape of the answer the caller wants back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Plain text
    #[default]
    Text,
    /// Structured JSON payload
    Json,
}

/// Explicit request for chunked processing
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkedProcessing {
    /// Independent per-chunk calls, then one combining call
    MapReduce {
        map_instruction: String,
        reduce_instruction: String,
        /// Overrides the configured chunking defaults
        chunking: Option<ChunkingConfig>,
    },
    /// Sequential calls threading an accumulated state
    Iterative {
        instructions: String,
        /// Initial state; empty when absent
        seed: Option<String>,
        /// Overrides the configured chunking defaults
        chunking: Option<ChunkingConfig>,
    },
}

/// Per-call options shared by the direct, map, reduce and refinement calls
#[derive(Debug, Clone, PartialEq)]
pub struct CallOptions {
    /// Provider id or alias the call starts on
    pub provider: String,
    /// Output token cap; the provider's reservation applies when absent
    pub max_output_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub response_format: ResponseFormat,
    /// Overrides the configured fallback default
    pub fallback_enabled: Option<bool>,
}

impl CallOptions {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            max_output_tokens: None,
            temperature: None,
            response_format: ResponseFormat::Text,
            fallback_enabled: None,
        }
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = format;
        self
    }

    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_enabled = Some(enabled);
        self
    }
}

/// A single logical request to the layer
///
/// For chunked processing, `prompt` is the text that gets chunked.
#[derive(Debug, Clone)]
pub struct Request {
    pub prompt: String,
    pub options: CallOptions,
    pub chunked: Option<ChunkedProcessing>,
    /// Deadline for the whole operation; overrides the configured default
    pub timeout: Option<Duration>,
    pub cancellation: Option<CancellationToken>,
}

impl Request {
    /// Create a direct request against `provider`
    pub fn new(provider: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            options: CallOptions::new(provider),
            chunked: None,
            timeout: None,
            cancellation: None,
        }
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.options.max_output_tokens = Some(tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.options.response_format = format;
        self
    }

    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.options.fallback_enabled = Some(enabled);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Route this request through map-reduce
    pub fn with_map_reduce(
        mut self,
        map_instruction: impl Into<String>,
        reduce_instruction: impl Into<String>,
        chunking: Option<ChunkingConfig>,
    ) -> Self {
        self.chunked = Some(ChunkedProcessing::MapReduce {
            map_instruction: map_instruction.into(),
            reduce_instruction: reduce_instruction.into(),
            chunking,
        });
        self
    }

    /// Route this request through iterative refinement
    pub fn with_iterative(
        mut self,
        instructions: impl Into<String>,
        seed: Option<String>,
        chunking: Option<ChunkingConfig>,
    ) -> Self {
        self.chunked = Some(ChunkedProcessing::Iterative {
            instructions: instructions.into(),
            seed,
            chunking,
        });
        self
    }
}
