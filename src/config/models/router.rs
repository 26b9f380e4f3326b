//! Router defaults

use super::*;
use crate::core::chunking::ChunkingConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Process-wide defaults for the request layer
///
/// Every field can be overridden per call through
/// [`Request`](crate::Request) or the orchestrator builders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Provider used by `map_reduce` and `iterative_refinement` when none is given
    #[serde(default)]
    pub default_provider: Option<String>,
    /// Follow fallback edges when a prompt does not fit
    #[serde(default = "default_fallback_enabled")]
    pub fallback_enabled: bool,
    /// Default chunking parameters
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Maximum concurrent map calls
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Prefix chunk prompts with their position, e.g. `[Part 2 of 5]`
    #[serde(default = "default_true")]
    pub annotate_chunks: bool,
    /// Deadline for a whole operation in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Retries per backend call for transient errors
    #[serde(default = "default_num_retries")]
    pub num_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
    /// Sampling temperature passed to the invoker
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            default_provider: None,
            fallback_enabled: default_fallback_enabled(),
            chunking: ChunkingConfig::default(),
            max_in_flight: default_max_in_flight(),
            annotate_chunks: true,
            timeout_secs: None,
            num_retries: default_num_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            temperature: None,
        }
    }
}

impl RouterConfig {
    /// Whole-operation deadline
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Merge router configurations, taking non-default values from `other`
    ///
    /// A field of `other` equal to its default is treated as unset, so this
    /// can never reset a field back to its default. Use
    /// [`apply`](Self::apply) with [`RouterOverrides`] for that.
    pub fn merge(mut self, other: Self) -> Self {
        let defaults = Self::default();
        if other.default_provider.is_some() {
            self.default_provider = other.default_provider;
        }
        if other.fallback_enabled != defaults.fallback_enabled {
            self.fallback_enabled = other.fallback_enabled;
        }
        if other.chunking != defaults.chunking {
            self.chunking = other.chunking;
        }
        if other.max_in_flight != defaults.max_in_flight {
            self.max_in_flight = other.max_in_flight;
        }
        if other.annotate_chunks != defaults.annotate_chunks {
            self.annotate_chunks = other.annotate_chunks;
        }
        if other.timeout_secs.is_some() {
            self.timeout_secs = other.timeout_secs;
        }
        if other.num_retries != defaults.num_retries {
            self.num_retries = other.num_retries;
        }
        if other.retry_base_delay_ms != defaults.retry_base_delay_ms {
            self.retry_base_delay_ms = other.retry_base_delay_ms;
        }
        if other.retry_max_delay_ms != defaults.retry_max_delay_ms {
            self.retry_max_delay_ms = other.retry_max_delay_ms;
        }
        if other.temperature.is_some() {
            self.temperature = other.temperature;
        }
        self
    }
}

/// Partial router settings layered over a [`RouterConfig`]
///
/// Only fields that are `Some` are applied, whatever their value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterOverrides {
    pub default_provider: Option<String>,
    pub fallback_enabled: Option<bool>,
    pub chunking: Option<ChunkingConfig>,
    pub max_in_flight: Option<usize>,
    pub annotate_chunks: Option<bool>,
    pub timeout_secs: Option<u64>,
    pub num_retries: Option<u32>,
    pub retry_base_delay_ms: Option<u64>,
    pub retry_max_delay_ms: Option<u64>,
    pub temperature: Option<f32>,
}

impl RouterConfig {
    /// Apply every override that is set
    pub fn apply(mut self, overrides: RouterOverrides) -> Self {
        if let Some(provider) = overrides.default_provider {
            self.default_provider = Some(provider);
        }
        if let Some(enabled) = overrides.fallback_enabled {
            self.fallback_enabled = enabled;
        }
        if let Some(chunking) = overrides.chunking {
            self.chunking = chunking;
        }
        if let Some(max_in_flight) = overrides.max_in_flight {
            self.max_in_flight = max_in_flight;
        }
        if let Some(annotate) = overrides.annotate_chunks {
            self.annotate_chunks = annotate;
        }
        if let Some(secs) = overrides.timeout_secs {
            self.timeout_secs = Some(secs);
        }
        if let Some(retries) = overrides.num_retries {
            self.num_retries = retries;
        }
        if let Some(delay) = overrides.retry_base_delay_ms {
            self.retry_base_delay_ms = delay;
        }
        if let Some(delay) = overrides.retry_max_delay_ms {
            self.retry_max_delay_ms = delay;
        }
        if let Some(temperature) = overrides.temperature {
            self.temperature = Some(temperature);
        }
        self
    }
}
