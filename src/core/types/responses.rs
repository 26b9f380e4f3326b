//! Response types

use super::usage::UsageRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// How a response was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingMode {
    Direct,
    MapReduce,
    Iterative,
}

/// Processing phase a backend call belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Direct,
    Map,
    Reduce,
    Refine,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Direct => "direct",
            Phase::Map => "map",
            Phase::Reduce => "reduce",
            Phase::Refine => "refine",
        };
        f.write_str(name)
    }
}

/// Metadata describing how a response was produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    /// Identifier shared by the tracing span and emitted events
    pub operation_id: Uuid,
    pub mode: ProcessingMode,
    /// True if any call landed on a provider other than the one requested
    pub fallback_used: bool,
    /// Provider the caller asked for, after alias resolution
    pub original_provider: String,
    /// Provider that served the final call
    pub provider_used: String,
    /// Distinct providers checked, in first-seen order
    pub providers_tried: Vec<String>,
    /// Number of chunks for map-reduce and iterative runs
    pub total_chunks: Option<usize>,
    pub phase_usage: BTreeMap<Phase, UsageRecord>,
    /// Backend calls made, retries and calls the backend rejected for size included
    pub backend_attempts: u32,
    /// Wall-clock time of the whole operation
    pub elapsed: Duration,
}

/// Uniform response returned by every entry point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub text: String,
    /// Structured payload for [`ResponseFormat::Json`](super::ResponseFormat::Json) requests
    pub structured: Option<serde_json::Value>,
    /// Usage summed across every backend call
    pub usage: UsageRecord,
    pub metadata: ResponseMetadata,
}

impl Response {
    /// Total tokens spent in one phase
    pub fn phase_tokens(&self, phase: Phase) -> u64 {
        self.metadata
            .phase_usage
            .get(&phase)
            .map(|usage| usage.total_tokens)
            .unwrap_or(0)
    }
}
