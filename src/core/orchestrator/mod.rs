//! Chunked processing orchestrators
//!
//! Inputs too large for any single backend are chunked and processed either
//! independently ([`MapReduceOrchestrator`]) or sequentially with an
//! accumulated state ([`IterativeRefiner`]). Each backend call still goes
//! through the router's validation, fallback and retry.

pub mod map_reduce;
pub mod prompt;
pub mod refine;

pub use map_reduce::MapReduceOrchestrator;
pub use refine::IterativeRefiner;

use crate::core::router::ExecutionResult;
use crate::core::types::{Chunk, UsageRecord};
use crate::utils::error::{GatewayError, Result};

/// Merge the providers each call went through, first appearance wins
pub(crate) fn providers_tried<'a>(
    results: impl IntoIterator<Item = &'a ExecutionResult>,
) -> Vec<String> {
    let mut tried: Vec<String> = Vec::new();
    for result in results {
        for provider in &result.attempted {
            if !tried.contains(provider) {
                tried.push(provider.clone());
            }
        }
    }
    tried
}

pub(crate) fn total_usage<'a>(
    results: impl IntoIterator<Item = &'a ExecutionResult>,
) -> UsageRecord {
    results.into_iter().map(|result| result.usage).sum()
}

pub(crate) fn total_attempts<'a>(results: impl IntoIterator<Item = &'a ExecutionResult>) -> u32 {
    results.into_iter().map(|result| result.attempts).sum()
}

pub(crate) fn ensure_chunks(chunks: &[Chunk]) -> Result<()> {
    if chunks.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "Cannot run chunked processing on empty input".to_string(),
        ));
    }
    Ok(())
}
