//! Custom test assertions
//!
//! Provides domain-specific assertions for ctxgate responses and chunks.

use ctxgate::{Chunk, Phase, Response};

/// Assertions for Response
pub trait ResponseAssertions {
    /// Assert the usage total equals the sum of the per-phase totals
    fn assert_usage_consistent(&self);

    /// Assert the response came out of `chunks` chunks
    fn assert_chunked(&self, chunks: usize);
}

impl ResponseAssertions for Response {
    fn assert_usage_consistent(&self) {
        let per_phase: u64 = self
            .metadata
            .phase_usage
            .values()
            .map(|usage| usage.total_tokens)
            .sum();
        assert_eq!(
            self.usage.total_tokens, per_phase,
            "Expected total usage to equal the sum of phase usage"
        );
        assert_eq!(
            self.usage.total_tokens,
            self.usage.prompt_tokens + self.usage.completion_tokens
        );
    }

    fn assert_chunked(&self, chunks: usize) {
        assert_eq!(self.metadata.total_chunks, Some(chunks));
        let calls: u32 = [Phase::Map, Phase::Reduce, Phase::Refine]
            .iter()
            .filter_map(|phase| self.metadata.phase_usage.get(phase))
            .map(|usage| usage.calls)
            .sum();
        assert!(calls as usize >= chunks, "Expected at least one call per chunk");
    }
}

/// Assert that chunks reconstruct `text` once each chunk's overlap is removed
pub fn assert_reconstructs(chunks: &[Chunk], text: &str) {
    let rebuilt: String = chunks.iter().map(|chunk| chunk.new_content()).collect();
    assert_eq!(rebuilt, text, "Chunks do not reconstruct the source text");
    for (expected, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.ordinal, expected, "Chunk ordinals must be contiguous");
    }
    if let Some(first) = chunks.first() {
        assert_eq!(first.overlap_tokens, 0, "First chunk must not overlap");
    }
}

/// Assert a duration is within bounds
#[macro_export]
macro_rules! assert_duration_within {
    ($duration:expr, $max_ms:expr) => {
        let millis = $duration.as_millis();
        assert!(
            millis <= $max_ms,
            "Expected duration <= {}ms, got {}ms",
            $max_ms,
            millis
        );
    };
}
