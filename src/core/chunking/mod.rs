//! Chunking of oversized inputs
//!
//! Splits arbitrarily long text into ordered, bounded, overlapping chunks.
//! Every chunk's estimated size stays within the configured budget, and the
//! chunks' new content (text minus the leading overlap) concatenates back to
//! the source exactly.
//!
//! Three strategies are supported:
//!
//! - [`ChunkStrategy::Paragraph`] packs blank-line separated blocks, splitting
//!   a single oversized paragraph into sentences (and an oversized sentence
//!   into characters).
//! - [`ChunkStrategy::Sentence`] packs whole sentences; a sentence larger than
//!   the budget is split at character granularity.
//! - [`ChunkStrategy::FixedSize`] slices by estimated tokens, ignoring
//!   structure.

mod boundaries;
mod packer;


use crate::core::types::Chunk;
use crate::utils::ai::TokenEstimator;
use packer::Packer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Default chunk budget in tokens
pub const DEFAULT_MAX_TOKENS_PER_CHUNK: u32 = 4000;
/// Default overlap between consecutive chunks in tokens
pub const DEFAULT_OVERLAP_TOKENS: u32 = 200;

/// Chunk boundary strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkStrategy {
    Sentence,
    #[default]
    Paragraph,
    #[serde(alias = "fixed")]
    FixedSize,
}

/// Chunking errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChunkingError {
    #[error("max_tokens_per_chunk must be greater than 0")]
    ZeroBudget,

    #[error("overlap_tokens ({overlap}) must be less than max_tokens_per_chunk ({max})")]
    OverlapTooLarge { overlap: u32, max: u32 },

    #[error("character at byte {offset} estimates to {needed} tokens, over the {budget}-token chunk budget")]
    BudgetTooSmall {
        offset: usize,
        needed: u32,
        budget: u32,
    },
}

/// Chunking parameters, fixed for the duration of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default)]
    pub strategy: ChunkStrategy,
    #[serde(default = "default_max_tokens_per_chunk")]
    pub max_tokens_per_chunk: u32,
    #[serde(default = "default_overlap_tokens")]
    pub overlap_tokens: u32,
}

fn default_max_tokens_per_chunk() -> u32 {
    DEFAULT_MAX_TOKENS_PER_CHUNK
}

fn default_overlap_tokens() -> u32 {
    DEFAULT_OVERLAP_TOKENS
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            strategy: ChunkStrategy::default(),
            max_tokens_per_chunk: DEFAULT_MAX_TOKENS_PER_CHUNK,
            overlap_tokens: DEFAULT_OVERLAP_TOKENS,
        }
    }
}

impl ChunkingConfig {
    pub fn new(strategy: ChunkStrategy, max_tokens_per_chunk: u32, overlap_tokens: u32) -> Self {
        Self {
            strategy,
            max_tokens_per_chunk,
            overlap_tokens,
        }
    }

    pub fn with_strategy(mut self, strategy: ChunkStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_max_tokens_per_chunk(mut self, tokens: u32) -> Self {
        self.max_tokens_per_chunk = tokens;
        self
    }

    pub fn with_overlap_tokens(mut self, tokens: u32) -> Self {
        self.overlap_tokens = tokens;
        self
    }

    /// Check the budget and overlap relationship
    pub fn check(&self) -> Result<(), ChunkingError> {
        if self.max_tokens_per_chunk == 0 {
            return Err(ChunkingError::ZeroBudget);
        }
        if self.overlap_tokens >= self.max_tokens_per_chunk {
            return Err(ChunkingError::OverlapTooLarge {
                overlap: self.overlap_tokens,
                max: self.max_tokens_per_chunk,
            });
        }
        Ok(())
    }
}

/// Splits text into chunks sized for one estimator family
#[derive(Debug, Clone)]
pub struct Chunker {
    estimator: Arc<dyn TokenEstimator>,
    family: String,
}

impl Chunker {
    pub fn new(estimator: Arc<dyn TokenEstimator>, family: impl Into<String>) -> Self {
        Self {
            estimator,
            family: family.into(),
        }
    }

    /// Family the chunk estimates are computed for
    pub fn family(&self) -> &str {
        &self.family
    }

    /// Split `text` into ordered chunks
    ///
    /// Identical `(text, config)` always yields identical chunks. Empty text
    /// yields no chunks.
    pub fn chunk(&self, text: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>, ChunkingError> {
        config.check()?;
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let chunks = Packer::new(text, self.estimator.as_ref(), &self.family, config).pack()?;
        debug!(
            "Chunked {} bytes into {} chunks ({:?}, budget {}, overlap {})",
            text.len(),
            chunks.len(),
            config.strategy,
            config.max_tokens_per_chunk,
            config.overlap_tokens
        );
        Ok(chunks)
    }
}
