//! Greedy chunk packing under a token budget
//!
//! Each chunk starts with an overlap taken from the end of the previous chunk,
//! then takes as many whole units as fit. Units are tried coarse to fine: a
//! unit that cannot fit on its own (even with the overlap dropped) is split
//! at the next finer granularity, bounded by that unit's end.

use super::boundaries::{Level, ceil_char_boundary, char_cuts_between, semantic_cuts};
use super::{ChunkStrategy, ChunkingConfig, ChunkingError};
use crate::core::types::Chunk;
use crate::utils::ai::TokenEstimator;

/// Candidate end positions in `(pos, limit]`
enum Candidates<'t> {
    /// Precomputed cuts strictly inside `(pos, limit)`, then `limit`
    Explicit { cuts: &'t [usize], limit: usize },
    /// Every byte offset in `(pos, limit]`, rounded up to a char boundary
    Chars {
        text: &'t str,
        pos: usize,
        limit: usize,
    },
}

impl Candidates<'_> {
    fn len(&self) -> usize {
        match self {
            Candidates::Explicit { cuts, .. } => cuts.len() + 1,
            Candidates::Chars { pos, limit, .. } => limit - pos,
        }
    }

    fn get(&self, idx: usize) -> usize {
        match self {
            Candidates::Explicit { cuts, limit } => cuts.get(idx).copied().unwrap_or(*limit),
            Candidates::Chars { text, pos, .. } => ceil_char_boundary(text, pos + 1 + idx),
        }
    }
}

/// Index of the last `true` in a predicate that is `true` then `false`
///
/// Gallops from the front so the cost tracks the answer, not `len`.
fn gallop_last(len: usize, mut fits: impl FnMut(usize) -> bool) -> Option<usize> {
    if len == 0 || !fits(0) {
        return None;
    }
    let mut lo = 0;
    let mut step = 1;
    let mut hi = loop {
        let probe = lo + step;
        if probe >= len {
            break len;
        }
        if fits(probe) {
            lo = probe;
            step *= 2;
        } else {
            break probe;
        }
    };
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if fits(mid) {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Some(lo)
}

fn split_levels(strategy: ChunkStrategy) -> &'static [Level] {
    match strategy {
        ChunkStrategy::Paragraph => &[Level::Paragraph, Level::Sentence, Level::Char],
        ChunkStrategy::Sentence => &[Level::Sentence, Level::Char],
        ChunkStrategy::FixedSize => &[Level::Char],
    }
}

fn overlap_levels(strategy: ChunkStrategy) -> &'static [Level] {
    match strategy {
        ChunkStrategy::Paragraph => &[Level::Paragraph, Level::Sentence],
        ChunkStrategy::Sentence => &[Level::Sentence],
        ChunkStrategy::FixedSize => &[Level::Char],
    }
}

pub(crate) struct Packer<'a> {
    text: &'a str,
    estimator: &'a dyn TokenEstimator,
    family: &'a str,
    budget: u32,
    overlap: u32,
    strategy: ChunkStrategy,
    paragraph_cuts: Vec<usize>,
    sentence_cuts: Vec<usize>,
}

impl<'a> Packer<'a> {
    pub(crate) fn new(
        text: &'a str,
        estimator: &'a dyn TokenEstimator,
        family: &'a str,
        config: &ChunkingConfig,
    ) -> Self {
        let uses = |level| split_levels(config.strategy).contains(&level);
        Self {
            text,
            estimator,
            family,
            budget: config.max_tokens_per_chunk,
            overlap: config.overlap_tokens,
            strategy: config.strategy,
            paragraph_cuts: if uses(Level::Paragraph) {
                semantic_cuts(text, Level::Paragraph)
            } else {
                Vec::new()
            },
            sentence_cuts: if uses(Level::Sentence) {
                semantic_cuts(text, Level::Sentence)
            } else {
                Vec::new()
            },
        }
    }

    pub(crate) fn pack(&self) -> Result<Vec<Chunk>, ChunkingError> {
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut pos = 0;
        let mut prev_start = 0;

        while pos < self.text.len() {
            let starts = if chunks.is_empty() {
                vec![pos]
            } else {
                self.overlap_starts(prev_start, pos)
            };
            let (start, end) = self.next_span(&starts, pos)?;

            chunks.push(Chunk {
                ordinal: chunks.len(),
                text: self.text[start..end].to_string(),
                span: start..end,
                token_count: self.tokens(start, end),
                overlap_tokens: self.tokens(start, pos),
                overlap_bytes: pos - start,
            });
            prev_start = start;
            pos = end;
        }

        Ok(chunks)
    }

    fn tokens(&self, start: usize, end: usize) -> u32 {
        if start >= end {
            return 0;
        }
        self.estimator.estimate(&self.text[start..end], self.family)
    }

    fn fits(&self, start: usize, end: usize) -> bool {
        self.tokens(start, end) <= self.budget
    }

    /// Cuts of `level` strictly inside `(lo, hi)`
    fn cuts_inside(&self, level: Level, lo: usize, hi: usize) -> Vec<usize> {
        let cuts = match level {
            Level::Paragraph => &self.paragraph_cuts,
            Level::Sentence => &self.sentence_cuts,
            Level::Char => {
                let mut cuts = char_cuts_between(self.text, lo, hi);
                cuts.pop();
                return cuts;
            }
        };
        let from = cuts.partition_point(|&c| c <= lo);
        let to = cuts.partition_point(|&c| c < hi);
        cuts[from..to.max(from)].to_vec()
    }

    fn candidates(&self, level: Level, pos: usize, limit: usize) -> Candidates<'_> {
        let cuts = match level {
            Level::Paragraph => &self.paragraph_cuts,
            Level::Sentence => &self.sentence_cuts,
            Level::Char => {
                return Candidates::Chars {
                    text: self.text,
                    pos,
                    limit,
                };
            }
        };
        let from = cuts.partition_point(|&c| c <= pos);
        let to = cuts.partition_point(|&c| c < limit);
        Candidates::Explicit {
            cuts: &cuts[from..to.max(from)],
            limit,
        }
    }

    /// Possible chunk starts in ascending order, ending at `pos`
    ///
    /// The first entry is the widest overlap whose estimate stays within the
    /// configured overlap tokens; the rest are narrower overlaps of the same
    /// granularity. Returns just `[pos]` when nothing qualifies.
    fn overlap_starts(&self, prev_start: usize, pos: usize) -> Vec<usize> {
        if self.overlap == 0 {
            return vec![pos];
        }

        for &level in overlap_levels(self.strategy) {
            let cuts = self.cuts_inside(level, prev_start, pos);
            let n = cuts.len();
            let widest = gallop_last(n, |i| self.tokens(cuts[n - 1 - i], pos) <= self.overlap);
            if let Some(i) = widest {
                let mut starts = cuts[n - 1 - i..].to_vec();
                starts.push(pos);
                return starts;
            }
        }

        vec![pos]
    }

    /// Start and end of the next chunk whose new content begins at `pos`
    fn next_span(&self, starts: &[usize], pos: usize) -> Result<(usize, usize), ChunkingError> {
        let mut limit = self.text.len();

        for &level in split_levels(self.strategy) {
            let candidates = self.candidates(level, pos, limit);
            let first = candidates.get(0);

            let n = starts.len();
            let Some(si) = gallop_last(n, |i| self.fits(starts[n - 1 - i], first)) else {
                // First unit alone is over budget; split it finer
                limit = first;
                continue;
            };
            let start = starts[n - 1 - si];
            let ci = gallop_last(candidates.len(), |i| self.fits(start, candidates.get(i)))
                .unwrap_or(0);
            return Ok((start, candidates.get(ci)));
        }

        let first_char = ceil_char_boundary(self.text, pos + 1);
        Err(ChunkingError::BudgetTooSmall {
            offset: pos,
            needed: self.tokens(pos, first_char),
            budget: self.budget,
        })
    }
}
