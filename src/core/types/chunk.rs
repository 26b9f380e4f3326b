//! Chunk type produced by the chunker

use std::ops::Range;

/// A bounded, ordered slice of an oversized input
///
/// `text` starts with `overlap_bytes` bytes repeated from the end of the
/// previous chunk. Joining [`Chunk::new_content`] across all chunks in ordinal
/// order reproduces the source text exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based, contiguous position in the chunk list
    pub ordinal: usize,
    /// Chunk text including the leading overlap
    pub text: String,
    /// Byte range of `text` within the source
    pub span: Range<usize>,
    /// Estimated tokens of `text`
    pub token_count: u32,
    /// Estimated tokens of the leading overlap
    pub overlap_tokens: u32,
    /// Byte length of the leading overlap
    pub overlap_bytes: usize,
}

impl Chunk {
    /// Leading text repeated from the previous chunk
    pub fn overlap(&self) -> &str {
        &self.text[..self.overlap_bytes]
    }

    /// Text that no earlier chunk contains
    pub fn new_content(&self) -> &str {
        &self.text[self.overlap_bytes..]
    }

    /// Byte offset in the source where new content begins
    pub fn new_content_start(&self) -> usize {
        self.span.start + self.overlap_bytes
    }
}
