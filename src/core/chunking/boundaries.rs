//! Cut positions for each chunking granularity
//!
//! A cut is a byte offset where one unit ends and the next begins. Trailing
//! whitespace stays with the unit it follows, so the units between
//! consecutive cuts partition the text exactly.

use once_cell::sync::Lazy;
use regex::Regex;

/// Blank line, plus any whitespace up to the next paragraph
static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n[ \t\r]*\n\s*").expect("Invalid paragraph regex"));

/// Sentence-ending punctuation, closing quotes or brackets, then whitespace
static SENTENCE_END: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[.!?]+["'”’)\]]*\s+"#).expect("Invalid sentence regex"));

/// Granularity of a cut
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Level {
    Paragraph,
    Sentence,
    Char,
}

/// Sorted cut positions in `(0, text.len()]`, always ending at `text.len()`
///
/// Returns an empty list for empty text. [`Level::Char`] is not materialized
/// here; see [`char_cuts_between`].
pub(crate) fn semantic_cuts(text: &str, level: Level) -> Vec<usize> {
    let regex = match level {
        Level::Paragraph => &*PARAGRAPH_BREAK,
        Level::Sentence => &*SENTENCE_END,
        Level::Char => return char_cuts_between(text, 0, text.len()),
    };

    let mut cuts: Vec<usize> = regex
        .find_iter(text)
        .map(|m| m.end())
        .filter(|&end| end > 0)
        .collect();
    if !text.is_empty() && cuts.last() != Some(&text.len()) {
        cuts.push(text.len());
    }
    cuts
}

/// Char boundaries strictly inside `(lo, hi]`
pub(crate) fn char_cuts_between(text: &str, lo: usize, hi: usize) -> Vec<usize> {
    if lo >= hi {
        return Vec::new();
    }
    let mut cuts: Vec<usize> = text[lo..hi]
        .char_indices()
        .skip(1)
        .map(|(idx, _)| lo + idx)
        .collect();
    cuts.push(hi);
    cuts
}

/// Smallest char boundary at or after `idx`
pub(crate) fn ceil_char_boundary(text: &str, idx: usize) -> usize {
    let mut idx = idx.min(text.len());
    while !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}
