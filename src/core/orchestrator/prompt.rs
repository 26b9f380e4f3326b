//! Prompt assembly for chunked calls

use crate::core::types::Chunk;

/// Position label for chunk `ordinal` (0-based) out of `total`
pub fn part_label(ordinal: usize, total: usize) -> String {
    format!("[Part {} of {}]", ordinal + 1, total)
}

/// Prompt for one map call
pub fn map_prompt(instruction: &str, chunk: &Chunk, total: usize, annotate: bool) -> String {
    if annotate {
        format!(
            "{}\n\n{}\n{}",
            instruction,
            part_label(chunk.ordinal, total),
            chunk.text
        )
    } else {
        format!("{}\n\n{}", instruction, chunk.text)
    }
}

/// Prompt for the reduce call over map outputs in ordinal order
pub fn reduce_prompt(instruction: &str, outputs: &[&str], annotate: bool) -> String {
    let total = outputs.len();
    let body = outputs
        .iter()
        .enumerate()
        .map(|(ordinal, output)| {
            if annotate {
                format!("{}\n{}", part_label(ordinal, total), output)
            } else {
                (*output).to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{}\n\n{}", instruction, body)
}

/// Prompt for one refinement step
pub fn refine_prompt(
    instructions: &str,
    state: &str,
    chunk: &Chunk,
    total: usize,
    annotate: bool,
) -> String {
    let state = if state.is_empty() { "(empty)" } else { state };
    let heading = if annotate {
        format!("Next section {}:", part_label(chunk.ordinal, total))
    } else {
        "Next section:".to_string()
    };
    format!(
        "{}\n\nCurrent state:\n{}\n\n{}\n{}",
        instructions, state, heading, chunk.text
    )
}
