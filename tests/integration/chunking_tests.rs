//! Chunking tests through the public API

use crate::common::assertions::assert_reconstructs;
use crate::common::fixtures::prose;
use crate::common::paragraph_document;
use ctxgate::{
    ChunkStrategy, Chunker, ChunkingConfig, PerCharEstimator, TokenCounter, TokenEstimator,
};
use std::sync::Arc;

fn chunker(estimator: Arc<dyn TokenEstimator>) -> Chunker {
    Chunker::new(estimator, "gpt-4")
}

#[test]
fn test_scenario_c_chunk_count() {
    let document = paragraph_document(400);
    let config = ChunkingConfig::new(ChunkStrategy::Paragraph, 12_000, 500);

    let chunks = chunker(Arc::new(PerCharEstimator))
        .chunk(&document, &config)
        .unwrap();

    let usable = 12_000 - 500;
    assert_eq!(chunks.len(), document.len().div_ceil(usable));
    assert_reconstructs(&chunks, &document);
    for chunk in &chunks[1..] {
        assert_eq!(chunk.overlap_tokens, 500);
    }
}

#[test]
fn test_scenario_d_fixed_size_short_string() {
    let config = ChunkingConfig::new(ChunkStrategy::FixedSize, 4, 1);
    let chunks = chunker(Arc::new(PerCharEstimator))
        .chunk("abcdefghij", &config)
        .unwrap();

    for chunk in &chunks {
        assert!(chunk.text.chars().count() <= 4);
        assert!(chunk.token_count <= 4);
        assert!(chunk.overlap().len() <= chunk.text.len());
    }
    assert_reconstructs(&chunks, "abcdefghij");
}

#[test]
fn test_budget_and_reconstruction_with_default_estimator() {
    let estimator: Arc<dyn TokenEstimator> = Arc::new(TokenCounter::new());
    let texts = [
        prose(5_000),
        paragraph_document(30),
        format!("{}\n\n{}", prose(700), "Ünïcödé text, ß and 日本語. ".repeat(40)),
    ];

    for strategy in [
        ChunkStrategy::Sentence,
        ChunkStrategy::Paragraph,
        ChunkStrategy::FixedSize,
    ] {
        for (budget, overlap) in [(50, 0), (120, 30), (600, 100)] {
            let config = ChunkingConfig::new(strategy, budget, overlap);
            for text in &texts {
                let chunks = chunker(estimator.clone()).chunk(text, &config).unwrap();
                for chunk in &chunks {
                    assert!(
                        estimator.estimate(&chunk.text, "gpt-4") <= budget,
                        "{:?} chunk over budget {}",
                        strategy,
                        budget
                    );
                }
                assert_reconstructs(&chunks, text);

                let again = chunker(estimator.clone()).chunk(text, &config).unwrap();
                assert_eq!(chunks, again, "chunking must be deterministic");
            }
        }
    }
}

#[test]
fn test_sentence_strategy_keeps_sentences_whole() {
    let text = "One short sentence. Another short sentence! A third one? And the last.";
    let config = ChunkingConfig::new(ChunkStrategy::Sentence, 25, 0);
    let chunks = chunker(Arc::new(PerCharEstimator))
        .chunk(text, &config)
        .unwrap();

    for chunk in &chunks {
        let trimmed = chunk.text.trim_end();
        assert!(
            trimmed.ends_with(['.', '!', '?']),
            "chunk {:?} splits a sentence",
            chunk.text
        );
    }
}
