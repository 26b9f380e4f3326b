//! Test fixtures and data factories

use super::providers::ScriptedInvoker;
use ctxgate::{NoopSink, PerCharEstimator, ProviderCatalog, ProviderConfig, Router, RouterConfig};
use std::sync::Arc;

/// Provider with a 16,384-token window
pub const SMALL: &str = "gpt-3.5-turbo-16k";
/// Provider with a 1,000,000-token window
pub const LARGE: &str = "gpt-4-1m";
/// Output tokens reserved on the small provider
pub const SMALL_RESERVED: u32 = 1_024;

/// Small provider falling back to a million-token provider
pub fn scenario_catalog() -> ProviderCatalog {
    ProviderCatalog::new(vec![
        ProviderConfig::new(SMALL, 16_384, SMALL_RESERVED)
            .with_fallback(LARGE)
            .with_family("gpt-3.5-turbo")
            .with_alias("gpt35"),
        ProviderConfig::new(LARGE, 1_000_000, 4_096).with_family("gpt-4"),
    ])
    .expect("Scenario catalog must be valid")
}

/// Router over [`scenario_catalog`] counting one token per character
pub fn router(invoker: Arc<ScriptedInvoker>) -> Router {
    router_with_config(invoker, RouterConfig::default())
}

pub fn router_with_config(invoker: Arc<ScriptedInvoker>, config: RouterConfig) -> Router {
    let config = RouterConfig {
        retry_base_delay_ms: 1,
        retry_max_delay_ms: 5,
        ..config
    };
    Router::new(scenario_catalog(), invoker)
        .with_config(config)
        .with_estimator(Arc::new(PerCharEstimator))
        .with_event_sink(Arc::new(NoopSink))
}

/// Prose of exactly `chars` characters
pub fn prose(chars: usize) -> String {
    const SENTENCE: &str = "The quick brown fox jumps over the lazy dog. ";
    SENTENCE.chars().cycle().take(chars).collect()
}

/// `paragraphs` blocks of 250 characters each, tagged `P0000`, `P0001`, ...
pub fn paragraph_document(paragraphs: usize) -> String {
    (0..paragraphs)
        .map(|i| format!("P{:04} {}\n\n", i, "x".repeat(242)))
        .collect()
}
