//! Configuration loading tests

use crate::common::ScriptedInvoker;
use ctxgate::{ChunkStrategy, Config, GatewayError, PerCharEstimator, Request, Router};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

const CONFIG: &str = r#"
providers:
  - id: "gpt-3.5-turbo-16k"
    context_limit: 16384
    reserved_output_tokens: 1024
    fallback: "gpt-4-1m"
  - id: "gpt-4-1m"
    context_limit: 1000000
    reserved_output_tokens: 4096

router:
  default_provider: "gpt-3.5-turbo-16k"
  max_in_flight: 2
  chunking:
    strategy: sentence
    max_tokens_per_chunk: 8000
    overlap_tokens: 100
"#;

#[tokio::test]
async fn test_router_from_config_file() -> anyhow::Result<()> {
    let mut file = NamedTempFile::new()?;
    file.write_all(CONFIG.as_bytes())?;

    let config = Config::from_file(file.path()).await?;
    assert_eq!(config.router.chunking.strategy, ChunkStrategy::Sentence);

    let invoker = ScriptedInvoker::new();
    let router = Router::from_config(&config, invoker.clone())?
        .with_estimator(Arc::new(PerCharEstimator));
    assert_eq!(router.config().max_in_flight, 2);
    assert_eq!(router.catalog().len(), 2);

    let response = router
        .call_model(Request::new("gpt-3.5-turbo-16k", "x".repeat(20_000)))
        .await?;
    assert!(response.metadata.fallback_used);
    Ok(())
}

#[test]
fn test_missing_config_file() {
    let result = tokio_test::block_on(Config::from_file("/nonexistent/ctxgate.yaml"));
    assert!(matches!(result, Err(GatewayError::Config(_))));
}

#[test]
fn test_cyclic_config_rejected() {
    let yaml = r#"
providers:
  - id: a
    context_limit: 100
    fallback: b
  - id: b
    context_limit: 100
    fallback: a
"#;
    assert!(matches!(
        Config::from_yaml_str(yaml),
        Err(GatewayError::FallbackCycle { .. })
    ));
}

#[test]
fn test_router_from_invalid_config() {
    let config = Config {
        router: ctxgate::RouterConfig {
            max_in_flight: 0,
            ..Default::default()
        },
        ..Config::default()
    };
    let result = Router::from_config(&config, ScriptedInvoker::new());
    assert!(matches!(result, Err(GatewayError::Config(_))));
}
