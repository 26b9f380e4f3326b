//! Direct call tests: validation and context window fallback

use crate::assert_err_matches;
use crate::common::fixtures::{LARGE, SMALL, SMALL_RESERVED, prose};
use crate::common::{ScriptedInvoker, router};
use ctxgate::{ChannelSink, GatewayError, Phase, ProcessingEvent, Request};
use std::sync::Arc;

const SCENARIO_PROMPT_TOKENS: usize = 46_756;

#[tokio::test]
async fn test_scenario_a_fallback_to_million_token_provider() {
    let invoker = ScriptedInvoker::new();
    let router = router(invoker.clone());

    let response = router
        .call_model(Request::new(SMALL, prose(SCENARIO_PROMPT_TOKENS)))
        .await
        .unwrap();

    assert!(response.metadata.fallback_used);
    assert_eq!(response.metadata.original_provider, SMALL);
    assert_eq!(response.metadata.provider_used, LARGE);
    assert_eq!(response.metadata.providers_tried, vec![SMALL, LARGE]);

    let calls = invoker.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].options.provider, LARGE);
    assert_eq!(response.phase_tokens(Phase::Direct), response.usage.total_tokens);
}

#[tokio::test]
async fn test_scenario_b_fallback_disabled() {
    let invoker = ScriptedInvoker::new();
    let router = router(invoker.clone());

    let result = router
        .call_model(Request::new(SMALL, prose(SCENARIO_PROMPT_TOKENS)).with_fallback(false))
        .await;

    assert_err_matches!(
        result,
        GatewayError::ContextWindowExceeded {
            prompt_tokens: 46_756,
            max_tokens,
            ref attempted,
            ..
        } if max_tokens == 16_384 - SMALL_RESERVED && attempted.len() == 1
    );
    assert_eq!(invoker.call_count(), 0);
}

#[tokio::test]
async fn test_prompt_that_fits_stays_on_original_provider() {
    let invoker = ScriptedInvoker::new();
    let router = router(invoker.clone());

    let response = router
        .call_model(Request::new("gpt35", prose(15_360)))
        .await
        .unwrap();

    assert_eq!(response.text, "DIRECT");
    assert!(!response.metadata.fallback_used);
    assert_eq!(response.metadata.provider_used, SMALL);
    assert_eq!(invoker.calls()[0].options.max_output_tokens, Some(SMALL_RESERVED));
}

#[tokio::test]
async fn test_one_token_over_budget_falls_back() {
    let invoker = ScriptedInvoker::new();
    let router = router(invoker.clone());

    let response = router
        .call_model(Request::new(SMALL, prose(15_361)))
        .await
        .unwrap();
    assert!(response.metadata.fallback_used);
}

#[tokio::test]
async fn test_fallback_event_reaches_channel() {
    let invoker = ScriptedInvoker::new();
    let (sink, mut events) = ChannelSink::new(8);
    let router = router(invoker).with_event_sink(Arc::new(sink.clone()));

    let response = router
        .call_model(Request::new(SMALL, prose(SCENARIO_PROMPT_TOKENS)))
        .await
        .unwrap();

    match events.try_recv().unwrap() {
        ProcessingEvent::FallbackTriggered {
            operation_id,
            from,
            to,
            prompt_tokens,
            ..
        } => {
            assert_eq!(operation_id, response.metadata.operation_id);
            assert_eq!(from, SMALL);
            assert_eq!(to, LARGE);
            assert_eq!(prompt_tokens, 46_756);
        }
        other => panic!("unexpected event: {:?}", other),
    }
    assert_eq!(sink.dropped(), 0);
}

#[tokio::test]
async fn test_closed_event_channel_does_not_fail_call() {
    let invoker = ScriptedInvoker::new();
    let (sink, events) = ChannelSink::new(1);
    drop(events);
    let router = router(invoker).with_event_sink(Arc::new(sink.clone()));

    let response = router
        .call_model(Request::new(SMALL, prose(SCENARIO_PROMPT_TOKENS)))
        .await;

    assert!(response.is_ok());
    assert_eq!(sink.dropped(), 1);
}
