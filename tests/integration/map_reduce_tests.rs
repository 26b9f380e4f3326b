//! Map-reduce orchestration tests

use crate::assert_err_matches;
use crate::common::assertions::ResponseAssertions;
use crate::common::fixtures::{SMALL, router_with_config};
use crate::common::{ScriptedInvoker, paragraph_document, router};
use ctxgate::{
    ChannelSink, ChunkStrategy, ChunkingConfig, GatewayError, MapReduceOrchestrator, Phase,
    ProcessingEvent, ProcessingMode, ProviderError, Request, ResponseFormat, RouterConfig,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const MAP: &str = "Summarize this section.";
const REDUCE: &str = "Combine the section summaries.";

fn scenario_c_chunking() -> ChunkingConfig {
    ChunkingConfig::new(ChunkStrategy::Paragraph, 12_000, 500)
}

#[tokio::test]
async fn test_scenario_c_issues_one_call_per_chunk_plus_reduce() {
    let invoker = ScriptedInvoker::new();
    let router = router(invoker.clone());
    let document = paragraph_document(400);
    assert_eq!(document.len(), 100_000);

    let response = router
        .call_model(Request::new(SMALL, document).with_map_reduce(
            MAP,
            REDUCE,
            Some(scenario_c_chunking()),
        ))
        .await
        .unwrap();

    // ceil(100,000 / (12,000 - 500))
    let expected_chunks = 9;
    assert_eq!(response.metadata.mode, ProcessingMode::MapReduce);
    response.assert_chunked(expected_chunks);
    assert_eq!(invoker.calls_containing(MAP).len(), expected_chunks);
    assert_eq!(invoker.calls_containing(REDUCE).len(), 1);
    assert_eq!(invoker.call_count(), expected_chunks + 1);
    assert_eq!(response.metadata.backend_attempts as usize, expected_chunks + 1);
    assert_eq!(response.text, "FINAL");
}

#[tokio::test]
async fn test_usage_is_sum_of_every_call() {
    let invoker = ScriptedInvoker::new();
    let router = router(invoker.clone());

    let response = router
        .call_model(Request::new(SMALL, paragraph_document(400)).with_map_reduce(
            MAP,
            REDUCE,
            Some(scenario_c_chunking()),
        ))
        .await
        .unwrap();

    let recorded: u64 = invoker
        .calls()
        .iter()
        .map(|call| u64::from(call.usage.total_tokens()))
        .sum();
    assert_eq!(response.usage.total_tokens, recorded);
    assert_eq!(response.usage.calls as usize, invoker.call_count());
    response.assert_usage_consistent();

    let reduce_call = &invoker.calls_containing(REDUCE)[0];
    assert_eq!(
        response.phase_tokens(Phase::Reduce),
        u64::from(reduce_call.usage.total_tokens())
    );
    assert_eq!(
        response.phase_tokens(Phase::Map) + response.phase_tokens(Phase::Reduce),
        response.usage.total_tokens
    );
}

#[tokio::test]
async fn test_reduce_input_is_in_ordinal_order() {
    let invoker = ScriptedInvoker::new();
    // Later parts finish first
    invoker.set_reversed_latency(Duration::from_millis(5));
    let router = router(invoker.clone());

    router
        .call_model(Request::new(SMALL, paragraph_document(400)).with_map_reduce(
            MAP,
            REDUCE,
            Some(scenario_c_chunking()),
        ))
        .await
        .unwrap();

    let reduce_prompt = invoker.calls_containing(REDUCE)[0].prompt.clone();
    let positions: Vec<usize> = (1..=9)
        .map(|part| {
            reduce_prompt
                .find(&format!("OUT[{}]", part))
                .unwrap_or_else(|| panic!("map output {} missing from reduce input", part))
        })
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));

    // With four calls in flight, part 4 is the first to complete
    let map_calls = invoker.calls_containing(MAP);
    assert!(map_calls[0].prompt.contains("[Part 4 of 9]"));
}

#[tokio::test]
async fn test_concurrency_is_bounded() {
    let invoker = ScriptedInvoker::new();
    invoker.set_latency(Duration::from_millis(10));
    let router = router(invoker.clone());
    let chunking = ChunkingConfig::new(ChunkStrategy::Paragraph, 2_500, 0);

    let response = MapReduceOrchestrator::new(&router, ctxgate::CallOptions::new(SMALL))
        .with_max_in_flight(3)
        .run(&paragraph_document(80), MAP, REDUCE, Some(&chunking))
        .await
        .unwrap();

    response.assert_chunked(8);
    assert_eq!(invoker.peak_concurrency(), 3);
}

#[tokio::test]
async fn test_map_failure_aborts_without_reduce() {
    let invoker = ScriptedInvoker::new();
    invoker.set_reversed_latency(Duration::from_millis(20));
    invoker.fail_on("[Part 3 of 9]", ProviderError::content_filtered(SMALL, "policy"));
    let router = router_with_config(
        invoker.clone(),
        RouterConfig {
            max_in_flight: 4,
            ..RouterConfig::default()
        },
    );

    let err = router
        .call_model(Request::new(SMALL, paragraph_document(400)).with_map_reduce(
            MAP,
            REDUCE,
            Some(scenario_c_chunking()),
        ))
        .await
        .unwrap_err();

    assert_eq!(err.phase(), Some(Phase::Map));
    assert_eq!(err.chunk_ordinal(), Some(2));
    assert!(matches!(err, GatewayError::ChunkProcessing { total: 9, .. }));
    assert!(matches!(
        err.provider_error(),
        Some(ProviderError::ContentFiltered { .. })
    ));
    assert!(invoker.calls_containing(REDUCE).is_empty());
    assert!(invoker.abandoned() > 0, "In-flight map calls should be dropped");
}

#[tokio::test]
async fn test_reduce_failure_is_reported_as_reduce_error() {
    let invoker = ScriptedInvoker::new();
    invoker.fail_on(REDUCE, ProviderError::api_error(SMALL, 400, "bad request"));
    let router = router(invoker.clone());

    let result = router
        .call_model(Request::new(SMALL, paragraph_document(400)).with_map_reduce(
            MAP,
            REDUCE,
            Some(scenario_c_chunking()),
        ))
        .await;

    assert_err_matches!(result, GatewayError::Reduce { chunks: 9, .. });
}

#[tokio::test]
async fn test_cancellation_stops_map_phase() {
    let invoker = ScriptedInvoker::new();
    invoker.set_reversed_latency(Duration::from_millis(20));
    let router = router(invoker.clone());

    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        trigger.cancel();
    });

    let result = router
        .call_model(
            Request::new(SMALL, paragraph_document(400))
                .with_map_reduce(MAP, REDUCE, Some(scenario_c_chunking()))
                .with_cancellation(token),
        )
        .await;

    assert_err_matches!(result, GatewayError::Cancelled(_));
    assert!(invoker.calls_containing(REDUCE).is_empty());
    assert!(invoker.abandoned() > 0);
}

#[tokio::test]
async fn test_timeout_stops_map_phase() {
    let invoker = ScriptedInvoker::new();
    invoker.set_latency(Duration::from_millis(200));
    let router = router(invoker.clone());

    let result = router
        .call_model(
            Request::new(SMALL, paragraph_document(400))
                .with_map_reduce(MAP, REDUCE, Some(scenario_c_chunking()))
                .with_timeout(Duration::from_millis(30)),
        )
        .await;

    assert_err_matches!(result, GatewayError::Timeout(_));
    assert_eq!(invoker.call_count(), 0);
}

#[tokio::test]
async fn test_progress_events() {
    let invoker = ScriptedInvoker::new();
    let (sink, mut events) = ChannelSink::new(32);
    let router = router(invoker).with_event_sink(Arc::new(sink));
    let chunking = ChunkingConfig::new(ChunkStrategy::Paragraph, 2_500, 0);

    let response = MapReduceOrchestrator::new(&router, ctxgate::CallOptions::new(SMALL))
        .run(&paragraph_document(40), MAP, REDUCE, Some(&chunking))
        .await
        .unwrap();

    let mut completed_chunks = Vec::new();
    let mut finished = None;
    while let Ok(event) = events.try_recv() {
        assert_eq!(event.operation_id(), response.metadata.operation_id);
        match event {
            ProcessingEvent::ChunkCompleted { ordinal, phase, .. } => {
                assert_eq!(phase, Phase::Map);
                completed_chunks.push(ordinal);
            }
            ProcessingEvent::MapReduceCompleted { chunks, usage, .. } => {
                finished = Some((chunks, usage.total_tokens));
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    completed_chunks.sort_unstable();
    assert_eq!(completed_chunks, vec![0, 1, 2, 3]);
    assert_eq!(finished, Some((4, response.usage.total_tokens)));
}

#[tokio::test]
async fn test_default_provider_entry_point() {
    let invoker = ScriptedInvoker::new();
    let router = router_with_config(
        invoker.clone(),
        RouterConfig {
            default_provider: Some(SMALL.to_string()),
            chunking: ChunkingConfig::new(ChunkStrategy::Paragraph, 2_500, 0),
            ..RouterConfig::default()
        },
    );

    let response = router
        .map_reduce(&paragraph_document(20), MAP, REDUCE, None)
        .await
        .unwrap();

    response.assert_chunked(2);
    assert_eq!(response.metadata.original_provider, SMALL);
    assert_eq!(invoker.call_count(), 3);
}

#[tokio::test]
async fn test_empty_input_is_rejected() {
    let invoker = ScriptedInvoker::new();
    let router = router(invoker.clone());

    let result = router
        .call_model(Request::new(SMALL, "").with_map_reduce(MAP, REDUCE, None))
        .await;

    assert_err_matches!(result, GatewayError::InvalidRequest(_));
    assert_eq!(invoker.call_count(), 0);
}

#[tokio::test]
async fn test_map_calls_are_text_and_reduce_uses_requested_format() {
    let invoker = ScriptedInvoker::new();
    let router = router(invoker.clone());

    router
        .call_model(
            Request::new(SMALL, paragraph_document(400))
                .with_response_format(ResponseFormat::Json)
                .with_map_reduce(MAP, REDUCE, Some(scenario_c_chunking())),
        )
        .await
        .unwrap();

    let maps = invoker.calls_containing(MAP);
    assert_eq!(maps.len(), 9);
    assert!(maps.iter().all(|call| call.options.response_format == ResponseFormat::Text));
    let reduce = invoker.calls_containing(REDUCE);
    assert_eq!(reduce.len(), 1);
    assert_eq!(reduce[0].options.response_format, ResponseFormat::Json);
}
