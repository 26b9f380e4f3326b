//! Map-reduce orchestration
//!
//! Every chunk is mapped independently, with a bounded number of calls in
//! flight. Map outputs are collected by ordinal and combined by a single
//! reduce call once all of them are present.

use super::{ensure_chunks, prompt, providers_tried, total_attempts, total_usage};
use crate::core::chunking::ChunkingConfig;
use crate::core::events::ProcessingEvent;
use crate::core::router::Router;
use crate::core::router::execution::{CallContext, ExecutionResult, run_guarded};
use crate::core::router::router::structured_payload;
use crate::core::types::{
    CallOptions, Phase, ProcessingMode, Response, ResponseFormat, ResponseMetadata,
};
use crate::utils::error::{GatewayError, Result};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

/// Runs map calls over chunks, then one reduce call over their outputs
///
/// Defaults for concurrency, annotation and deadline come from the router's
/// configuration.
#[derive(Debug)]
pub struct MapReduceOrchestrator<'r> {
    router: &'r Router,
    options: CallOptions,
    max_in_flight: usize,
    annotate: bool,
    timeout: Option<Duration>,
    cancellation: Option<CancellationToken>,
}

impl<'r> MapReduceOrchestrator<'r> {
    pub fn new(router: &'r Router, options: CallOptions) -> Self {
        let config = router.config();
        Self {
            router,
            options,
            max_in_flight: config.max_in_flight.max(1),
            annotate: config.annotate_chunks,
            timeout: config.timeout(),
            cancellation: None,
        }
    }

    /// Maximum concurrent map calls
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    /// Label chunks and map outputs with `[Part i of n]`
    pub fn with_annotation(mut self, annotate: bool) -> Self {
        self.annotate = annotate;
        self
    }

    /// Deadline for the whole run
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Chunk `text`, map every chunk, and reduce the outputs in ordinal order
    ///
    /// `chunking` overrides the router's chunking defaults. The first failed
    /// map call aborts the run and drops the calls still in flight; no reduce
    /// runs over partial results.
    pub async fn run(
        &self,
        text: &str,
        map_instruction: &str,
        reduce_instruction: &str,
        chunking: Option<&ChunkingConfig>,
    ) -> Result<Response> {
        let operation_id = Uuid::new_v4();
        let span = info_span!("map_reduce", %operation_id, provider = %self.options.provider);

        run_guarded(
            self.run_phases(operation_id, text, map_instruction, reduce_instruction, chunking),
            self.timeout,
            self.cancellation.as_ref(),
        )
        .instrument(span)
        .await
    }

    async fn run_phases(
        &self,
        operation_id: Uuid,
        text: &str,
        map_instruction: &str,
        reduce_instruction: &str,
        chunking: Option<&ChunkingConfig>,
    ) -> Result<Response> {
        let started = Instant::now();
        let provider = self.router.catalog().resolve(&self.options.provider)?;
        let config = chunking.unwrap_or(&self.router.config().chunking);

        let chunks = self.router.chunker_for(provider).chunk(text, config)?;
        ensure_chunks(&chunks)?;
        let total = chunks.len();
        info!(chunks = total, max_in_flight = self.max_in_flight, "Starting map phase");

        // Map outputs feed the reduce prompt as text
        let map_options = CallOptions {
            response_format: ResponseFormat::Text,
            ..self.options.clone()
        };
        let map_options = &map_options;

        let mut slots: Vec<Option<ExecutionResult>> = (0..total).map(|_| None).collect();
        {
            let mut in_flight = stream::iter(chunks.iter().map(|chunk| {
                let ordinal = chunk.ordinal;
                let prompt = prompt::map_prompt(map_instruction, chunk, total, self.annotate);
                let ctx = CallContext::new(operation_id, Phase::Map).with_ordinal(ordinal);
                async move {
                    let result = self.router.execute(&prompt, map_options, ctx).await;
                    (ordinal, result)
                }
            }))
            .buffer_unordered(self.max_in_flight);

            while let Some((ordinal, result)) = in_flight.next().await {
                let result = result
                    .map_err(|e| GatewayError::chunk_processing(Phase::Map, ordinal, total, e))?;
                debug!(ordinal, provider = %result.provider_used, "Map call completed");
                self.router.notify(ProcessingEvent::ChunkCompleted {
                    operation_id,
                    phase: Phase::Map,
                    ordinal,
                    total,
                    provider: result.provider_used.clone(),
                    usage: result.usage,
                });
                slots[ordinal] = Some(result);
            }
        }

        let map_results = slots
            .into_iter()
            .enumerate()
            .map(|(ordinal, slot)| {
                slot.ok_or_else(|| {
                    GatewayError::chunk_processing(
                        Phase::Map,
                        ordinal,
                        total,
                        GatewayError::InvalidRequest("Map output missing".to_string()),
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(token) = &self.cancellation {
            if token.is_cancelled() {
                return Err(GatewayError::Cancelled(
                    "Operation cancelled before reduce".to_string(),
                ));
            }
        }

        let outputs: Vec<&str> = map_results.iter().map(|r| r.output.text.as_str()).collect();
        let reduce_prompt = prompt::reduce_prompt(reduce_instruction, &outputs, self.annotate);
        let reduce = self
            .router
            .execute(
                &reduce_prompt,
                &self.options,
                CallContext::new(operation_id, Phase::Reduce),
            )
            .await
            .map_err(|e| GatewayError::reduce(total, e))?;

        let map_usage = total_usage(&map_results);
        let usage = map_usage + reduce.usage;
        let elapsed = started.elapsed();

        let mut phase_usage = BTreeMap::new();
        phase_usage.insert(Phase::Map, map_usage);
        phase_usage.insert(Phase::Reduce, reduce.usage);

        let fallback_used =
            reduce.used_fallback || map_results.iter().any(|result| result.used_fallback);
        let tried = providers_tried(map_results.iter().chain(std::iter::once(&reduce)));
        let attempts = total_attempts(&map_results) + reduce.attempts;

        self.router.notify(ProcessingEvent::MapReduceCompleted {
            operation_id,
            chunks: total,
            usage,
            elapsed,
        });

        Ok(Response {
            structured: structured_payload(&reduce.output, self.options.response_format),
            text: reduce.output.text,
            usage,
            metadata: ResponseMetadata {
                operation_id,
                mode: ProcessingMode::MapReduce,
                fallback_used,
                original_provider: provider.id.clone(),
                provider_used: reduce.provider_used,
                providers_tried: tried,
                total_chunks: Some(total),
                phase_usage,
                backend_attempts: attempts,
                elapsed,
            },
        })
    }
}
