//! Iterative refinement
//!
//! Chunks are processed one at a time. Each call receives the accumulated
//! state and the next chunk and returns the new state; the final state is the
//! answer.

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
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

/// Threads a state through the chunks of an input, in order
#[derive(Debug)]
pub struct IterativeRefiner<'r> {
    router: &'r Router,
    options: CallOptions,
    seed: Option<String>,
    annotate: bool,
    timeout: Option<Duration>,
    cancellation: Option<CancellationToken>,
}

impl<'r> IterativeRefiner<'r> {
    pub fn new(router: &'r Router, options: CallOptions) -> Self {
        let config = router.config();
        Self {
            router,
            options,
            seed: None,
            annotate: config.annotate_chunks,
            timeout: config.timeout(),
            cancellation: None,
        }
    }

    /// Initial state; the run starts from an empty state otherwise
    pub fn with_seed(mut self, seed: impl Into<String>) -> Self {
        self.seed = Some(seed.into());
        self
    }

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

    /// Refine over the chunks of `text`
    ///
    /// A failed step aborts the run with the step's ordinal; the partial
    /// state is discarded.
    pub async fn run(
        &self,
        text: &str,
        instructions: &str,
        chunking: Option<&ChunkingConfig>,
    ) -> Result<Response> {
        let operation_id = Uuid::new_v4();
        let span = info_span!(
            "iterative_refinement",
            %operation_id,
            provider = %self.options.provider
        );

        run_guarded(
            self.run_steps(operation_id, text, instructions, chunking),
            self.timeout,
            self.cancellation.as_ref(),
        )
        .instrument(span)
        .await
    }

    // Only the last step answers in the requested format; earlier steps feed
    // their text back in as state.
    fn step_options(&self, last: bool) -> CallOptions {
        if last {
            self.options.clone()
        } else {
            self.options.clone().with_response_format(ResponseFormat::Text)
        }
    }

    async fn run_steps(
        &self,
        operation_id: Uuid,
        text: &str,
        instructions: &str,
        chunking: Option<&ChunkingConfig>,
    ) -> Result<Response> {
        let started = Instant::now();
        let provider = self.router.catalog().resolve(&self.options.provider)?;
        let config = chunking.unwrap_or(&self.router.config().chunking);

        let chunks = self.router.chunker_for(provider).chunk(text, config)?;
        ensure_chunks(&chunks)?;
        let total = chunks.len();
        info!(chunks = total, seeded = self.seed.is_some(), "Starting refinement");

        let mut state = self.seed.clone().unwrap_or_default();
        let mut steps: Vec<ExecutionResult> = Vec::with_capacity(total);

        for chunk in &chunks {
            if let Some(token) = &self.cancellation {
                if token.is_cancelled() {
                    return Err(GatewayError::Cancelled(format!(
                        "Operation cancelled before step {} of {}",
                        chunk.ordinal + 1,
                        total
                    )));
                }
            }

            let prompt = prompt::refine_prompt(instructions, &state, chunk, total, self.annotate);
            let ctx = CallContext::new(operation_id, Phase::Refine).with_ordinal(chunk.ordinal);
            let options = self.step_options(chunk.ordinal + 1 == total);
            let step = self
                .router
                .execute(&prompt, &options, ctx)
                .await
                .map_err(|e| {
                    GatewayError::chunk_processing(Phase::Refine, chunk.ordinal, total, e)
                })?;

            debug!(
                ordinal = chunk.ordinal,
                provider = %step.provider_used,
                "Refinement step completed"
            );
            self.router.notify(ProcessingEvent::ChunkCompleted {
                operation_id,
                phase: Phase::Refine,
                ordinal: chunk.ordinal,
                total,
                provider: step.provider_used.clone(),
                usage: step.usage,
            });

            state = step.output.text.clone();
            steps.push(step);
        }

        let usage = total_usage(&steps);
        let elapsed = started.elapsed();
        self.router.notify(ProcessingEvent::RefinementCompleted {
            operation_id,
            chunks: total,
            usage,
            elapsed,
        });

        let mut phase_usage = BTreeMap::new();
        phase_usage.insert(Phase::Refine, usage);

        let last = steps.last();
        Ok(Response {
            text: state,
            structured: last
                .and_then(|step| structured_payload(&step.output, self.options.response_format)),
            usage,
            metadata: ResponseMetadata {
                operation_id,
                mode: ProcessingMode::Iterative,
                fallback_used: steps.iter().any(|step| step.used_fallback),
                original_provider: provider.id.clone(),
                provider_used: last
                    .map(|step| step.provider_used.clone())
                    .unwrap_or_else(|| provider.id.clone()),
                providers_tried: providers_tried(&steps),
                total_chunks: Some(total),
                phase_usage,
                backend_attempts: total_attempts(&steps),
                elapsed,
            },
        })
    }
}
