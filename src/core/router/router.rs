//! Router core structure
//!
//! The [`Router`] is the single entry point of the request layer. It owns the
//! provider catalog, the invoker, the token estimator and the event sink, and
//! routes each request either directly (with validation and fallback) or
//! through one of the chunked orchestrators.

use super::catalog::ProviderCatalog;
use super::execution::{CallContext, run_guarded};
use crate::config::{Config, ProviderConfig, RouterConfig};
use crate::core::chunking::{Chunker, ChunkingConfig};
use crate::core::events::{EventSink, ProcessingEvent, TracingSink};
use crate::core::orchestrator::{IterativeRefiner, MapReduceOrchestrator};
use crate::core::providers::{InvokeOutput, Invoker};
use crate::core::types::{
    CallOptions, ChunkedProcessing, Phase, ProcessingMode, Request, Response, ResponseFormat,
    ResponseMetadata,
};
use crate::utils::ai::{TokenCounter, TokenEstimator};
use crate::utils::error::{GatewayError, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info_span, warn};
use uuid::Uuid;

/// Context-window aware router
///
/// Cheap to share behind an `Arc`; all state is read-only after construction.
pub struct Router {
    /// Provider table and fallback graph
    pub(crate) catalog: Arc<ProviderCatalog>,

    /// Backend call seam
    pub(crate) invoker: Arc<dyn Invoker>,

    /// Token estimator used for validation and chunking
    pub(crate) estimator: Arc<dyn TokenEstimator>,

    /// Router configuration
    pub(crate) config: RouterConfig,

    /// Fire-and-forget event sink
    pub(crate) events: Arc<dyn EventSink>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("catalog", &self.catalog)
            .field("estimator", &self.estimator)
            .field("config", &self.config)
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

impl Router {
    /// Create a router over `catalog` that calls `invoker`
    pub fn new(catalog: ProviderCatalog, invoker: Arc<dyn Invoker>) -> Self {
        Self {
            catalog: Arc::new(catalog),
            invoker,
            estimator: Arc::new(TokenCounter::new()),
            config: RouterConfig::default(),
            events: Arc::new(TracingSink),
        }
    }

    /// Create a router from loaded configuration
    pub fn from_config(config: &Config, invoker: Arc<dyn Invoker>) -> Result<Self> {
        config.validate()?;
        let catalog = config.catalog()?;
        Ok(Self::new(catalog, invoker).with_config(config.router.clone()))
    }

    /// Set router configuration (builder pattern)
    pub fn with_config(mut self, config: RouterConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the token estimator (builder pattern)
    pub fn with_estimator(mut self, estimator: Arc<dyn TokenEstimator>) -> Self {
        self.estimator = estimator;
        self
    }

    /// Replace the event sink (builder pattern)
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    pub fn estimator(&self) -> &Arc<dyn TokenEstimator> {
        &self.estimator
    }

    /// Chunker that estimates with `provider`'s token family
    pub fn chunker_for(&self, provider: &ProviderConfig) -> Chunker {
        Chunker::new(Arc::clone(&self.estimator), provider.family())
    }

    /// Deliver an event without letting the sink affect the caller
    pub(crate) fn notify(&self, event: ProcessingEvent) {
        let sink = &self.events;
        if std::panic::catch_unwind(AssertUnwindSafe(|| sink.emit(event))).is_err() {
            warn!("Event sink panicked, event dropped");
        }
    }

    // ========== Entry Points ==========

    /// Process one request
    ///
    /// Direct requests are validated against the addressed provider and
    /// follow its fallback chain when they do not fit. Requests carrying
    /// [`ChunkedProcessing`] run through map-reduce or iterative refinement
    /// with the request's provider as the per-chunk target.
    pub async fn call_model(&self, request: Request) -> Result<Response> {
        let Request {
            prompt,
            options,
            chunked,
            timeout,
            cancellation,
        } = request;

        match chunked {
            Some(ChunkedProcessing::MapReduce {
                map_instruction,
                reduce_instruction,
                chunking,
            }) => {
                let mut orchestrator = MapReduceOrchestrator::new(self, options);
                if let Some(timeout) = timeout {
                    orchestrator = orchestrator.with_timeout(timeout);
                }
                if let Some(token) = cancellation {
                    orchestrator = orchestrator.with_cancellation(token);
                }
                orchestrator
                    .run(&prompt, &map_instruction, &reduce_instruction, chunking.as_ref())
                    .await
            }
            Some(ChunkedProcessing::Iterative {
                instructions,
                seed,
                chunking,
            }) => {
                let mut refiner = IterativeRefiner::new(self, options);
                if let Some(seed) = seed {
                    refiner = refiner.with_seed(seed);
                }
                if let Some(timeout) = timeout {
                    refiner = refiner.with_timeout(timeout);
                }
                if let Some(token) = cancellation {
                    refiner = refiner.with_cancellation(token);
                }
                refiner.run(&prompt, &instructions, chunking.as_ref()).await
            }
            None => {
                let operation_id = Uuid::new_v4();
                let started = Instant::now();
                let span = info_span!("call_model", %operation_id, provider = %options.provider);
                let ctx = CallContext::new(operation_id, Phase::Direct);

                let result = run_guarded(
                    self.execute(&prompt, &options, ctx),
                    timeout.or_else(|| self.config.timeout()),
                    cancellation.as_ref(),
                )
                .instrument(span)
                .await?;

                let structured = structured_payload(&result.output, options.response_format);
                let mut phase_usage = BTreeMap::new();
                phase_usage.insert(Phase::Direct, result.usage);

                Ok(Response {
                    text: result.output.text,
                    structured,
                    usage: result.usage,
                    metadata: ResponseMetadata {
                        operation_id,
                        mode: ProcessingMode::Direct,
                        fallback_used: result.used_fallback,
                        original_provider: result.original_provider,
                        provider_used: result.provider_used,
                        providers_tried: result.attempted,
                        total_chunks: None,
                        phase_usage,
                        backend_attempts: result.attempts,
                        elapsed: started.elapsed(),
                    },
                })
            }
        }
    }

    /// Map-reduce `text` on the configured default provider
    ///
    /// `chunking` overrides the configured chunking defaults.
    pub async fn map_reduce(
        &self,
        text: &str,
        map_instruction: &str,
        reduce_instruction: &str,
        chunking: Option<ChunkingConfig>,
    ) -> Result<Response> {
        let options = self.default_options()?;
        MapReduceOrchestrator::new(self, options)
            .run(text, map_instruction, reduce_instruction, chunking.as_ref())
            .await
    }

    /// Iteratively refine over `text` on the configured default provider
    ///
    /// `chunking` overrides the configured chunking defaults.
    pub async fn iterative_refinement(
        &self,
        text: &str,
        instructions: &str,
        chunking: Option<ChunkingConfig>,
    ) -> Result<Response> {
        let options = self.default_options()?;
        IterativeRefiner::new(self, options)
            .run(text, instructions, chunking.as_ref())
            .await
    }

    fn default_options(&self) -> Result<CallOptions> {
        self.config
            .default_provider
            .as_deref()
            .map(CallOptions::new)
            .ok_or_else(|| {
                GatewayError::InvalidRequest(
                    "No provider given and no default provider configured".to_string(),
                )
            })
    }
}

/// Structured payload for the final output of an operation
///
/// A payload returned by the invoker wins. For JSON responses without one,
/// the text is parsed; text that is not valid JSON leaves the payload empty.
pub(crate) fn structured_payload(output: &InvokeOutput, format: ResponseFormat) -> Option<Value> {
    match format {
        ResponseFormat::Text => output.structured.clone(),
        ResponseFormat::Json => output
            .structured
            .clone()
            .or_else(|| serde_json::from_str(output.text.trim()).ok()),
    }
}
