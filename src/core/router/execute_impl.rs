//! Execution implementation for Router
//!
//! This module contains the execute and execute_with_retry methods: context
//! window validation, the fallback walk, and per-call retries.

use super::execution::{CallContext, ExecutionResult, calculate_retry_delay};
use super::fallback::FallbackResolver;
use super::router::Router;
use super::validator::{self, ContextOverflow};
use crate::core::events::ProcessingEvent;
use crate::core::providers::unified_provider::ProviderError;
use crate::core::providers::{InvokeOptions, InvokeOutput};
use crate::core::types::{CallOptions, UsageRecord};
use crate::utils::error::{GatewayError, Result};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

impl Router {
    /// Route one prompt to the first provider on the fallback chain that fits it
    ///
    /// Starting at `options.provider`, the prompt is estimated with each
    /// provider's family and validated against its context window. With
    /// fallback enabled a prompt that does not fit moves on to the next
    /// provider; a backend that reports a context overflow itself is treated
    /// the same way. Other backend errors are returned unchanged.
    pub async fn execute(
        &self,
        prompt: &str,
        options: &CallOptions,
        ctx: CallContext,
    ) -> Result<ExecutionResult> {
        let original = self.catalog.resolve(&options.provider)?;
        let fallback_enabled = options
            .fallback_enabled
            .unwrap_or(self.config.fallback_enabled);
        let mut walk = FallbackResolver::new(&self.catalog).walk(original);
        let mut attempts = 0;

        loop {
            let provider = walk.current();
            let prompt_tokens = self.estimator.estimate(prompt, provider.family());
            let reservation = validator::output_reservation(options.max_output_tokens, provider);

            let overflow = match validator::validate(prompt_tokens, reservation, provider) {
                Ok(()) => {
                    debug!(
                        operation_id = %ctx.operation_id,
                        phase = %ctx.phase,
                        provider = %provider.id,
                        prompt_tokens,
                        "Prompt fits provider"
                    );
                    let invoke_options = InvokeOptions {
                        provider: provider.id.clone(),
                        max_output_tokens: validator::output_cap(
                            options.max_output_tokens,
                            provider,
                        ),
                        temperature: options.temperature.or(self.config.temperature),
                        response_format: options.response_format,
                    };

                    match self.execute_with_retry(prompt, &invoke_options).await {
                        Ok((output, latency, tries)) => {
                            attempts += tries;
                            let usage = UsageRecord::from_call(output.usage, latency);
                            let provider_used = provider.id.clone();
                            let attempted = walk.into_chain();
                            return Ok(ExecutionResult {
                                output,
                                usage,
                                original_provider: original.id.clone(),
                                used_fallback: provider_used != original.id,
                                provider_used,
                                attempted,
                                attempts,
                            });
                        }
                        Err((ProviderError::ContextLengthExceeded { max, actual, .. }, tries)) => {
                            attempts += tries;
                            warn!(
                                operation_id = %ctx.operation_id,
                                provider = %provider.id,
                                estimated = prompt_tokens,
                                reported = actual,
                                "Backend reported context overflow"
                            );
                            ContextOverflow {
                                prompt_tokens: u32::try_from(actual).unwrap_or(u32::MAX),
                                max_tokens: u32::try_from(max).unwrap_or(u32::MAX),
                                provider: provider.id.clone(),
                            }
                        }
                        Err((err, _)) => return Err(GatewayError::Provider(err)),
                    }
                }
                Err(overflow) => overflow,
            };

            if !fallback_enabled {
                return Err(overflow.into_error(walk.into_chain()));
            }

            match walk.advance()? {
                Some(next) => {
                    info!(
                        operation_id = %ctx.operation_id,
                        from = %overflow.provider,
                        to = %next.id,
                        prompt_tokens = overflow.prompt_tokens,
                        max_tokens = overflow.max_tokens,
                        "Falling back to larger context window"
                    );
                    self.notify(ProcessingEvent::FallbackTriggered {
                        operation_id: ctx.operation_id,
                        from: overflow.provider.clone(),
                        to: next.id.clone(),
                        prompt_tokens: overflow.prompt_tokens,
                        max_tokens: overflow.max_tokens,
                        at: chrono::Utc::now(),
                    });
                }
                None => return Err(overflow.into_error(walk.into_chain())),
            }
        }
    }

    /// Execute a single backend call with retry logic
    ///
    /// Retries transient errors up to `num_retries` times. Returns the output,
    /// the total latency across attempts and the number of attempts made.
    pub async fn execute_with_retry(
        &self,
        prompt: &str,
        options: &InvokeOptions,
    ) -> std::result::Result<(InvokeOutput, Duration, u32), (ProviderError, u32)> {
        let max_attempts = self.config.num_retries + 1;
        let start = Instant::now();
        let mut attempt = 1;

        loop {
            match self.invoker.invoke(prompt, options).await {
                Ok(output) => return Ok((output, start.elapsed(), attempt)),
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let delay = calculate_retry_delay(&self.config, attempt, &err);
                    warn!(
                        provider = %options.provider,
                        attempt,
                        max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying backend call: {}",
                        err
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => return Err((err, attempt)),
            }
        }
    }
}
