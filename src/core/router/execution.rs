//! Execution helpers for router operations
//!
//! Retry backoff, deadline and cancellation guards, and the result record of a
//! single routed call.

use crate::config::RouterConfig;
use crate::core::providers::InvokeOutput;
use crate::core::providers::unified_provider::ProviderError;
use crate::core::types::{Phase, UsageRecord};
use crate::utils::error::{GatewayError, Result};
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Where a routed call sits inside its logical operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    pub operation_id: Uuid,
    pub phase: Phase,
    /// Chunk ordinal for map and refinement calls
    pub ordinal: Option<usize>,
}

impl CallContext {
    pub fn new(operation_id: Uuid, phase: Phase) -> Self {
        Self {
            operation_id,
            phase,
            ordinal: None,
        }
    }

    pub fn with_ordinal(mut self, ordinal: usize) -> Self {
        self.ordinal = Some(ordinal);
        self
    }
}

/// Execution result with metadata
///
/// Contains the backend output of one routed call along with the providers
/// it went through.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    pub output: InvokeOutput,
    /// Usage of the successful backend call, latency includes retries
    pub usage: UsageRecord,
    /// Provider the call was addressed to, after alias resolution
    pub original_provider: String,
    /// Provider that produced the output
    pub provider_used: String,
    /// Providers visited in fallback order, `provider_used` last
    pub attempted: Vec<String>,
    pub used_fallback: bool,
    /// Backend calls made, retries and overflowing providers included
    pub attempts: u32,
}

/// Calculate retry delay using exponential backoff
///
/// A `retry_after` hint from the backend takes precedence. Otherwise the
/// delay is `base * 2^(attempt - 1)`. Both are capped at
/// `retry_max_delay_ms`.
pub fn calculate_retry_delay(
    config: &RouterConfig,
    attempt: u32,
    error: &ProviderError,
) -> Duration {
    let max = config.retry_max_delay_ms;
    let delay_ms = match error.retry_delay() {
        Some(secs) => secs.saturating_mul(1000),
        None => {
            let factor = 2_u64.saturating_pow(attempt.saturating_sub(1));
            config.retry_base_delay_ms.saturating_mul(factor)
        }
    };
    Duration::from_millis(delay_ms.min(max))
}

/// Run `future` under an optional deadline and cancellation token
///
/// Dropping `future` on timeout or cancellation drops everything it has in
/// flight.
pub async fn run_guarded<T, F>(
    future: F,
    timeout: Option<Duration>,
    cancellation: Option<&CancellationToken>,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let deadline = async {
        match timeout {
            Some(limit) => match tokio::time::timeout(limit, future).await {
                Ok(result) => result,
                Err(_) => Err(GatewayError::Timeout(format!(
                    "Operation did not complete within {:?}",
                    limit
                ))),
            },
            None => future.await,
        }
    };

    match cancellation {
        Some(token) => {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    Err(GatewayError::Cancelled("Operation cancelled by caller".to_string()))
                }
                result = deadline => result,
            }
        }
        None => deadline.await,
    }
}
