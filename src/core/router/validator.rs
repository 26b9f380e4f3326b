//! Context window validation
//!
//! Pure fit/no-fit decisions. Nothing here estimates tokens or calls a
//! backend.

use crate::config::ProviderConfig;
use crate::utils::error::GatewayError;

/// A prompt that does not fit a provider's context window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextOverflow {
    pub prompt_tokens: u32,
    /// Largest prompt the provider accepts with the requested output reservation
    pub max_tokens: u32,
    pub provider: String,
}

impl ContextOverflow {
    /// Turn into the caller-facing error with the chain of providers attempted
    pub fn into_error(self, attempted: Vec<String>) -> GatewayError {
        GatewayError::context_window_exceeded(
            self.prompt_tokens,
            self.max_tokens,
            self.provider,
            attempted,
        )
    }
}

/// Check that `prompt_tokens + output_tokens <= provider.context_limit`
pub fn validate(
    prompt_tokens: u32,
    output_tokens: u32,
    provider: &ProviderConfig,
) -> Result<(), ContextOverflow> {
    let needed = u64::from(prompt_tokens) + u64::from(output_tokens);
    if needed <= u64::from(provider.context_limit) {
        Ok(())
    } else {
        Err(ContextOverflow {
            prompt_tokens,
            max_tokens: provider.context_limit.saturating_sub(output_tokens),
            provider: provider.id.clone(),
        })
    }
}

/// Smallest output reservation ever validated against
///
/// A prompt may never fill the whole window, even on a provider configured
/// without a reservation.
pub const MIN_OUTPUT_RESERVATION: u32 = 1;

/// Output tokens to reserve for a call against `provider`
///
/// The provider's reservation is a floor; a larger explicit cap wins.
pub fn output_reservation(requested: Option<u32>, provider: &ProviderConfig) -> u32 {
    let reservation = match requested {
        Some(cap) => cap.max(provider.reserved_output_tokens),
        None => provider.reserved_output_tokens,
    };
    reservation.max(MIN_OUTPUT_RESERVATION)
}

/// Output cap sent to the backend
///
/// An explicit cap wins, then the provider's reservation. `None` leaves the
/// backend's own default in place.
pub fn output_cap(requested: Option<u32>, provider: &ProviderConfig) -> Option<u32> {
    requested.or(Some(provider.reserved_output_tokens).filter(|&reserved| reserved > 0))
}
