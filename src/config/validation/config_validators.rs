//! Configuration validators
//!
//! Field-level checks for each configuration section. Checks that need the
//! whole provider set (unique ids, dangling fallbacks, cycles) live in
//! [`ProviderCatalog`](crate::core::router::ProviderCatalog).

use super::trait_def::Validate;
use crate::config::models::*;
use crate::core::chunking::ChunkingConfig;
use tracing::debug;
use tracing_subscriber::EnvFilter;

impl Validate for ChunkingConfig {
    fn validate(&self) -> Result<(), String> {
        self.check().map_err(|e| e.to_string())
    }
}

impl Validate for RouterConfig {
    fn validate(&self) -> Result<(), String> {
        debug!("Validating router configuration");

        self.chunking
            .validate()
            .map_err(|e| format!("Chunking config error: {}", e))?;

        if self.max_in_flight == 0 {
            return Err("max_in_flight must be greater than 0".to_string());
        }

        if self.timeout_secs == Some(0) {
            return Err("timeout_secs must be greater than 0 when set".to_string());
        }

        if self.retry_max_delay_ms < self.retry_base_delay_ms {
            return Err("Retry max delay must not be less than base delay".to_string());
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(format!("Temperature {} is outside 0.0..=2.0", temperature));
            }
        }

        if let Some(provider) = &self.default_provider {
            if provider.trim().is_empty() {
                return Err("default_provider must not be empty".to_string());
            }
        }

        Ok(())
    }
}

impl Validate for ProviderConfig {
    fn validate(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("Provider id must not be empty".to_string());
        }

        if self.context_limit == 0 {
            return Err(format!("Provider {} context_limit must be greater than 0", self.id));
        }

        if self.reserved_output_tokens >= self.context_limit {
            return Err(format!(
                "Provider {} reserved_output_tokens ({}) must be less than context_limit ({})",
                self.id, self.reserved_output_tokens, self.context_limit
            ));
        }

        if let Some(target) = &self.fallback {
            if target.trim().is_empty() {
                return Err(format!("Provider {} has an empty fallback target", self.id));
            }
        }

        if self.aliases.iter().any(|alias| alias.trim().is_empty()) {
            return Err(format!("Provider {} has an empty alias", self.id));
        }

        Ok(())
    }
}

impl Validate for LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        EnvFilter::try_new(&self.level)
            .map(|_| ())
            .map_err(|e| format!("Invalid log level '{}': {}", self.level, e))
    }
}
