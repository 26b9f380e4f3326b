//! Configuration management for the request layer
//!
//! Configuration is loaded once at startup and read-only afterwards. Every
//! default here can be overridden per call.

pub mod models;
pub mod validation;

pub use models::*;
pub use validation::Validate;

use crate::core::chunking::ChunkStrategy;
use crate::core::router::ProviderCatalog;
use crate::utils::error::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Prefix of every environment variable read by [`Config::from_env`]
pub const ENV_PREFIX: &str = "CTXGATE_";

/// Main configuration struct
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Provider catalog entries
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    /// Router defaults
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading configuration from: {:?}", path);

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GatewayError::Config(format!("Failed to read config file: {}", e)))?;

        let config = Self::from_yaml_str(&content)?;
        debug!("Configuration loaded successfully");
        Ok(config)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| GatewayError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables
    ///
    /// Reads a `.env` file first when one exists. See
    /// [`Config::apply_overrides`] for the recognized variables.
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");
        // A missing .env file is fine
        let _ = dotenvy::dotenv();

        let mut config = Self::default();
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `CTXGATE_*` overrides from `lookup`
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `CTXGATE_PROVIDERS` | providers, as `id:context_limit:reserved[:fallback]` entries separated by commas |
    /// | `CTXGATE_DEFAULT_PROVIDER` | `router.default_provider` |
    /// | `CTXGATE_FALLBACK_ENABLED` | `router.fallback_enabled` |
    /// | `CTXGATE_CHUNK_STRATEGY` | `router.chunking.strategy` |
    /// | `CTXGATE_MAX_TOKENS_PER_CHUNK` | `router.chunking.max_tokens_per_chunk` |
    /// | `CTXGATE_OVERLAP_TOKENS` | `router.chunking.overlap_tokens` |
    /// | `CTXGATE_MAX_IN_FLIGHT` | `router.max_in_flight` |
    /// | `CTXGATE_TIMEOUT_SECS` | `router.timeout_secs` |
    /// | `CTXGATE_NUM_RETRIES` | `router.num_retries` |
    /// | `CTXGATE_LOG_LEVEL` | `logging.level` |
    /// | `CTXGATE_LOG_FORMAT` | `logging.format` (`text` or `json`) |
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(value) = var("PROVIDERS") {
            self.providers = parse_provider_list(&value)?;
        }
        if let Some(value) = var("DEFAULT_PROVIDER") {
            self.router.default_provider = Some(value);
        }
        if let Some(value) = var("FALLBACK_ENABLED") {
            self.router.fallback_enabled = parse_value("FALLBACK_ENABLED", &value)?;
        }
        if let Some(value) = var("CHUNK_STRATEGY") {
            self.router.chunking.strategy = parse_strategy(&value)?;
        }
        if let Some(value) = var("MAX_TOKENS_PER_CHUNK") {
            self.router.chunking.max_tokens_per_chunk =
                parse_value("MAX_TOKENS_PER_CHUNK", &value)?;
        }
        if let Some(value) = var("OVERLAP_TOKENS") {
            self.router.chunking.overlap_tokens = parse_value("OVERLAP_TOKENS", &value)?;
        }
        if let Some(value) = var("MAX_IN_FLIGHT") {
            self.router.max_in_flight = parse_value("MAX_IN_FLIGHT", &value)?;
        }
        if let Some(value) = var("TIMEOUT_SECS") {
            self.router.timeout_secs = Some(parse_value("TIMEOUT_SECS", &value)?);
        }
        if let Some(value) = var("NUM_RETRIES") {
            self.router.num_retries = parse_value("NUM_RETRIES", &value)?;
        }
        if let Some(value) = var("LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = var("LOG_FORMAT") {
            self.logging.format = match value.to_ascii_lowercase().as_str() {
                "text" => LogFormat::Text,
                "json" => LogFormat::Json,
                other => {
                    return Err(GatewayError::Config(format!(
                        "Invalid {}LOG_FORMAT: {}",
                        ENV_PREFIX, other
                    )));
                }
            };
        }
        Ok(())
    }

    /// Build the provider catalog described by this configuration
    pub fn catalog(&self) -> Result<ProviderCatalog> {
        ProviderCatalog::new(self.providers.clone())
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        debug!("Validating configuration");

        self.router
            .validate()
            .map_err(|e| GatewayError::Config(format!("Router config error: {}", e)))?;

        self.logging
            .validate()
            .map_err(|e| GatewayError::Config(format!("Logging config error: {}", e)))?;

        for provider in &self.providers {
            provider
                .validate()
                .map_err(|e| GatewayError::Config(format!("Provider config error: {}", e)))?;
        }

        let catalog = self.catalog()?;
        catalog.check_acyclic()?;

        if let Some(default_provider) = &self.router.default_provider {
            if catalog.get(default_provider).is_none() {
                return Err(GatewayError::Config(format!(
                    "Default provider {} is not in the catalog",
                    default_provider
                )));
            }
        }

        debug!("Configuration validation completed");
        Ok(())
    }

    /// Merge with another configuration (other takes precedence)
    ///
    /// Providers are matched by id; entries only in `other` are appended.
    pub fn merge(mut self, other: Self) -> Self {
        for provider in other.providers {
            match self.providers.iter_mut().find(|p| p.id == provider.id) {
                Some(existing) => *existing = provider,
                None => self.providers.push(provider),
            }
        }
        self.router = self.router.merge(other.router);
        if other.logging != LoggingConfig::default() {
            self.logging = other.logging;
        }
        self
    }

    /// Convert to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self)
            .map_err(|e| GatewayError::Config(format!("Failed to serialize config to YAML: {}", e)))
    }
}

fn parse_value<T>(name: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| GatewayError::Config(format!("Invalid {}{}: {}", ENV_PREFIX, name, e)))
}

fn parse_strategy(value: &str) -> Result<ChunkStrategy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "sentence" => Ok(ChunkStrategy::Sentence),
        "paragraph" => Ok(ChunkStrategy::Paragraph),
        "fixed" | "fixed_size" | "fixed-size" => Ok(ChunkStrategy::FixedSize),
        other => Err(GatewayError::Config(format!(
            "Invalid {}CHUNK_STRATEGY: {}",
            ENV_PREFIX, other
        ))),
    }
}

/// Parse `id:context_limit:reserved[:fallback]` entries separated by commas
fn parse_provider_list(value: &str) -> Result<Vec<ProviderConfig>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
            let invalid = || {
                GatewayError::Config(format!(
                    "Invalid {}PROVIDERS entry '{}', expected id:context_limit:reserved[:fallback]",
                    ENV_PREFIX, entry
                ))
            };
            if !(3..=4).contains(&parts.len()) {
                return Err(invalid());
            }
            let context_limit = parts[1].parse().map_err(|_| invalid())?;
            let reserved = parts[2].parse().map_err(|_| invalid())?;
            let mut provider = ProviderConfig::new(parts[0], context_limit, reserved);
            if let Some(target) = parts.get(3).filter(|t| !t.is_empty()) {
                provider = provider.with_fallback(*target);
            }
            Ok(provider)
        })
        .collect()
}
