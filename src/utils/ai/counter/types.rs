//! Token counter types and configurations

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default multiplier applied on top of the ratio-based count
pub const DEFAULT_SAFETY_MARGIN: f64 = 1.1;

/// Model family token estimation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelTokenConfig {
    /// Model family name
    pub model: String,
    /// Average ASCII characters per token
    pub chars_per_token: f64,
    /// Multiplier applied to the raw estimate, at least 1.0
    #[serde(default = "default_safety_margin")]
    pub safety_margin: f64,
}

fn default_safety_margin() -> f64 {
    DEFAULT_SAFETY_MARGIN
}

impl ModelTokenConfig {
    pub fn new(model: impl Into<String>, chars_per_token: f64) -> Self {
        Self {
            model: model.into(),
            chars_per_token,
            safety_margin: DEFAULT_SAFETY_MARGIN,
        }
    }

    pub fn with_safety_margin(mut self, margin: f64) -> Self {
        self.safety_margin = margin;
        self
    }

    /// Create default model family configurations
    pub(super) fn default_configs() -> HashMap<String, ModelTokenConfig> {
        let mut configs = HashMap::new();

        // GPT-4 family
        configs.insert("gpt-4".to_string(), ModelTokenConfig::new("gpt-4", 4.0));

        // GPT-3.5 family
        configs.insert(
            "gpt-3.5-turbo".to_string(),
            ModelTokenConfig::new("gpt-3.5-turbo", 4.0),
        );

        // Claude family
        configs.insert("claude-3".to_string(), ModelTokenConfig::new("claude-3", 3.5));
        configs.insert("claude-2".to_string(), ModelTokenConfig::new("claude-2", 3.5));

        // Gemini family
        configs.insert("gemini".to_string(), ModelTokenConfig::new("gemini", 4.0));

        // Default configuration
        configs.insert("default".to_string(), ModelTokenConfig::new("default", 4.0));

        configs
    }
}
