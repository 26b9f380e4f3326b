//! Provider catalog entries

use serde::{Deserialize, Serialize};

/// One backend in the provider catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Unique provider id, also passed to the invoker
    pub id: String,
    /// Maximum tokens across prompt and output
    pub context_limit: u32,
    /// Output tokens always held back from the input budget
    ///
    /// Zero leaves the output cap to the backend; validation still holds back
    /// one token.
    #[serde(default)]
    pub reserved_output_tokens: u32,
    /// Provider to try next when a prompt does not fit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    /// Estimator family; the id is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    /// Alternative names resolving to this provider
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl ProviderConfig {
    pub fn new(id: impl Into<String>, context_limit: u32, reserved_output_tokens: u32) -> Self {
        Self {
            id: id.into(),
            context_limit,
            reserved_output_tokens,
            fallback: None,
            family: None,
            aliases: Vec::new(),
        }
    }

    pub fn with_fallback(mut self, target: impl Into<String>) -> Self {
        self.fallback = Some(target.into());
        self
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Input tokens available once the reserved output is held back
    pub fn effective_input_budget(&self) -> u32 {
        self.context_limit.saturating_sub(self.reserved_output_tokens)
    }

    /// Family name handed to the token estimator
    pub fn family(&self) -> &str {
        self.family.as_deref().unwrap_or(&self.id)
    }
}
