//! Token usage accounting

use serde::{Deserialize, Serialize};
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::time::Duration;

/// Token usage reported by a single backend call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Tokens consumed by the prompt
    pub prompt_tokens: u32,
    /// Tokens produced by the completion
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }

    pub fn total_tokens(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// Usage summed across every backend call made for one logical request
///
/// `latency` is the sum of per-call latencies, not wall-clock time; the
/// elapsed wall-clock time lives in
/// [`ResponseMetadata::elapsed`](super::ResponseMetadata::elapsed).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub latency: Duration,
    /// Number of backend calls folded into this record
    pub calls: u32,
}

impl UsageRecord {
    /// Record for one backend call
    pub fn from_call(usage: TokenUsage, latency: Duration) -> Self {
        Self {
            prompt_tokens: u64::from(usage.prompt_tokens),
            completion_tokens: u64::from(usage.completion_tokens),
            total_tokens: u64::from(usage.total_tokens()),
            latency,
            calls: 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.calls == 0
    }
}

impl Add for UsageRecord {
    type Output = UsageRecord;

    fn add(self, rhs: UsageRecord) -> UsageRecord {
        UsageRecord {
            prompt_tokens: self.prompt_tokens + rhs.prompt_tokens,
            completion_tokens: self.completion_tokens + rhs.completion_tokens,
            total_tokens: self.total_tokens + rhs.total_tokens,
            latency: self.latency + rhs.latency,
            calls: self.calls + rhs.calls,
        }
    }
}

impl AddAssign for UsageRecord {
    fn add_assign(&mut self, rhs: UsageRecord) {
        *self = *self + rhs;
    }
}

impl Sum for UsageRecord {
    fn sum<I: Iterator<Item = UsageRecord>>(iter: I) -> Self {
        iter.fold(UsageRecord::default(), Add::add)
    }
}

impl<'a> Sum<&'a UsageRecord> for UsageRecord {
    fn sum<I: Iterator<Item = &'a UsageRecord>>(iter: I) -> Self {
        iter.copied().sum()
    }
}
