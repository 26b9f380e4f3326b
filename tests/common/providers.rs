//! Provider test utilities
//!
//! A scripted [`Invoker`] that records every call and answers with sentinel
//! outputs, so tests can check what reached the backend and in which order.
//!
//! Default answers:
//! - a prompt that contains map outputs (`OUT[..]`) is a reduce call and gets `FINAL`
//! - a refinement prompt labelled `[Part i of n]` gets `S{i}`
//! - a map prompt labelled `[Part i of n]` gets `OUT[{i}]`
//! - anything else gets `DIRECT`

use async_trait::async_trait;
use ctxgate::{InvokeOptions, InvokeOutput, Invoker, ProviderError, TokenUsage};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

static PART_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[Part (\d+) of (\d+)\]").expect("Invalid part label regex"));

/// One call seen by the invoker
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub prompt: String,
    pub options: InvokeOptions,
    pub usage: TokenUsage,
}

/// How long each call takes
#[derive(Debug, Clone, Copy)]
enum Latency {
    None,
    Fixed(Duration),
    /// `step * (n - i + 1)` for part `i` of `n`, so later parts finish first
    Reversed(Duration),
}

#[derive(Debug)]
struct Failure {
    marker: String,
    error: ProviderError,
}

/// Scripted invoker for integration tests
#[derive(Debug)]
pub struct ScriptedInvoker {
    calls: Mutex<Vec<RecordedCall>>,
    failures: Mutex<Vec<Failure>>,
    latency: Mutex<Latency>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    abandoned: AtomicUsize,
}

impl ScriptedInvoker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            failures: Mutex::new(Vec::new()),
            latency: Mutex::new(Latency::None),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            abandoned: AtomicUsize::new(0),
        })
    }

    /// Fail every call whose prompt contains `marker`
    pub fn fail_on(&self, marker: impl Into<String>, error: ProviderError) {
        self.failures.lock().push(Failure {
            marker: marker.into(),
            error,
        });
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Latency::Fixed(latency);
    }

    /// Make later parts finish before earlier ones
    pub fn set_reversed_latency(&self, step: Duration) {
        *self.latency.lock() = Latency::Reversed(step);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Calls whose prompt contains `needle`
    pub fn calls_containing(&self, needle: &str) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .iter()
            .filter(|call| call.prompt.contains(needle))
            .cloned()
            .collect()
    }

    /// Highest number of calls in flight at once
    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    /// Calls dropped before they completed
    pub fn abandoned(&self) -> usize {
        self.abandoned.load(Ordering::SeqCst)
    }

    fn delay_for(&self, prompt: &str) -> Option<Duration> {
        match *self.latency.lock() {
            Latency::None => None,
            Latency::Fixed(delay) => Some(delay),
            Latency::Reversed(step) => {
                let (part, total) = part_label(prompt).unwrap_or((1, 1));
                Some(step * (total - part + 1) as u32)
            }
        }
    }

    fn answer(prompt: &str) -> String {
        if prompt.contains("OUT[") {
            return "FINAL".to_string();
        }
        match part_label(prompt) {
            Some((part, _)) if prompt.contains("Current state:") => format!("S{}", part),
            Some((part, _)) => format!("OUT[{}]", part),
            None => "DIRECT".to_string(),
        }
    }
}

/// `(i, n)` from the last `[Part i of n]` label in `prompt`
pub fn part_label(prompt: &str) -> Option<(usize, usize)> {
    let captures = PART_LABEL.captures_iter(prompt).last()?;
    let part = captures[1].parse().ok()?;
    let total = captures[2].parse().ok()?;
    Some((part, total))
}

/// Tracks one call in flight; counts the call as abandoned if dropped early
struct InFlight<'a> {
    invoker: &'a ScriptedInvoker,
    completed: bool,
}

impl<'a> InFlight<'a> {
    fn enter(invoker: &'a ScriptedInvoker) -> Self {
        let now = invoker.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        invoker.peak.fetch_max(now, Ordering::SeqCst);
        Self {
            invoker,
            completed: false,
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.invoker.in_flight.fetch_sub(1, Ordering::SeqCst);
        if !self.completed {
            self.invoker.abandoned.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl Invoker for ScriptedInvoker {
    async fn invoke(
        &self,
        prompt: &str,
        options: &InvokeOptions,
    ) -> Result<InvokeOutput, ProviderError> {
        let mut guard = InFlight::enter(self);

        if let Some(delay) = self.delay_for(prompt) {
            tokio::time::sleep(delay).await;
        }

        let failure = self
            .failures
            .lock()
            .iter()
            .find(|failure| prompt.contains(&failure.marker))
            .map(|failure| failure.error.clone());

        let text = Self::answer(prompt);
        let usage = TokenUsage::new(
            prompt.chars().count() as u32,
            text.chars().count() as u32,
        );
        self.calls.lock().push(RecordedCall {
            prompt: prompt.to_string(),
            options: options.clone(),
            usage,
        });
        guard.completed = true;

        match failure {
            Some(error) => Err(error),
            None => Ok(InvokeOutput::new(text, usage)),
        }
    }
}
