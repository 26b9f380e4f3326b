//! Processing events
//!
//! Fallback hops and chunk progress are reported as [`ProcessingEvent`]s to an
//! [`EventSink`]. Delivery is fire-and-forget: a sink cannot fail the
//! operation that emits to it.

use crate::core::types::{Phase, UsageRecord};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Something worth reporting while a request is processed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProcessingEvent {
    /// A prompt did not fit `from` and moved on to `to`
    FallbackTriggered {
        operation_id: Uuid,
        from: String,
        to: String,
        prompt_tokens: u32,
        max_tokens: u32,
        at: DateTime<Utc>,
    },
    /// One map or refinement step finished
    ChunkCompleted {
        operation_id: Uuid,
        phase: Phase,
        ordinal: usize,
        total: usize,
        provider: String,
        usage: UsageRecord,
    },
    MapReduceCompleted {
        operation_id: Uuid,
        chunks: usize,
        usage: UsageRecord,
        elapsed: Duration,
    },
    RefinementCompleted {
        operation_id: Uuid,
        chunks: usize,
        usage: UsageRecord,
        elapsed: Duration,
    },
}

impl ProcessingEvent {
    pub fn operation_id(&self) -> Uuid {
        match self {
            Self::FallbackTriggered { operation_id, .. }
            | Self::ChunkCompleted { operation_id, .. }
            | Self::MapReduceCompleted { operation_id, .. }
            | Self::RefinementCompleted { operation_id, .. } => *operation_id,
        }
    }
}

/// Receiver of processing events
pub trait EventSink: Send + Sync + std::fmt::Debug {
    /// Deliver one event; must not block
    fn emit(&self, event: ProcessingEvent);
}

/// Logs every event through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: ProcessingEvent) {
        match &event {
            ProcessingEvent::FallbackTriggered {
                operation_id,
                from,
                to,
                prompt_tokens,
                max_tokens,
                ..
            } => info!(
                %operation_id,
                from = %from,
                to = %to,
                prompt_tokens,
                max_tokens,
                "Context window fallback"
            ),
            ProcessingEvent::ChunkCompleted {
                operation_id,
                phase,
                ordinal,
                total,
                provider,
                usage,
            } => debug!(
                %operation_id,
                %phase,
                ordinal,
                total,
                provider = %provider,
                tokens = usage.total_tokens,
                "Chunk completed"
            ),
            ProcessingEvent::MapReduceCompleted {
                operation_id,
                chunks,
                usage,
                elapsed,
            } => info!(
                %operation_id,
                chunks,
                tokens = usage.total_tokens,
                elapsed_ms = elapsed.as_millis() as u64,
                "Map-reduce completed"
            ),
            ProcessingEvent::RefinementCompleted {
                operation_id,
                chunks,
                usage,
                elapsed,
            } => info!(
                %operation_id,
                chunks,
                tokens = usage.total_tokens,
                elapsed_ms = elapsed.as_millis() as u64,
                "Iterative refinement completed"
            ),
        }
    }
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn emit(&self, _event: ProcessingEvent) {}
}

/// Forwards events into a bounded channel
///
/// A full or closed channel drops the event and bumps [`dropped`](Self::dropped).
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::Sender<ProcessingEvent>,
    dropped: Arc<AtomicU64>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ProcessingEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            receiver,
        )
    }

    /// Events that could not be delivered
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: ProcessingEvent) {
        if self.sender.try_send(event).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProcessingEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events seen so far
    pub fn events(&self) -> Vec<ProcessingEvent> {
        self.events.lock().clone()
    }

    /// Drain the recorded events
    pub fn take(&self) -> Vec<ProcessingEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: ProcessingEvent) {
        self.events.lock().push(event);
    }
}
