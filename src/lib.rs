//! # ctxgate
//!
//! A context-window aware request layer for LLM backends.
//!
//! Before any prompt reaches a backend, its token count is estimated and
//! checked against the backend's context window. Prompts that do not fit are
//! moved along an explicit fallback graph to larger-window backends, or split
//! into overlapping chunks and processed with map-reduce or iterative
//! refinement.
//!
//! ## Features
//!
//! - **Validation**: `prompt_tokens + output_reservation <= context_limit`,
//!   checked before every backend call
//! - **Fallback**: an injected, cycle-checked provider graph with aliases
//! - **Chunking**: sentence, paragraph and fixed-size strategies with overlap
//! - **Map-reduce**: bounded-concurrency map calls collected by ordinal
//! - **Iterative refinement**: a state threaded through chunks in order
//! - **Events**: fire-and-forget fallback and progress notifications
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use ctxgate::{
//!     InvokeOptions, InvokeOutput, Invoker, ProviderCatalog, ProviderConfig, ProviderError,
//!     Request, Router, TokenUsage,
//! };
//! use std::sync::Arc;
//!
//! struct Backend;
//!
//! #[async_trait]
//! impl Invoker for Backend {
//!     async fn invoke(
//!         &self,
//!         prompt: &str,
//!         options: &InvokeOptions,
//!     ) -> Result<InvokeOutput, ProviderError> {
//!         let _ = (prompt, options);
//!         Ok(InvokeOutput::new("answer", TokenUsage::new(10, 5)))
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let catalog = ProviderCatalog::new(vec![
//!         ProviderConfig::new("gpt-3.5-turbo-16k", 16_384, 1_024).with_fallback("gpt-4-1m"),
//!         ProviderConfig::new("gpt-4-1m", 1_000_000, 4_096),
//!     ])?;
//!     let router = Router::new(catalog, Arc::new(Backend));
//!
//!     let response = router
//!         .call_model(Request::new("gpt-3.5-turbo-16k", "Summarize this ..."))
//!         .await?;
//!     println!("{} (fallback used: {})", response.text, response.metadata.fallback_used);
//!
//!     let summary = router
//!         .call_model(
//!             Request::new("gpt-3.5-turbo-16k", "a very long document ...")
//!                 .with_map_reduce("Summarize this part", "Combine the summaries", None),
//!         )
//!         .await?;
//!     println!("{} chunks", summary.metadata.total_chunks.unwrap_or(0));
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! ```rust,no_run
//! # use ctxgate::{Config, Router, Invoker};
//! # use std::sync::Arc;
//! # async fn build(invoker: Arc<dyn Invoker>) -> ctxgate::Result<Router> {
//! let config = Config::from_file("config/ctxgate.yaml").await?;
//! ctxgate::init_tracing(&config.logging)?;
//! let router = Router::from_config(&config, invoker)?;
//! # Ok(router)
//! # }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod utils;

// Re-export main types
pub use config::{
    Config, LogFormat, LoggingConfig, ProviderConfig, RouterConfig, RouterOverrides, Validate,
};
pub use utils::error::{GatewayError, Result};

// Export routing
pub use core::router::{
    CallContext, ContextOverflow, ExecutionResult, FallbackResolver, FallbackWalk,
    ProviderCatalog, Router,
};

// Export chunking and orchestration
pub use core::chunking::{ChunkStrategy, Chunker, ChunkingConfig, ChunkingError};
pub use core::orchestrator::{IterativeRefiner, MapReduceOrchestrator};

// Export the invocation seam
pub use core::providers::{InvokeOptions, InvokeOutput, Invoker, ProviderError};

// Export request and response types
pub use core::types::{
    CallOptions, Chunk, ChunkedProcessing, Phase, ProcessingMode, Request, Response,
    ResponseFormat, ResponseMetadata, TokenUsage, UsageRecord,
};

// Export events
pub use core::events::{
    ChannelSink, EventSink, NoopSink, ProcessingEvent, RecordingSink, TracingSink,
};

// Export utilities
pub use utils::ai::{ModelTokenConfig, PerCharEstimator, TokenCounter, TokenEstimator};
pub use utils::logging::init_tracing;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
