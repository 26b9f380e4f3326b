//! Context-window aware routing
//!
//! ## Module Structure
//!
//! - `catalog` - Provider table, aliases and fallback edges
//! - `validator` - Fit/no-fit decision for a prompt and output reservation
//! - `fallback` - Single-step resolution and the cycle-checked fallback walk
//! - `execution` - Retry backoff, deadline guards and execution results
//! - `execute_impl` - Validation, fallback and retry for one routed call
//! - `router` - Router struct and the `call_model` entry point

pub mod catalog;
pub mod execute_impl;
pub mod execution;
pub mod fallback;
pub mod router;
pub mod validator;


pub use catalog::ProviderCatalog;
pub use execution::{CallContext, ExecutionResult};
pub use fallback::{FallbackResolver, FallbackWalk};
pub use router::Router;
pub use validator::ContextOverflow;
