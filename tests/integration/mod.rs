//! Integration tests for ctxgate
//!
//! These tests drive the public API with a scripted invoker and check the
//! behavior callers rely on.

pub mod chunking_tests;
pub mod config_tests;
pub mod map_reduce_tests;
pub mod router_tests;
