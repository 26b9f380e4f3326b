//! Core functionality of the request layer
//!
//! This module contains the routing, chunking and orchestration logic and the
//! data structures they share.

pub mod chunking;
pub mod events;
pub mod orchestrator;
pub mod providers;
pub mod router;
pub mod types;
