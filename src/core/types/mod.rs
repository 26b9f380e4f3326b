//! Core type definition module
//!
//! Contains the request, response, usage and chunk types shared by the router
//! and the chunked-processing orchestrators.

pub mod chunk;
pub mod requests;
pub mod responses;
pub mod usage;

// Re-export all public types
pub use chunk::*;
pub use requests::*;
pub use responses::*;
pub use usage::*;
