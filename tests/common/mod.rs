//! Common test utilities for ctxgate
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::common::{fixtures, providers::ScriptedInvoker};
//!
//! #[tokio::test]
//! async fn my_test() {
//!     let invoker = ScriptedInvoker::new();
//!     let router = fixtures::router(invoker.clone());
//!     // ...
//! }
//! ```

pub mod assertions;
pub mod fixtures;
pub mod providers;

// Re-export commonly used items
pub use fixtures::{paragraph_document, router, scenario_catalog};
pub use providers::ScriptedInvoker;

/// Assert that a result is an error matching a pattern
#[macro_export]
macro_rules! assert_err_matches {
    ($result:expr, $pattern:pat $(if $guard:expr)?) => {
        match $result {
            Err(err) => assert!(
                matches!(err, $pattern $(if $guard)?),
                "unexpected error: {:?}",
                err
            ),
            Ok(value) => panic!("expected an error, got {:?}", value),
        }
    };
}
