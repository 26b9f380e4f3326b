//! Validation trait definition

/// Field-level validation for configuration sections
///
/// Errors are plain messages; [`Config::validate`](crate::config::Config::validate)
/// wraps them into [`GatewayError::Config`](crate::GatewayError::Config) with the
/// section they came from.
pub trait Validate {
    /// Check this section in isolation
    fn validate(&self) -> Result<(), String>;
}
