//! Shared utilities: configuration and small helpers.

pub mod configuration;

pub use configuration::{CallerConfig, ConfigurationError};
