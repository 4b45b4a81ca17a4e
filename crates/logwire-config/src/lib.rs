//! Logging handler configuration schema, validation and layer merging.
//!
//! This crate owns the accepted shape of logging handler configuration:
//! it validates raw layers, merges them in precedence order and produces a
//! normalized `LoggingConfig` that downstream wiring can consume without
//! re-checking anything.

mod error;
mod level;
mod loader;
mod model;

/// Public error types returned by validation APIs.
pub use error::{ConfigError, ValidationReason};
/// Severity scale.
pub use level::{Level, UnknownLevel};
/// Raw configuration layer input.
pub use loader::ConfigLayer;
/// Normalized configuration models.
pub use model::*;
