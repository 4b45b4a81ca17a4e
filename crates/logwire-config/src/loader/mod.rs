//! Layered handler configuration processing.
//!
//! Validates each raw layer on its own, merges the layers in precedence order
//! and normalizes the merged tree into a `LoggingConfig`.

mod channels;
mod coerce;
mod merge;
mod schema;
mod utils;
mod variants;

#[cfg(test)]
mod tests;

use crate::{ConfigError, LoggingConfig};
use log::{debug, info};
use serde_json::Value;

/// Label used for errors found on the merged tree.
const EFFECTIVE_LAYER: &str = "effective";

/// A single raw configuration layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLayer {
    /// Name used to prefix error paths raised while validating this layer.
    pub label: String,
    /// Raw layer tree with `handlers`, `channels` and `use_microseconds` sections.
    pub value: Value,
}

impl ConfigLayer {
    pub fn new(label: impl Into<String>, value: Value) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Schema validation mode for layered configs.
#[derive(Debug, Clone, Copy)]
enum SchemaMode {
    /// Partial validation for individual layers.
    Partial,
    /// Full validation for the effective config.
    Full,
}

impl LoggingConfig {
    /// Validate, merge and normalize an ordered stack of layers.
    ///
    /// Later layers take precedence. Layer-local problems are reported against
    /// the offending layer; required fields, cross-field rules and channel
    /// polarity are checked on the merged tree.
    pub fn process<I>(layers: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = ConfigLayer>,
    {
        let mut merged = Value::Object(serde_json::Map::new());
        let mut count = 0usize;
        for layer in layers {
            schema::validate_layer_schema(&layer.value, SchemaMode::Partial, &layer.label)?;
            merge::merge_layer(&mut merged, &layer.value, &layer.label)?;
            debug!("merged layer (label={})", layer.label);
            count += 1;
        }

        let config = schema::normalize_config(&merged, EFFECTIVE_LAYER)?;
        info!(
            "logging config processed (layers={count}, handlers={})",
            config.handlers.len()
        );
        Ok(config)
    }

    /// Process a single layer.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        Self::process([ConfigLayer::new("config", value)])
    }

    /// Render the normalized tree.
    pub fn to_value(&self) -> Result<Value, ConfigError> {
        Ok(serde_json::to_value(self)?)
    }
}
