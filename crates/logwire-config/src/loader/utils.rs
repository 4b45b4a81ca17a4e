//! Value inspection helpers shared by the schema walk.

use crate::{ConfigError, ValidationReason};
use serde_json::{Map, Value};

/// Expect a JSON object or return a typed error.
pub(super) fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_value(layer, path, "expected mapping")),
    }
}

/// Expect a JSON string or return a typed error.
pub(super) fn expect_string<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a str, ConfigError> {
    value
        .as_str()
        .ok_or_else(|| invalid_value(layer, path, "expected string"))
}

/// Expect a JSON boolean or return a typed error.
pub(super) fn expect_bool(value: &Value, layer: &str, path: &str) -> Result<bool, ConfigError> {
    value
        .as_bool()
        .ok_or_else(|| invalid_value(layer, path, "expected bool"))
}

/// Expect a JSON integer or return a typed error.
pub(super) fn expect_i64(value: &Value, layer: &str, path: &str) -> Result<i64, ConfigError> {
    value
        .as_i64()
        .ok_or_else(|| invalid_value(layer, path, "expected integer"))
}

/// Expect a non-negative integer that fits the target type.
pub(super) fn expect_unsigned<T: TryFrom<u64>>(
    value: &Value,
    layer: &str,
    path: &str,
) -> Result<T, ConfigError> {
    value
        .as_u64()
        .and_then(|raw| T::try_from(raw).ok())
        .ok_or_else(|| invalid_value(layer, path, "expected non-negative integer in range"))
}

/// Expect a JSON number or return a typed error.
pub(super) fn expect_f64(value: &Value, layer: &str, path: &str) -> Result<f64, ConfigError> {
    value
        .as_f64()
        .ok_or_else(|| invalid_value(layer, path, "expected number"))
}

/// Collect an array of strings.
pub(super) fn string_array(value: &Value, layer: &str, path: &str) -> Result<Vec<String>, ConfigError> {
    let Value::Array(arr) = value else {
        return Err(invalid_value(layer, path, "expected array"));
    };
    arr.iter()
        .enumerate()
        .map(|(idx, entry)| {
            expect_string(entry, layer, &format!("{path}[{idx}]")).map(str::to_string)
        })
        .collect()
}

/// Treat explicit `null` like an absent key.
pub(super) fn present<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|value| !value.is_null())
}

/// Ensure an object contains only allowed keys.
pub(super) fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    for key in map.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(invalid_field(
                layer,
                &join_path(path, key),
                ValidationReason::UnrecognizedField,
                "unrecognized field",
            ));
        }
    }
    Ok(())
}

/// Join nested paths for better error messages.
pub(super) fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Build a structured invalid-field error.
pub(super) fn invalid_field(
    layer: &str,
    path: &str,
    reason: ValidationReason,
    message: impl Into<String>,
) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{normalized_path}"),
        handler: None,
        reason,
        message: message.into(),
    }
}

/// Shorthand for a value that failed its constraint.
pub(super) fn invalid_value(layer: &str, path: &str, message: impl Into<String>) -> ConfigError {
    invalid_field(layer, path, ValidationReason::InvalidValue, message)
}

/// Shorthand for a required field that is absent.
pub(super) fn missing_field(layer: &str, path: &str) -> ConfigError {
    invalid_field(
        layer,
        path,
        ValidationReason::MissingRequiredField,
        "missing required field",
    )
}
