//! Channel selector parsing, merging and polarity checks.
//!
//! Every accepted input shape is first flattened into signed selectors
//! (`"app"`, `"!doctrine"`); merging concatenates selector lists and the
//! polarity check runs on the merged list.

use super::utils::{
    ensure_allowed_keys, expect_string, invalid_field, invalid_value, join_path, string_array,
};
use crate::{ChannelFilter, ConfigError, ValidationReason};
use serde_json::Value;

const EXCLUDE_PREFIX: char = '!';

/// Flatten a raw `channels` value into signed selectors.
pub(super) fn raw_selectors(value: &Value, layer: &str, path: &str) -> Result<Vec<String>, ConfigError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(name) => Ok(vec![name.clone()]),
        Value::Array(_) => string_array(value, layer, path),
        Value::Object(map) => {
            ensure_allowed_keys(map, &["type", "elements"], layer, path)?;
            let exclusive = match map.get("type") {
                None | Some(Value::Null) => None,
                Some(kind) => match expect_string(kind, layer, &join_path(path, "type"))? {
                    "inclusive" => Some(false),
                    "exclusive" => Some(true),
                    _ => {
                        return Err(invalid_value(
                            layer,
                            &join_path(path, "type"),
                            "channel filter type must be inclusive or exclusive",
                        ));
                    }
                },
            };
            let elements = match map.get("elements") {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::String(name)) => vec![name.clone()],
                Some(other) => string_array(other, layer, &join_path(path, "elements"))?,
            };
            elements
                .into_iter()
                .map(|element| match exclusive {
                    Some(true) if !element.starts_with(EXCLUDE_PREFIX) => {
                        Ok(format!("{EXCLUDE_PREFIX}{element}"))
                    }
                    Some(false) if element.starts_with(EXCLUDE_PREFIX) => {
                        Err(polarity_error(layer, path))
                    }
                    _ => Ok(element),
                })
                .collect()
        }
        _ => Err(invalid_value(
            layer,
            path,
            "expected channel name, list of names, or {type, elements}",
        )),
    }
}

/// Normalize a raw `channels` value into a filter.
pub(super) fn normalize(value: &Value, layer: &str, path: &str) -> Result<ChannelFilter, ConfigError> {
    let selectors = raw_selectors(value, layer, path)?;
    let mut exclusive = None;
    let mut elements = Vec::with_capacity(selectors.len());
    for (idx, selector) in selectors.iter().enumerate() {
        let (is_exclusive, name) = match selector.strip_prefix(EXCLUDE_PREFIX) {
            Some(name) => (true, name),
            None => (false, selector.as_str()),
        };
        if name.is_empty() {
            return Err(invalid_value(
                layer,
                &format!("{path}[{idx}]"),
                "channel name must not be empty",
            ));
        }
        match exclusive {
            Some(previous) if previous != is_exclusive => return Err(polarity_error(layer, path)),
            _ => exclusive = Some(is_exclusive),
        }
        elements.push(name.to_string());
    }
    Ok(match exclusive {
        Some(true) => ChannelFilter::exclusive(elements),
        _ => ChannelFilter::inclusive(elements),
    })
}

/// Merge an overlay `channels` value onto an existing one.
///
/// `null` in the overlay clears the filter; otherwise selectors accumulate.
pub(super) fn merge(
    existing: &Value,
    overlay: &Value,
    layer: &str,
    path: &str,
) -> Result<Value, ConfigError> {
    if overlay.is_null() {
        return Ok(Value::Null);
    }
    let mut selectors = raw_selectors(existing, layer, path)?;
    selectors.extend(raw_selectors(overlay, layer, path)?);
    Ok(Value::Array(selectors.into_iter().map(Value::String).collect()))
}

fn polarity_error(layer: &str, path: &str) -> ConfigError {
    invalid_field(
        layer,
        path,
        ValidationReason::InconsistentChannelPolarity,
        "cannot combine exclusive and inclusive channels in one filter",
    )
}
