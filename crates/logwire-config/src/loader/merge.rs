//! JSON merge helpers for layered configuration.

use super::channels;
use super::utils::join_path;
use crate::ConfigError;
use serde_json::{Map, Value};

/// Merge one validated layer into the accumulated tree.
///
/// Handlers merge by name. Inside a handler `channels` accumulates selectors
/// and every other key follows `merge_json_values`.
pub(super) fn merge_layer(base: &mut Value, overlay: &Value, layer: &str) -> Result<(), ConfigError> {
    let (Value::Object(base_map), Value::Object(overlay_map)) = (base, overlay) else {
        return Ok(());
    };

    for (key, value) in overlay_map {
        // A null section leaves what earlier layers set.
        if value.is_null() {
            continue;
        }
        if key != "handlers" {
            merge_entry(base_map, key, value);
            continue;
        }
        let Value::Object(overlay_handlers) = value else {
            continue;
        };
        let entry = base_map.entry(key.clone()).or_insert(Value::Null);
        if !entry.is_object() {
            *entry = value.clone();
            continue;
        }
        let Value::Object(base_handlers) = entry else {
            continue;
        };
        for (name, handler) in overlay_handlers {
            let path = join_path("handlers", name);
            match base_handlers.get_mut(name) {
                Some(existing) => merge_handler(existing, handler, layer, &path)?,
                None => {
                    base_handlers.insert(name.clone(), handler.clone());
                }
            }
        }
    }
    Ok(())
}

fn merge_handler(
    base: &mut Value,
    overlay: &Value,
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    let (Value::Object(base_map), Value::Object(overlay_map)) = (base, overlay) else {
        return Ok(());
    };
    for (key, value) in overlay_map {
        if key == "channels" {
            let merged = match base_map.get(key) {
                Some(existing) => {
                    channels::merge(existing, value, layer, &join_path(path, key))?
                }
                None => value.clone(),
            };
            base_map.insert(key.clone(), merged);
        } else {
            merge_entry(base_map, key, value);
        }
    }
    Ok(())
}

fn merge_entry(base_map: &mut Map<String, Value>, key: &str, value: &Value) {
    match base_map.get_mut(key) {
        Some(existing) => merge_json_values(existing, value),
        None => {
            base_map.insert(key.to_string(), value.clone());
        }
    }
}

/// Merge overlay values into the base, recursively overriding objects.
///
/// Scalars and lists are replaced wholesale.
pub(super) fn merge_json_values(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                merge_entry(base_map, key, value);
            }
        }
        (base_slot, overlay_value) => {
            *base_slot = overlay_value.clone();
        }
    }
}
