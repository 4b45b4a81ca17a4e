//! Schema walk for logwire handler configuration.

use super::SchemaMode;
use super::channels;
use super::coerce::{coerce, level};
use super::utils::{
    ensure_allowed_keys, expect_bool, expect_i64, expect_object, expect_string, invalid_field,
    join_path, missing_field, present, string_array,
};
use super::variants::{HandlerSchema, Presence, Rule, schema_for};
use crate::{
    ChannelFilter, ConfigError, HandlerConfig, HandlerType, Level, LoggingConfig,
    ValidationReason,
};
use log::debug;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Top-level sections of a configuration layer.
const TOP_LEVEL_KEYS: &[&str] = &["handlers", "channels", "use_microseconds"];

/// Validate a configuration layer.
///
/// Partial mode checks only what a single layer can get right on its own
/// (shapes, known types, well-formed channel selectors); required fields and
/// cross-field rules wait for the merged tree.
pub(super) fn validate_layer_schema(
    value: &Value,
    mode: SchemaMode,
    layer: &str,
) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    ensure_allowed_keys(map, TOP_LEVEL_KEYS, layer, "")?;

    if let Some(value) = present(map, "channels") {
        string_array(value, layer, "channels")?;
    }
    if let Some(value) = present(map, "use_microseconds") {
        expect_bool(value, layer, "use_microseconds")?;
    }
    if let Some(value) = present(map, "handlers") {
        let handlers = expect_object(value, layer, "handlers")?;
        for (name, handler) in handlers {
            let path = join_path("handlers", name);
            validate_handler_shape(handler, mode, layer, &path)
                .map_err(|err| err.with_handler(name))?;
        }
    }
    Ok(())
}

/// Shape checks that hold for any single layer.
fn validate_handler_shape(
    value: &Value,
    mode: SchemaMode,
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    match map.get("type") {
        Some(raw) => {
            handler_type(raw, layer, &join_path(path, "type"))?;
        }
        None if matches!(mode, SchemaMode::Full) => {
            return Err(missing_field(layer, &join_path(path, "type")));
        }
        None => {}
    }
    if let Some(raw) = map.get("channels") {
        channels::raw_selectors(raw, layer, &join_path(path, "channels"))?;
    }
    Ok(())
}

/// Normalize the merged configuration into its typed form.
///
/// Each handler fails fast on its first violation; failures from different
/// handlers are collected and reported together.
pub(super) fn normalize_config(value: &Value, layer: &str) -> Result<LoggingConfig, ConfigError> {
    let map = expect_object(value, layer, "")?;
    ensure_allowed_keys(map, TOP_LEVEL_KEYS, layer, "")?;

    let mut config = LoggingConfig::default();
    if let Some(value) = present(map, "channels") {
        config.channels = string_array(value, layer, "channels")?;
    }
    if let Some(value) = present(map, "use_microseconds") {
        config.use_microseconds = expect_bool(value, layer, "use_microseconds")?;
    }

    let mut errors = Vec::new();
    if let Some(value) = present(map, "handlers") {
        let handlers = expect_object(value, layer, "handlers")?;
        for (name, raw) in handlers {
            match normalize_handler(raw, layer, &join_path("handlers", name)) {
                Ok(handler) => {
                    debug!("normalized handler (name={name}, type={})", handler.handler_type);
                    config.handlers.insert(name.clone(), handler);
                }
                Err(err) => errors.push(err.with_handler(name)),
            }
        }
    }

    match ConfigError::collect(errors) {
        Some(err) => Err(err),
        None => Ok(config),
    }
}

/// Validate, coerce and default a single handler.
fn normalize_handler(value: &Value, layer: &str, path: &str) -> Result<HandlerConfig, ConfigError> {
    validate_handler_shape(value, SchemaMode::Full, layer, path)?;
    let map = expect_object(value, layer, path)?;
    let type_path = join_path(path, "type");
    let raw_type = map
        .get("type")
        .ok_or_else(|| missing_field(layer, &type_path))?;
    let kind = handler_type(raw_type, layer, &type_path)?;
    let schema = schema_for(kind);

    for key in map.keys() {
        if !schema.accepts(key) {
            return Err(invalid_field(
                layer,
                &join_path(path, key),
                ValidationReason::UnrecognizedField,
                format!("unrecognized field for handler type \"{kind}\""),
            ));
        }
    }
    check_rules(&schema, map, layer, path)?;

    let mut handler = HandlerConfig {
        handler_type: kind,
        priority: 0,
        level: Level::DEBUG,
        bubble: true,
        channels: ChannelFilter::default(),
        nested: false,
        formatter: None,
        options: BTreeMap::new(),
    };
    if let Some(value) = present(map, "priority") {
        handler.priority = expect_i64(value, layer, &join_path(path, "priority"))?;
    }
    if let Some(value) = present(map, "nested") {
        handler.nested = expect_bool(value, layer, &join_path(path, "nested"))?;
    }
    if let Some(value) = present(map, "formatter") {
        handler.formatter =
            Some(expect_string(value, layer, &join_path(path, "formatter"))?.to_string());
    }
    if let Some(value) = map.get("channels") {
        handler.channels = channels::normalize(value, layer, &join_path(path, "channels"))?;
    }
    if let Some(value) = present(map, "level") {
        handler.level = level(value, layer, &join_path(path, "level"))?;
    }
    if let Some(value) = present(map, "bubble") {
        handler.bubble = expect_bool(value, layer, &join_path(path, "bubble"))?;
    }

    for field in schema.fields {
        let field_path = join_path(path, field.name);
        let coerced = match (present(map, field.name), field.presence) {
            (Some(value), _) => coerce(field.kind, value, layer, &field_path)?,
            (None, Presence::Required) => return Err(missing_field(layer, &field_path)),
            (None, Presence::Optional) => continue,
            (None, Presence::Default(fallback)) => fallback.value(),
            (None, Presence::DefaultUnless(sibling, fallback)) => {
                if is_set(map, sibling) {
                    continue;
                }
                fallback.value()
            }
        };
        handler.options.insert(field.name.to_string(), coerced);
    }

    Ok(handler)
}

/// Resolve the `type` discriminant; an explicit `null` selects the null handler.
fn handler_type(value: &Value, layer: &str, path: &str) -> Result<HandlerType, ConfigError> {
    if value.is_null() {
        return Ok(HandlerType::Null);
    }
    let raw = expect_string(value, layer, path)?;
    raw.parse()
        .map_err(|message: String| invalid_field(layer, path, ValidationReason::UnknownType, message))
}

/// Enforce cross-field rules on the keys actually set.
fn check_rules(
    schema: &HandlerSchema,
    map: &Map<String, Value>,
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    let is_set = |key: &&str| is_set(map, key);
    for rule in schema.rules {
        match rule {
            Rule::Exclusive(left, right) => {
                let left_set: Vec<&str> = left.iter().copied().filter(is_set).collect();
                let right_set: Vec<&str> = right.iter().copied().filter(is_set).collect();
                if !left_set.is_empty() && !right_set.is_empty() {
                    return Err(invalid_field(
                        layer,
                        path,
                        ValidationReason::MutuallyExclusiveFields,
                        format!(
                            "{} cannot be combined with {}",
                            left_set.join(", "),
                            right_set.join(", ")
                        ),
                    ));
                }
            }
            Rule::OneOf(groups) => {
                if !groups.iter().any(|group| group.iter().all(is_set)) {
                    let options: Vec<String> =
                        groups.iter().map(|group| group.join(" + ")).collect();
                    return Err(invalid_field(
                        layer,
                        path,
                        ValidationReason::MissingRequiredField,
                        format!("one of {} is required", options.join(" or ")),
                    ));
                }
            }
        }
    }
    Ok(())
}

/// A key counts as set when it holds something other than `null` or `[]`.
fn is_set(map: &Map<String, Value>, key: &str) -> bool {
    match present(map, key) {
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
        None => false,
    }
}
