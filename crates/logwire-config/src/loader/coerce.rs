//! Field-level coercion from raw values into typed field values.

use super::utils::{
    ensure_allowed_keys, expect_bool, expect_f64, expect_i64, expect_object, expect_string,
    expect_unsigned, invalid_field, invalid_value, join_path, missing_field, present,
    string_array,
};
use super::variants::FieldKind;
use crate::{
    ConfigError, ElasticsearchParams, EmailPrototype, ExcludedHttpCode, FieldValue,
    GelfPublisherParams, Level, MongoParams, RedisParams, ServiceOrInline, ServiceReference,
    ValidationReason, Verbosity, VerbosityLevelMap,
};
use serde_json::{Map, Value};

/// Highest value a permission mode may take (`0o7777`).
const MAX_FILE_PERMISSION: u32 = 0o7777;

/// Coerce a present, non-null field value according to its kind.
pub(super) fn coerce(
    kind: FieldKind,
    value: &Value,
    layer: &str,
    path: &str,
) -> Result<FieldValue, ConfigError> {
    let coerced = match kind {
        FieldKind::Text => FieldValue::Text(expect_string(value, layer, path)?.to_string()),
        FieldKind::Flag => FieldValue::Bool(expect_bool(value, layer, path)?),
        FieldKind::Integer => FieldValue::Integer(expect_i64(value, layer, path)?),
        FieldKind::Scalar => match value {
            Value::String(text) => FieldValue::Text(text.clone()),
            _ => FieldValue::Integer(expect_i64(value, layer, path)?),
        },
        FieldKind::Count => FieldValue::Integer(expect_unsigned::<i64>(value, layer, path)?),
        FieldKind::Port => {
            FieldValue::Integer(i64::from(expect_unsigned::<u16>(value, layer, path)?))
        }
        FieldKind::Float => FieldValue::Float(expect_f64(value, layer, path)?),
        FieldKind::Level => FieldValue::Level(level(value, layer, path)?),
        FieldKind::LevelList => FieldValue::LevelList(level_list(value, layer, path)?),
        FieldKind::TextList => FieldValue::TextList(string_array(value, layer, path)?),
        FieldKind::TextOrList => FieldValue::TextList(text_or_list(value, layer, path)?),
        FieldKind::Members => FieldValue::TextList(members(value, layer, path)?),
        FieldKind::FilePermission => {
            FieldValue::Integer(i64::from(file_permission(value, layer, path)?))
        }
        FieldKind::Reference => FieldValue::Reference(reference(value, layer, path)?),
        FieldKind::Redis => {
            FieldValue::Redis(service_or_inline(value, layer, path, redis_params)?)
        }
        FieldKind::Mongo => {
            FieldValue::Mongo(service_or_inline(value, layer, path, mongo_params)?)
        }
        FieldKind::Elasticsearch => FieldValue::Elasticsearch(service_or_inline(
            value,
            layer,
            path,
            elasticsearch_params,
        )?),
        FieldKind::Gelf => FieldValue::Gelf(service_or_inline(value, layer, path, gelf_params)?),
        FieldKind::EmailPrototype => FieldValue::Prototype(email_prototype(value, layer, path)?),
        FieldKind::HttpCodes => FieldValue::HttpCodes(http_codes(value, layer, path)?),
        FieldKind::Verbosity => FieldValue::Verbosity(verbosity_levels(value, layer, path)?),
        FieldKind::Map => FieldValue::Map(options_map(value, layer, path)?),
    };
    Ok(coerced)
}

/// Resolve a severity name or numeric code.
pub(super) fn level(value: &Value, layer: &str, path: &str) -> Result<Level, ConfigError> {
    match value {
        Value::Number(_) => value
            .as_u64()
            .and_then(|code| u32::try_from(code).ok())
            .map(Level::from_code)
            .ok_or_else(|| invalid_value(layer, path, "level code must be a non-negative integer")),
        Value::String(name) => name
            .parse()
            .map_err(|err| invalid_value(layer, path, format!("{err}"))),
        _ => Err(invalid_value(layer, path, "expected level name or code")),
    }
}

fn level_list(value: &Value, layer: &str, path: &str) -> Result<Vec<Level>, ConfigError> {
    let Value::Array(entries) = value else {
        return Err(invalid_value(layer, path, "expected array of levels"));
    };
    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| level(entry, layer, &format!("{path}[{idx}]")))
        .collect()
}

fn text_or_list(value: &Value, layer: &str, path: &str) -> Result<Vec<String>, ConfigError> {
    match value {
        Value::String(single) => Ok(vec![single.clone()]),
        _ => string_array(value, layer, path),
    }
}

fn members(value: &Value, layer: &str, path: &str) -> Result<Vec<String>, ConfigError> {
    let names = text_or_list(value, layer, path)?;
    if names.is_empty() {
        return Err(invalid_value(
            layer,
            path,
            "members must name at least one handler",
        ));
    }
    Ok(names)
}

/// Accept integers, `"0666"`-style octal strings or plain decimal strings.
pub(super) fn file_permission(value: &Value, layer: &str, path: &str) -> Result<u32, ConfigError> {
    let mode = match value {
        Value::String(raw) => {
            let digits = raw.trim();
            // Only a leading zero marks the string as octal.
            let radix = if digits.starts_with('0') { 8 } else { 10 };
            if digits.is_empty() || !digits.chars().all(|ch| ch.is_digit(radix)) {
                return Err(invalid_value(
                    layer,
                    path,
                    format!("\"{raw}\" is not a permission mode"),
                ));
            }
            u32::from_str_radix(digits, radix)
                .map_err(|err| invalid_value(layer, path, format!("{err}")))?
        }
        Value::Number(_) => expect_unsigned::<u32>(value, layer, path)?,
        _ => return Err(invalid_value(layer, path, "expected octal string or integer")),
    };
    if mode > MAX_FILE_PERMISSION {
        return Err(invalid_value(
            layer,
            path,
            format!("permission {mode:o} exceeds 7777"),
        ));
    }
    Ok(mode)
}

/// Accept `"service.id"` or `{id: "service.id"}`.
pub(super) fn reference(
    value: &Value,
    layer: &str,
    path: &str,
) -> Result<ServiceReference, ConfigError> {
    match value {
        Value::String(id) => Ok(ServiceReference::new(id.as_str())),
        Value::Object(map) => {
            ensure_allowed_keys(map, &["id"], layer, path)?;
            let id_path = join_path(path, "id");
            let id = present(map, "id").ok_or_else(|| missing_field(layer, &id_path))?;
            Ok(ServiceReference::new(expect_string(id, layer, &id_path)?))
        }
        _ => Err(invalid_value(
            layer,
            path,
            "expected service id or {id} mapping",
        )),
    }
}

/// Split a field into a service reference or inline parameters.
///
/// A mapping carrying `id` is a reference and may not carry anything else.
fn service_or_inline<T>(
    value: &Value,
    layer: &str,
    path: &str,
    inline: fn(&Params<'_>) -> Result<T, ConfigError>,
) -> Result<ServiceOrInline<T>, ConfigError> {
    match value {
        Value::Object(map) if !map.contains_key("id") => {
            let params = Params { map, layer, path };
            inline(&params).map(ServiceOrInline::Inline)
        }
        _ => reference(value, layer, path).map(ServiceOrInline::Service),
    }
}

/// Typed reader over an inline parameter mapping.
struct Params<'a> {
    map: &'a Map<String, Value>,
    layer: &'a str,
    path: &'a str,
}

impl Params<'_> {
    fn allow(&self, keys: &[&str]) -> Result<(), ConfigError> {
        ensure_allowed_keys(self.map, keys, self.layer, self.path)
    }

    fn text(&self, key: &str) -> Result<Option<String>, ConfigError> {
        present(self.map, key)
            .map(|value| {
                expect_string(value, self.layer, &join_path(self.path, key)).map(str::to_string)
            })
            .transpose()
    }

    fn required_text(&self, key: &str) -> Result<String, ConfigError> {
        self.text(key)?
            .ok_or_else(|| missing_field(self.layer, &join_path(self.path, key)))
    }

    fn text_or(&self, key: &str, fallback: &str) -> Result<String, ConfigError> {
        Ok(self.text(key)?.unwrap_or_else(|| fallback.to_string()))
    }

    fn unsigned_or<T: TryFrom<u64>>(&self, key: &str, fallback: T) -> Result<T, ConfigError> {
        match present(self.map, key) {
            Some(value) => expect_unsigned(value, self.layer, &join_path(self.path, key)),
            None => Ok(fallback),
        }
    }
}

fn redis_params(params: &Params<'_>) -> Result<RedisParams, ConfigError> {
    params.allow(&["host", "password", "port", "database", "key_name"])?;
    Ok(RedisParams {
        host: params.required_text("host")?,
        password: params.text("password")?,
        port: params.unsigned_or("port", 6379)?,
        database: params.unsigned_or("database", 0)?,
        key_name: params.text_or("key_name", "monolog_redis")?,
    })
}

fn mongo_params(params: &Params<'_>) -> Result<MongoParams, ConfigError> {
    params.allow(&["host", "port", "user", "pwd", "database", "collection"])?;
    let user = params.text("user")?;
    let pwd = params.text("pwd")?;
    if user.is_some() && pwd.is_none() {
        return Err(invalid_field(
            params.layer,
            &join_path(params.path, "pwd"),
            ValidationReason::MissingRequiredField,
            "a password is required when a user is set",
        ));
    }
    Ok(MongoParams {
        host: params.required_text("host")?,
        port: params.unsigned_or("port", 27017)?,
        user,
        pwd,
        database: params.text_or("database", "monolog")?,
        collection: params.text_or("collection", "logs")?,
    })
}

fn elasticsearch_params(params: &Params<'_>) -> Result<ElasticsearchParams, ConfigError> {
    params.allow(&["host", "port", "transport", "user", "password"])?;
    Ok(ElasticsearchParams {
        host: params.required_text("host")?,
        port: params.unsigned_or("port", 9200)?,
        transport: params.text_or("transport", "Http")?,
        user: params.text("user")?,
        password: params.text("password")?,
    })
}

fn gelf_params(params: &Params<'_>) -> Result<GelfPublisherParams, ConfigError> {
    params.allow(&["hostname", "port", "chunk_size"])?;
    Ok(GelfPublisherParams {
        hostname: params.required_text("hostname")?,
        port: params.unsigned_or("port", 12201)?,
        chunk_size: params.unsigned_or("chunk_size", 1420)?,
    })
}

fn email_prototype(value: &Value, layer: &str, path: &str) -> Result<EmailPrototype, ConfigError> {
    match value {
        Value::String(id) => Ok(EmailPrototype {
            id: id.clone(),
            method: None,
        }),
        Value::Object(map) => {
            let params = Params { map, layer, path };
            params.allow(&["id", "method"])?;
            Ok(EmailPrototype {
                id: params.required_text("id")?,
                method: params.text("method")?,
            })
        }
        _ => Err(invalid_value(
            layer,
            path,
            "expected service id or {id, method} mapping",
        )),
    }
}

/// Accept `404`, `{"404": ["^/foo"]}` or `{code: 404, urls: [...]}` items.
fn http_codes(value: &Value, layer: &str, path: &str) -> Result<Vec<ExcludedHttpCode>, ConfigError> {
    let Value::Array(entries) = value else {
        return Err(invalid_value(layer, path, "expected array of http codes"));
    };
    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| http_code(entry, layer, &format!("{path}[{idx}]")))
        .collect()
}

fn http_code(value: &Value, layer: &str, path: &str) -> Result<ExcludedHttpCode, ConfigError> {
    let (code, urls) = match value {
        Value::Number(_) => (expect_unsigned::<u16>(value, layer, path)?, Vec::new()),
        Value::Object(map) if map.contains_key("code") => {
            ensure_allowed_keys(map, &["code", "urls"], layer, path)?;
            let code = expect_unsigned::<u16>(&map["code"], layer, &join_path(path, "code"))?;
            let urls = match present(map, "urls") {
                Some(urls) => string_array(urls, layer, &join_path(path, "urls"))?,
                None => Vec::new(),
            };
            (code, urls)
        }
        Value::Object(map) if map.len() == 1 => {
            let Some((raw_code, urls)) = map.iter().next() else {
                return Err(invalid_value(layer, path, "expected a single status code"));
            };
            let code = raw_code.trim().parse::<u16>().map_err(|_| {
                invalid_value(layer, path, format!("\"{raw_code}\" is not a status code"))
            })?;
            (code, string_array(urls, layer, &join_path(path, raw_code))?)
        }
        _ => {
            return Err(invalid_value(
                layer,
                path,
                "expected status code or {code: [urls]} mapping",
            ));
        }
    };
    if !(100..=599).contains(&code) {
        return Err(invalid_value(
            layer,
            path,
            format!("{code} is not an HTTP status code"),
        ));
    }
    Ok(ExcludedHttpCode { code, urls })
}

/// Overlay user verbosity levels on the defaults.
///
/// A list assigns tiers positionally from quiet upward; a mapping names them.
fn verbosity_levels(value: &Value, layer: &str, path: &str) -> Result<VerbosityLevelMap, ConfigError> {
    let mut levels = VerbosityLevelMap::default();
    match value {
        Value::Array(entries) => {
            if entries.len() > Verbosity::ALL.len() {
                return Err(invalid_value(
                    layer,
                    path,
                    format!("at most {} verbosity levels", Verbosity::ALL.len()),
                ));
            }
            for (idx, (tier, entry)) in Verbosity::ALL.iter().zip(entries).enumerate() {
                levels.set(*tier, level(entry, layer, &format!("{path}[{idx}]"))?);
            }
        }
        Value::Object(map) => {
            for (key, entry) in map {
                let entry_path = join_path(path, key);
                let tier: Verbosity = key.parse().map_err(|message: String| {
                    invalid_field(
                        layer,
                        &entry_path,
                        ValidationReason::UnrecognizedField,
                        message,
                    )
                })?;
                levels.set(tier, level(entry, layer, &entry_path)?);
            }
        }
        _ => {
            return Err(invalid_value(
                layer,
                path,
                "expected verbosity mapping or list",
            ));
        }
    }
    Ok(levels)
}

/// Free-form option mapping; an empty list stands for an empty mapping.
fn options_map(value: &Value, layer: &str, path: &str) -> Result<Map<String, Value>, ConfigError> {
    match value {
        Value::Array(entries) if entries.is_empty() => Ok(Map::new()),
        _ => expect_object(value, layer, path).cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn octal_string_and_integer_agree() {
        let from_string = file_permission(&json!("0666"), "test", "p").expect("string");
        let from_number = file_permission(&json!(0o666), "test", "p").expect("number");
        assert_eq!(from_string, from_number);
        assert_eq!(file_permission(&json!(0o777), "test", "p").expect("number"), 0o777);
    }

    #[test]
    fn only_leading_zero_strings_are_octal() {
        assert_eq!(file_permission(&json!("777"), "test", "p").expect("decimal"), 777);
        assert_eq!(file_permission(&json!("0777"), "test", "p").expect("octal"), 0o777);
    }

    #[test]
    fn malformed_permission_is_invalid() {
        for raw in [json!("rw-r--r--"), json!("0988"), json!(""), json!(0o17777)] {
            let err = file_permission(&raw, "test", "p").unwrap_err();
            assert_eq!(err.reason(), Some(ValidationReason::InvalidValue));
        }
    }

    #[test]
    fn references_normalize_to_id_mapping() {
        let bare = reference(&json!("gelf.publisher"), "test", "p").expect("bare");
        let mapped = reference(&json!({ "id": "gelf.publisher" }), "test", "p").expect("map");
        assert_eq!(bare, mapped);
        assert_eq!(bare.id, "gelf.publisher");
    }

    #[test]
    fn reference_mapping_rejects_inline_keys() {
        let err = coerce(
            FieldKind::Redis,
            &json!({ "id": "redis.client", "host": "127.0.0.1" }),
            "test",
            "redis",
        )
        .unwrap_err();
        assert_eq!(err.reason(), Some(ValidationReason::UnrecognizedField));
    }

    #[test]
    fn http_codes_accept_every_shape() {
        let codes = http_codes(
            &json!([404, { "403": ["^/admin"] }, { "code": 410, "urls": ["^/old"] }]),
            "test",
            "excluded_http_codes",
        )
        .expect("codes");
        assert_eq!(
            codes,
            vec![
                ExcludedHttpCode {
                    code: 404,
                    urls: Vec::new(),
                },
                ExcludedHttpCode {
                    code: 403,
                    urls: vec!["^/admin".to_string()],
                },
                ExcludedHttpCode {
                    code: 410,
                    urls: vec!["^/old".to_string()],
                },
            ]
        );
        assert!(http_codes(&json!([42]), "test", "excluded_http_codes").is_err());
    }

    #[test]
    fn verbosity_list_is_positional() {
        let levels = verbosity_levels(&json!(["DEBUG", "info"]), "test", "v").expect("levels");
        assert_eq!(levels.get(Verbosity::Quiet), Level::DEBUG);
        assert_eq!(levels.get(Verbosity::Normal), Level::INFO);
        assert_eq!(levels.get(Verbosity::Debug), Level::DEBUG);
    }

    #[test]
    fn unknown_verbosity_key_is_unrecognized() {
        let err = verbosity_levels(&json!({ "LOUD": "DEBUG" }), "test", "v").unwrap_err();
        assert_eq!(err.reason(), Some(ValidationReason::UnrecognizedField));
    }

    #[test]
    fn mongo_user_requires_password() {
        let err = coerce(
            FieldKind::Mongo,
            &json!({ "host": "db", "user": "logger" }),
            "test",
            "mongo",
        )
        .unwrap_err();
        assert_eq!(err.reason(), Some(ValidationReason::MissingRequiredField));
    }
}
