//! Tests for layered handler configuration processing.

use super::*;
use crate::{
    ChannelFilter, FieldValue, HandlerType, Level, ServiceOrInline, ServiceReference,
    ValidationReason, Verbosity,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn process(layers: Vec<Value>) -> Result<LoggingConfig, ConfigError> {
    LoggingConfig::process(
        layers
            .into_iter()
            .enumerate()
            .map(|(idx, value)| ConfigLayer::new(format!("layer{idx}"), value)),
    )
}

fn single(handler: Value) -> Result<LoggingConfig, ConfigError> {
    LoggingConfig::from_value(json!({ "handlers": { "foo": handler } }))
}

/// A stream handler receives the common defaults.
#[test]
fn process_simple_case() {
    let config =
        process(vec![json!({ "handlers": { "foobar": { "type": "stream", "path": "/foo/bar" } } })])
            .expect("config");
    let handler = config.handler("foobar").expect("handler");
    assert_eq!(handler.handler_type, HandlerType::Stream);
    assert_eq!(handler.text("path"), Some("/foo/bar"));
    assert!(!handler.nested);
    assert!(handler.bubble);
    assert_eq!(handler.level, Level::DEBUG);
    assert_eq!(handler.channels, ChannelFilter::default());
}

/// The normalized tree renders with every default filled in.
#[test]
fn simple_case_renders_full_tree() {
    let config = LoggingConfig::from_value(
        json!({ "handlers": { "foobar": { "type": "stream", "path": "/foo/bar" } } }),
    )
    .expect("config");
    assert_eq!(
        config.to_value().expect("value"),
        json!({
            "handlers": {
                "foobar": {
                    "type": "stream",
                    "priority": 0,
                    "level": 100,
                    "bubble": true,
                    "channels": { "type": "inclusive", "elements": [] },
                    "nested": false,
                    "path": "/foo/bar",
                    "use_locking": false
                }
            },
            "channels": [],
            "use_microseconds": true
        })
    );
}

/// A single string selector picks its polarity from the prefix.
#[test]
fn process_string_channels() {
    for (raw, expected) in [
        ("foo", ChannelFilter::inclusive(vec!["foo".to_string()])),
        ("!foo", ChannelFilter::exclusive(vec!["foo".to_string()])),
    ] {
        let config = single(json!({ "type": "stream", "path": "/foo/bar", "channels": raw }))
            .expect("config");
        assert_eq!(config.handler("foo").expect("handler").channels, expected);
    }
}

/// Channel lists keep their order and polarity.
#[test]
fn channel_arrays() {
    let config = LoggingConfig::from_value(json!({
        "handlers": {
            "foo": { "type": "stream", "path": "/foo", "channels": ["A", "B"] },
            "bar": { "type": "stream", "path": "/foo", "channels": ["!C", "!D"] }
        }
    }))
    .expect("config");
    assert_eq!(
        config.handler("foo").expect("foo").channels,
        ChannelFilter::inclusive(vec!["A".to_string(), "B".to_string()])
    );
    assert_eq!(
        config.handler("bar").expect("bar").channels,
        ChannelFilter::exclusive(vec!["C".to_string(), "D".to_string()])
    );
}

/// Mixing inclusive and exclusive selectors fails.
#[test]
fn rejects_mixed_channel_polarity() {
    let err = single(json!({ "type": "stream", "path": "/foo", "channels": ["A", "!B"] }))
        .unwrap_err();
    assert_eq!(
        err.reason(),
        Some(ValidationReason::InconsistentChannelPolarity)
    );
    assert_eq!(err.handler(), Some("foo"));
}

/// Polarity is checked again after layers are merged.
#[test]
fn rejects_mixed_polarity_across_layers() {
    let err = process(vec![
        json!({ "handlers": { "foo": { "type": "stream", "path": "/foo", "channels": "A" } } }),
        json!({ "handlers": { "foo": { "channels": "!B" } } }),
    ])
    .unwrap_err();
    assert_eq!(
        err.reason(),
        Some(ValidationReason::InconsistentChannelPolarity)
    );
    assert_eq!(err.path(), Some("effective:handlers.foo.channels"));
}

/// Structured channel filters are accepted as-is.
#[test]
fn structured_channel_filter() {
    let config = single(json!({
        "type": "stream",
        "path": "/foo",
        "channels": { "type": "inclusive", "elements": ["A", "B"] }
    }))
    .expect("config");
    assert_eq!(
        config.handler("foo").expect("handler").channels,
        ChannelFilter::inclusive(vec!["A".to_string(), "B".to_string()])
    );
}

/// A later layer can drop an inherited filter with `null`.
#[test]
fn null_channels_clear_inherited_filter() {
    let config = process(vec![
        json!({ "handlers": { "foo": { "type": "stream", "path": "/foo", "channels": ["A"] } } }),
        json!({ "handlers": { "foo": { "channels": null } } }),
    ])
    .expect("config");
    assert!(config.handler("foo").expect("handler").channels.is_unrestricted());
}

/// Gelf publishers given by id or `{id}` both normalize to a reference.
#[test]
fn gelf_publisher_service() {
    for publisher in [json!("gelf.publisher"), json!({ "id": "gelf.publisher" })] {
        let config = single(json!({ "type": "gelf", "publisher": publisher })).expect("config");
        assert_eq!(
            config.handler("foo").expect("handler").option("publisher"),
            Some(&FieldValue::Gelf(ServiceOrInline::Service(
                ServiceReference::new("gelf.publisher")
            )))
        );
    }
}

/// Inline gelf settings receive their defaults.
#[test]
fn gelf_publisher_inline_defaults() {
    let config = single(json!({ "type": "gelf", "publisher": { "hostname": "graylog" } }))
        .expect("config");
    let rendered = config.to_value().expect("value");
    assert_eq!(
        rendered["handlers"]["foo"]["publisher"],
        json!({ "hostname": "graylog", "port": 12201, "chunk_size": 1420 })
    );
}

/// Mailer handlers accept a prototype and a mailer reference.
#[test]
fn swift_mailer_handler() {
    let config = single(json!({
        "type": "swift_mailer",
        "from_email": "foo@bar.com",
        "to_email": "foo@bar.com",
        "subject": "Subject",
        "mailer": "mailer",
        "email_prototype": { "id": "monolog.prototype", "method": "getPrototype" }
    }))
    .expect("config");
    let rendered = config.to_value().expect("value");
    let handler = &rendered["handlers"]["foo"];
    assert_eq!(
        handler["email_prototype"],
        json!({ "id": "monolog.prototype", "method": "getPrototype" })
    );
    assert_eq!(handler["mailer"], json!({ "id": "mailer" }));
    assert_eq!(handler["to_email"], json!(["foo@bar.com"]));
}

/// Swift mailer needs either a full envelope or a prototype.
#[test]
fn swift_mailer_requires_envelope_or_prototype() {
    let err = single(json!({ "type": "swift_mailer", "from_email": "foo@bar.com" })).unwrap_err();
    assert_eq!(err.reason(), Some(ValidationReason::MissingRequiredField));

    single(json!({ "type": "swift_mailer", "email_prototype": "monolog.prototype" }))
        .expect("prototype only");
}

/// Elasticsearch options override their defaults.
#[test]
fn elasticsearch_handler() {
    let config = single(json!({
        "type": "elasticsearch",
        "elasticsearch": { "id": "elastica.client" },
        "index": "my-index",
        "document_type": "my-record",
        "ignore_error": true
    }))
    .expect("config");
    let handler = config.handler("foo").expect("handler");
    assert_eq!(handler.flag("ignore_error"), Some(true));
    assert_eq!(handler.text("document_type"), Some("my-record"));
    assert_eq!(handler.text("index"), Some("my-index"));
}

/// Verbosity overrides keep the untouched tiers at their defaults.
#[test]
fn console_verbosity_levels() {
    let config = single(json!({
        "type": "console",
        "verbosity_levels": {
            "VERBOSITY_NORMAL": "NOTICE",
            "verbosity_verbose": "info",
            "VERBOSITY_very_VERBOSE": 150
        }
    }))
    .expect("config");
    let handler = config.handler("foo").expect("handler");
    let Some(FieldValue::Verbosity(levels)) = handler.option("verbosity_levels") else {
        panic!("verbosity levels missing");
    };
    assert_eq!(levels.get(Verbosity::Normal), Level::NOTICE);
    assert_eq!(levels.get(Verbosity::Verbose), Level::INFO);
    assert_eq!(levels.get(Verbosity::VeryVerbose), Level::from_code(150));
    assert_eq!(levels.get(Verbosity::Quiet), Level::ERROR);
    assert_eq!(levels.get(Verbosity::Debug), Level::DEBUG);

    let rendered = config.to_value().expect("value");
    assert_eq!(
        rendered["handlers"]["foo"]["verbosity_levels"],
        json!({
            "VERBOSITY_QUIET": 400,
            "VERBOSITY_NORMAL": 250,
            "VERBOSITY_VERBOSE": 200,
            "VERBOSITY_VERY_VERBOSE": 150,
            "VERBOSITY_DEBUG": 100
        })
    );
}

/// Octal strings and integers both describe file permissions.
#[test]
fn file_permission_coercion() {
    let config = LoggingConfig::from_value(json!({
        "handlers": {
            "foo": { "type": "stream", "path": "/foo", "file_permission": "0666" },
            "bar": { "type": "stream", "path": "/bar", "file_permission": 0o777 }
        }
    }))
    .expect("config");
    assert_eq!(
        config.handler("foo").expect("foo").integer("file_permission"),
        Some(0o666)
    );
    assert_eq!(
        config.handler("bar").expect("bar").integer("file_permission"),
        Some(0o777)
    );
}

/// Locking is off unless requested.
#[test]
fn use_locking() {
    let config = LoggingConfig::from_value(json!({
        "handlers": {
            "foo": { "type": "stream", "path": "/foo", "use_locking": false },
            "bar": { "type": "stream", "path": "/bar", "use_locking": true },
            "baz": { "type": "stream", "path": "/baz" }
        }
    }))
    .expect("config");
    assert_eq!(config.handler("foo").expect("foo").flag("use_locking"), Some(false));
    assert_eq!(config.handler("bar").expect("bar").flag("use_locking"), Some(true));
    assert_eq!(config.handler("baz").expect("baz").flag("use_locking"), Some(false));
}

/// Nested handlers are flagged and listed.
#[test]
fn nested_handler() {
    let config = LoggingConfig::from_value(json!({
        "handlers": {
            "main": { "type": "fingers_crossed", "handler": "nested" },
            "nested": { "type": "stream", "path": "/foo/bar", "nested": true }
        }
    }))
    .expect("config");
    let nested: Vec<&str> = config.nested_handlers().map(|(name, _)| name).collect();
    assert_eq!(nested, vec!["nested"]);
    assert_eq!(
        config.handler("main").expect("main").wrapped_handlers(),
        vec!["nested"]
    );
}

/// Inline redis settings keep what was given and default the rest.
#[test]
fn redis_inline_parameters() {
    let config = single(json!({
        "type": "redis",
        "redis": {
            "host": "127.0.1.1",
            "password": "pa$$w0rd",
            "port": 1234,
            "database": 1,
            "key_name": "monolog_redis_test"
        }
    }))
    .expect("config");
    let rendered = config.to_value().expect("value");
    assert_eq!(
        rendered["handlers"]["foo"]["redis"],
        json!({
            "host": "127.0.1.1",
            "password": "pa$$w0rd",
            "port": 1234,
            "database": 1,
            "key_name": "monolog_redis_test"
        })
    );

    let config = single(json!({
        "type": "predis",
        "redis": { "host": "127.0.1.1", "key_name": "monolog_redis_test" }
    }))
    .expect("config");
    let rendered = config.to_value().expect("value");
    assert_eq!(
        rendered["handlers"]["foo"]["redis"],
        json!({
            "host": "127.0.1.1",
            "port": 6379,
            "database": 0,
            "key_name": "monolog_redis_test"
        })
    );
}

/// A later layer wins for scalar fields of the same handler.
#[test]
fn later_layer_overrides_scalars() {
    let config = process(vec![
        json!({ "handlers": { "main": { "type": "stream", "path": "/a", "level": "DEBUG" } } }),
        json!({ "handlers": { "main": { "path": "/b", "level": "ERROR", "bubble": false } } }),
    ])
    .expect("config");
    let handler = config.handler("main").expect("main");
    assert_eq!(handler.text("path"), Some("/b"));
    assert_eq!(handler.level, Level::ERROR);
    assert!(!handler.bubble);
}

/// List fields are replaced by later layers, not appended to.
#[test]
fn later_layer_replaces_lists() {
    let config = process(vec![
        json!({ "handlers": { "group": { "type": "group", "members": ["a", "b"] } } }),
        json!({ "handlers": { "group": { "members": ["c"] } } }),
    ])
    .expect("config");
    assert_eq!(
        config.handler("group").expect("group").wrapped_handlers(),
        vec!["c"]
    );
}

/// Required fields may come from any layer.
#[test]
fn required_field_from_later_layer() {
    let config = process(vec![
        json!({ "handlers": { "main": { "type": "stream" } } }),
        json!({ "handlers": { "main": { "path": "/var/log/app.log" } } }),
    ])
    .expect("config");
    assert_eq!(
        config.handler("main").expect("main").text("path"),
        Some("/var/log/app.log")
    );
}

/// A layer-local error names the layer it came from.
#[test]
fn layer_errors_name_their_layer() {
    let err = process(vec![
        json!({ "handlers": { "main": { "type": "stream", "path": "/a" } } }),
        json!({ "handlers": { "main": { "type": "carrier_pigeon" } } }),
    ])
    .unwrap_err();
    assert_eq!(err.reason(), Some(ValidationReason::UnknownType));
    assert_eq!(err.path(), Some("layer1:handlers.main.type"));
    assert_eq!(err.handler(), Some("main"));
}

/// A handler that never receives a type fails after merging.
#[test]
fn missing_type_fails() {
    let err = process(vec![json!({ "handlers": { "main": { "path": "/a" } } })]).unwrap_err();
    assert_eq!(err.reason(), Some(ValidationReason::MissingRequiredField));
    assert_eq!(err.path(), Some("effective:handlers.main.type"));
}

/// Unknown top-level sections are rejected.
#[test]
fn rejects_unknown_top_level_key() {
    let err = LoggingConfig::from_value(json!({ "processors": [] })).unwrap_err();
    assert_eq!(err.reason(), Some(ValidationReason::UnrecognizedField));
    assert!(format!("{err}").contains("config:processors"));
}

/// Top-level sections have their own defaults.
#[test]
fn top_level_sections() {
    let config = LoggingConfig::from_value(json!({
        "channels": ["security", "audit"],
        "use_microseconds": false
    }))
    .expect("config");
    assert_eq!(config.channels, vec!["security", "audit"]);
    assert!(!config.use_microseconds);
    assert!(config.handlers.is_empty());
}

/// Both fingers_crossed activation controls may not be set together.
#[test]
fn fingers_crossed_rejects_level_and_strategy() {
    let err = single(json!({
        "type": "fingers_crossed",
        "handler": "nested",
        "action_level": "ERROR",
        "activation_strategy": "app.strategy"
    }))
    .unwrap_err();
    assert_eq!(err.reason(), Some(ValidationReason::MutuallyExclusiveFields));
}

/// Both exclusion lists may not be set together.
#[test]
fn fingers_crossed_rejects_both_exclusion_lists() {
    let err = single(json!({
        "type": "fingers_crossed",
        "handler": "nested",
        "excluded_404s": ["^/foo"],
        "excluded_http_codes": [404]
    }))
    .unwrap_err();
    assert_eq!(err.reason(), Some(ValidationReason::MutuallyExclusiveFields));
}

/// The action level defaults only without an activation strategy.
#[test]
fn fingers_crossed_defaults() {
    let config = single(json!({ "type": "fingers_crossed", "handler": "nested" }))
        .expect("config");
    let handler = config.handler("foo").expect("handler");
    assert_eq!(handler.level_option("action_level"), Some(Level::WARNING));
    assert_eq!(handler.flag("stop_buffering"), Some(true));
    assert_eq!(handler.integer("buffer_size"), Some(0));

    let config = single(json!({
        "type": "fingers_crossed",
        "handler": "nested",
        "activation_strategy": "app.strategy"
    }))
    .expect("config");
    assert_eq!(config.handler("foo").expect("handler").option("action_level"), None);
}

/// Excluded HTTP codes accept codes and code-to-urls mappings.
#[test]
fn fingers_crossed_excluded_http_codes() {
    let config = single(json!({
        "type": "fingers_crossed",
        "handler": "nested",
        "excluded_http_codes": [403, { "404": ["^/foo", "^/bar"] }]
    }))
    .expect("config");
    let rendered = config.to_value().expect("value");
    assert_eq!(
        rendered["handlers"]["foo"]["excluded_http_codes"],
        json!([
            { "code": 403, "urls": [] },
            { "code": 404, "urls": ["^/foo", "^/bar"] }
        ])
    );
}

/// Accepted levels and a min/max range are alternatives.
#[test]
fn filter_rejects_levels_and_range() {
    let err = single(json!({
        "type": "filter",
        "handler": "nested",
        "accepted_levels": ["DEBUG"],
        "max_level": "ERROR"
    }))
    .unwrap_err();
    assert_eq!(err.reason(), Some(ValidationReason::MutuallyExclusiveFields));
}

/// A filter without accepted levels spans the whole scale by default.
#[test]
fn filter_range_defaults() {
    let config = single(json!({ "type": "filter", "handler": "nested" })).expect("config");
    let handler = config.handler("foo").expect("handler");
    assert_eq!(handler.level_option("min_level"), Some(Level::DEBUG));
    assert_eq!(handler.level_option("max_level"), Some(Level::EMERGENCY));

    let config = single(json!({
        "type": "filter",
        "handler": "nested",
        "accepted_levels": ["ERROR", "ALERT"]
    }))
    .expect("config");
    let handler = config.handler("foo").expect("handler");
    assert_eq!(handler.option("min_level"), None);
    assert_eq!(handler.option("max_level"), None);
}

/// An empty list does not count as set for exclusivity checks.
#[test]
fn empty_lists_do_not_conflict() {
    let config = single(json!({
        "type": "fingers_crossed",
        "handler": "nested",
        "excluded_404s": [],
        "excluded_http_codes": [404]
    }))
    .expect("config");
    assert!(config.handler("foo").is_some());

    let config = single(json!({
        "type": "filter",
        "handler": "nested",
        "accepted_levels": [],
        "max_level": "ERROR"
    }))
    .expect("config");
    let handler = config.handler("foo").expect("handler");
    assert_eq!(handler.level_option("min_level"), Some(Level::DEBUG));
    assert_eq!(handler.level_option("max_level"), Some(Level::ERROR));
}

/// Syslog options and error_log message types keep strings as given.
#[test]
fn integer_or_string_fields() {
    let config = single(json!({ "type": "syslog", "logopts": "LOGPID" })).expect("config");
    assert_eq!(config.handler("foo").expect("handler").text("logopts"), Some("LOGPID"));

    let config = single(json!({ "type": "syslog" })).expect("config");
    assert_eq!(config.handler("foo").expect("handler").integer("logopts"), Some(1));

    let config = single(json!({ "type": "error_log", "message_type": "1" })).expect("config");
    assert_eq!(
        config.handler("foo").expect("handler").text("message_type"),
        Some("1")
    );

    let err = single(json!({ "type": "syslog", "logopts": [1] })).unwrap_err();
    assert_eq!(err.reason(), Some(ValidationReason::InvalidValue));
}

/// An explicit null type selects the null handler.
#[test]
fn null_type_is_null_handler() {
    let config = single(json!({ "type": null })).expect("config");
    assert_eq!(
        config.handler("foo").expect("handler").handler_type,
        HandlerType::Null
    );
}

/// Groups need at least one member.
#[test]
fn group_requires_members() {
    let err = single(json!({ "type": "group", "members": [] })).unwrap_err();
    assert_eq!(err.reason(), Some(ValidationReason::InvalidValue));

    let err = single(json!({ "type": "whatfailuregroup" })).unwrap_err();
    assert_eq!(err.reason(), Some(ValidationReason::MissingRequiredField));
    assert_eq!(err.path(), Some("effective:handlers.foo.members"));
}

/// Unknown level names are rejected.
#[test]
fn rejects_unknown_level_name() {
    let err = single(json!({ "type": "stream", "path": "/foo", "level": "LOUD" })).unwrap_err();
    assert_eq!(err.reason(), Some(ValidationReason::InvalidValue));
    assert_eq!(err.path(), Some("effective:handlers.foo.level"));
}

/// Explicit nulls behave like absent optional fields.
#[test]
fn null_means_unset() {
    let config = single(json!({
        "type": "stream",
        "path": "/foo",
        "level": null,
        "use_locking": null
    }))
    .expect("config");
    let handler = config.handler("foo").expect("handler");
    assert_eq!(handler.level, Level::DEBUG);
    assert_eq!(handler.flag("use_locking"), Some(false));
}

/// Failures from separate handlers are reported together.
#[test]
fn collects_errors_across_handlers() {
    let err = LoggingConfig::from_value(json!({
        "handlers": {
            "a": { "type": "stream" },
            "b": { "type": "group", "members": ["a"], "level": "DEBUG" },
            "c": { "type": "null" }
        }
    }))
    .unwrap_err();
    let violations = err.violations();
    assert_eq!(violations.len(), 2);
    assert_eq!(violations[0].handler(), Some("a"));
    assert_eq!(
        violations[0].reason(),
        Some(ValidationReason::MissingRequiredField)
    );
    assert_eq!(violations[1].handler(), Some("b"));
    assert_eq!(
        violations[1].reason(),
        Some(ValidationReason::UnrecognizedField)
    );
}

/// Service handlers only take an id.
#[test]
fn service_handler() {
    let config = single(json!({ "type": "service", "id": "app.log_handler", "priority": 5 }))
        .expect("config");
    let handler = config.handler("foo").expect("handler");
    assert_eq!(handler.text("id"), Some("app.log_handler"));
    assert_eq!(handler.priority, 5);

    let err = single(json!({ "type": "service", "id": "x", "level": "DEBUG" })).unwrap_err();
    assert_eq!(err.reason(), Some(ValidationReason::UnrecognizedField));
}
