//! Per-variant schema descriptors.
//!
//! Each handler type maps to a closed set of fields. Dispatch is a single
//! lookup on the `type` discriminant; nothing is inherited between variants.

use crate::{FieldValue, HandlerType, Level, VerbosityLevelMap};
use serde_json::Map;

/// Keys every handler accepts regardless of type.
pub(super) const COMMON_KEYS: &[&str] = &["type", "priority", "channels", "nested", "formatter"];

/// Shape and coercion applied to a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FieldKind {
    Text,
    Flag,
    Integer,
    /// Integer or string, kept as given.
    Scalar,
    Count,
    Port,
    Float,
    Level,
    LevelList,
    TextList,
    TextOrList,
    Members,
    FilePermission,
    Reference,
    Redis,
    Mongo,
    Elasticsearch,
    Gelf,
    EmailPrototype,
    HttpCodes,
    Verbosity,
    Map,
}

/// Value used when an optional field is absent.
#[derive(Debug, Clone, Copy)]
pub(super) enum Fallback {
    Bool(bool),
    Integer(i64),
    Text(&'static str),
    Level(Level),
    EmptyList,
    EmptyMap,
    Verbosity,
}

impl Fallback {
    pub(super) fn value(self) -> FieldValue {
        match self {
            Self::Bool(value) => FieldValue::Bool(value),
            Self::Integer(value) => FieldValue::Integer(value),
            Self::Text(value) => FieldValue::Text(value.to_string()),
            Self::Level(value) => FieldValue::Level(value),
            Self::EmptyList => FieldValue::TextList(Vec::new()),
            Self::EmptyMap => FieldValue::Map(Map::new()),
            Self::Verbosity => FieldValue::Verbosity(VerbosityLevelMap::default()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(super) enum Presence {
    Optional,
    Required,
    Default(Fallback),
    /// Defaulted only while the named sibling field is absent.
    DefaultUnless(&'static str, Fallback),
}

#[derive(Debug, Clone, Copy)]
pub(super) struct Field {
    pub name: &'static str,
    pub kind: FieldKind,
    pub presence: Presence,
}

/// Cross-field constraint within one handler.
#[derive(Debug, Clone, Copy)]
pub(super) enum Rule {
    /// Fields from both groups may not be set together.
    Exclusive(&'static [&'static str], &'static [&'static str]),
    /// At least one group must be fully present.
    OneOf(&'static [&'static [&'static str]]),
}

/// Closed schema for one handler type.
#[derive(Debug, Clone, Copy)]
pub(super) struct HandlerSchema {
    /// Whether the handler accepts its own `level` key.
    pub level: bool,
    pub bubble: bool,
    pub fields: &'static [Field],
    pub rules: &'static [Rule],
}

impl HandlerSchema {
    /// Whether `key` may appear on a handler of this type.
    pub(super) fn accepts(&self, key: &str) -> bool {
        COMMON_KEYS.contains(&key)
            || (self.level && key == "level")
            || (self.bubble && key == "bubble")
            || self.fields.iter().any(|field| field.name == key)
    }
}

const fn optional(name: &'static str, kind: FieldKind) -> Field {
    Field {
        name,
        kind,
        presence: Presence::Optional,
    }
}

const fn required(name: &'static str, kind: FieldKind) -> Field {
    Field {
        name,
        kind,
        presence: Presence::Required,
    }
}

const fn defaulted(name: &'static str, kind: FieldKind, fallback: Fallback) -> Field {
    Field {
        name,
        kind,
        presence: Presence::Default(fallback),
    }
}

const NONE: &[Field] = &[];

const STREAM: &[Field] = &[
    required("path", FieldKind::Text),
    optional("file_permission", FieldKind::FilePermission),
    defaulted("use_locking", FieldKind::Flag, Fallback::Bool(false)),
];

const ROTATING_FILE: &[Field] = &[
    required("path", FieldKind::Text),
    optional("file_permission", FieldKind::FilePermission),
    defaulted("max_files", FieldKind::Count, Fallback::Integer(0)),
    defaulted(
        "filename_format",
        FieldKind::Text,
        Fallback::Text("{filename}-{date}"),
    ),
    defaulted("date_format", FieldKind::Text, Fallback::Text("Y-m-d")),
];

const CONSOLE: &[Field] = &[
    defaulted("verbosity_levels", FieldKind::Verbosity, Fallback::Verbosity),
    defaulted("console_formater_options", FieldKind::Map, Fallback::EmptyMap),
];

const GELF: &[Field] = &[required("publisher", FieldKind::Gelf)];

const MONGO: &[Field] = &[required("mongo", FieldKind::Mongo)];

const ELASTICSEARCH: &[Field] = &[
    required("elasticsearch", FieldKind::Elasticsearch),
    defaulted("index", FieldKind::Text, Fallback::Text("monolog")),
    defaulted("document_type", FieldKind::Text, Fallback::Text("logs")),
    defaulted("ignore_error", FieldKind::Flag, Fallback::Bool(false)),
];

const REDIS: &[Field] = &[required("redis", FieldKind::Redis)];

const FINGERS_CROSSED: &[Field] = &[
    required("handler", FieldKind::Text),
    Field {
        name: "action_level",
        kind: FieldKind::Level,
        presence: Presence::DefaultUnless("activation_strategy", Fallback::Level(Level::WARNING)),
    },
    optional("activation_strategy", FieldKind::Text),
    optional("excluded_404s", FieldKind::TextList),
    optional("excluded_http_codes", FieldKind::HttpCodes),
    defaulted("buffer_size", FieldKind::Count, Fallback::Integer(0)),
    defaulted("stop_buffering", FieldKind::Flag, Fallback::Bool(true)),
    optional("passthru_level", FieldKind::Level),
];

const FINGERS_CROSSED_RULES: &[Rule] = &[
    Rule::Exclusive(&["action_level"], &["activation_strategy"]),
    Rule::Exclusive(&["excluded_404s"], &["excluded_http_codes"]),
    Rule::Exclusive(&["activation_strategy"], &["excluded_404s", "excluded_http_codes"]),
];

const FILTER: &[Field] = &[
    required("handler", FieldKind::Text),
    optional("accepted_levels", FieldKind::LevelList),
    Field {
        name: "min_level",
        kind: FieldKind::Level,
        presence: Presence::DefaultUnless("accepted_levels", Fallback::Level(Level::DEBUG)),
    },
    Field {
        name: "max_level",
        kind: FieldKind::Level,
        presence: Presence::DefaultUnless("accepted_levels", Fallback::Level(Level::EMERGENCY)),
    },
];

const FILTER_RULES: &[Rule] = &[Rule::Exclusive(
    &["accepted_levels"],
    &["min_level", "max_level"],
)];

const BUFFER: &[Field] = &[
    required("handler", FieldKind::Text),
    defaulted("buffer_size", FieldKind::Count, Fallback::Integer(0)),
    defaulted("flush_on_overflow", FieldKind::Flag, Fallback::Bool(false)),
];

const DEDUPLICATION: &[Field] = &[
    required("handler", FieldKind::Text),
    optional("store", FieldKind::Text),
    defaulted(
        "deduplication_level",
        FieldKind::Level,
        Fallback::Level(Level::ERROR),
    ),
    defaulted("time", FieldKind::Count, Fallback::Integer(60)),
];

const GROUP: &[Field] = &[required("members", FieldKind::Members)];

const SWIFT_MAILER: &[Field] = &[
    optional("from_email", FieldKind::Text),
    optional("to_email", FieldKind::TextOrList),
    optional("subject", FieldKind::Text),
    optional("email_prototype", FieldKind::EmailPrototype),
    optional("mailer", FieldKind::Reference),
    optional("content_type", FieldKind::Text),
    defaulted("headers", FieldKind::TextList, Fallback::EmptyList),
    defaulted("lazy", FieldKind::Flag, Fallback::Bool(true)),
];

const SWIFT_MAILER_RULES: &[Rule] = &[Rule::OneOf(&[
    &["from_email", "to_email", "subject"],
    &["email_prototype"],
])];

const NATIVE_MAILER: &[Field] = &[
    required("from_email", FieldKind::Text),
    required("to_email", FieldKind::TextOrList),
    required("subject", FieldKind::Text),
    defaulted("headers", FieldKind::TextList, Fallback::EmptyList),
];

const SYSLOG: &[Field] = &[
    optional("ident", FieldKind::Text),
    defaulted("facility", FieldKind::Text, Fallback::Text("user")),
    defaulted("logopts", FieldKind::Scalar, Fallback::Integer(1)),
];

const SYSLOG_UDP: &[Field] = &[
    required("host", FieldKind::Text),
    defaulted("port", FieldKind::Port, Fallback::Integer(514)),
    defaulted("facility", FieldKind::Text, Fallback::Text("user")),
    optional("ident", FieldKind::Text),
];

const SOCKET: &[Field] = &[
    required("connection_string", FieldKind::Text),
    optional("timeout", FieldKind::Float),
    optional("connection_timeout", FieldKind::Float),
    defaulted("persistent", FieldKind::Flag, Fallback::Bool(false)),
];

const PUSHOVER: &[Field] = &[
    required("token", FieldKind::Text),
    required("user", FieldKind::TextOrList),
    optional("title", FieldKind::Text),
    optional("timeout", FieldKind::Float),
    optional("connection_timeout", FieldKind::Float),
];

const RAVEN: &[Field] = &[
    optional("dsn", FieldKind::Text),
    optional("client_id", FieldKind::Text),
    optional("release", FieldKind::Text),
    optional("environment", FieldKind::Text),
    defaulted("auto_log_stacks", FieldKind::Flag, Fallback::Bool(false)),
];

const RAVEN_RULES: &[Rule] = &[Rule::OneOf(&[&["dsn"], &["client_id"]])];

const NEWRELIC: &[Field] = &[optional("app_name", FieldKind::Text)];

const HIPCHAT: &[Field] = &[
    required("token", FieldKind::Text),
    required("room", FieldKind::Text),
    defaulted("notify", FieldKind::Flag, Fallback::Bool(false)),
    defaulted("nickname", FieldKind::Text, Fallback::Text("Monolog")),
    defaulted("use_ssl", FieldKind::Flag, Fallback::Bool(true)),
    defaulted("message_format", FieldKind::Text, Fallback::Text("text")),
    optional("host", FieldKind::Text),
    optional("api_version", FieldKind::Text),
    optional("timeout", FieldKind::Float),
    optional("connection_timeout", FieldKind::Float),
];

const SLACK: &[Field] = &[
    required("token", FieldKind::Text),
    required("channel", FieldKind::Text),
    defaulted("bot_name", FieldKind::Text, Fallback::Text("Monolog")),
    optional("icon_emoji", FieldKind::Text),
    defaulted("use_attachment", FieldKind::Flag, Fallback::Bool(true)),
    defaulted("use_short_attachment", FieldKind::Flag, Fallback::Bool(false)),
    defaulted("include_extra", FieldKind::Flag, Fallback::Bool(false)),
    optional("timeout", FieldKind::Float),
    optional("connection_timeout", FieldKind::Float),
];

const SLACK_WEBHOOK: &[Field] = &[
    required("webhook_url", FieldKind::Text),
    required("channel", FieldKind::Text),
    defaulted("bot_name", FieldKind::Text, Fallback::Text("Monolog")),
    optional("icon_emoji", FieldKind::Text),
    defaulted("use_attachment", FieldKind::Flag, Fallback::Bool(true)),
    defaulted("use_short_attachment", FieldKind::Flag, Fallback::Bool(false)),
    defaulted("include_extra", FieldKind::Flag, Fallback::Bool(false)),
];

const SLACK_BOT: &[Field] = &[
    required("team", FieldKind::Text),
    required("token", FieldKind::Text),
    required("channel", FieldKind::Text),
];

const CUBE: &[Field] = &[required("url", FieldKind::Text)];

const AMQP: &[Field] = &[
    required("exchange", FieldKind::Reference),
    defaulted("exchange_name", FieldKind::Text, Fallback::Text("log")),
];

const ERROR_LOG: &[Field] = &[defaulted(
    "message_type",
    FieldKind::Scalar,
    Fallback::Integer(0),
)];

const LOGGLY: &[Field] = &[
    required("token", FieldKind::Text),
    defaulted("tags", FieldKind::TextOrList, Fallback::EmptyList),
];

const LOGENTRIES: &[Field] = &[
    required("token", FieldKind::Text),
    defaulted("use_ssl", FieldKind::Flag, Fallback::Bool(true)),
    optional("timeout", FieldKind::Float),
    optional("connection_timeout", FieldKind::Float),
];

const INSIGHTOPS: &[Field] = &[
    required("token", FieldKind::Text),
    defaulted("region", FieldKind::Text, Fallback::Text("us")),
    defaulted("use_ssl", FieldKind::Flag, Fallback::Bool(true)),
    optional("timeout", FieldKind::Float),
    optional("connection_timeout", FieldKind::Float),
];

const FLOWDOCK: &[Field] = &[
    required("token", FieldKind::Text),
    required("source", FieldKind::Text),
    required("from_email", FieldKind::Text),
];

const ROLLBAR: &[Field] = &[
    optional("id", FieldKind::Text),
    optional("token", FieldKind::Text),
    optional("config", FieldKind::Map),
];

const ROLLBAR_RULES: &[Rule] = &[Rule::OneOf(&[&["id"], &["token"]])];

const SERVER_LOG: &[Field] = &[required("host", FieldKind::Text)];

const SERVICE: &[Field] = &[required("id", FieldKind::Text)];

/// Schema for a handler that accepts `level` and `bubble` plus `fields`.
const fn sink(fields: &'static [Field], rules: &'static [Rule]) -> HandlerSchema {
    HandlerSchema {
        level: true,
        bubble: true,
        fields,
        rules,
    }
}

/// Look up the closed schema for a handler type.
pub(super) fn schema_for(kind: HandlerType) -> HandlerSchema {
    match kind {
        HandlerType::Stream => sink(STREAM, &[]),
        HandlerType::RotatingFile => sink(ROTATING_FILE, &[]),
        HandlerType::Console => sink(CONSOLE, &[]),
        HandlerType::FirePhp
        | HandlerType::BrowserConsole
        | HandlerType::ChromePhp
        | HandlerType::Null
        | HandlerType::Test
        | HandlerType::Debug => sink(NONE, &[]),
        HandlerType::Gelf => sink(GELF, &[]),
        HandlerType::Mongo => sink(MONGO, &[]),
        HandlerType::Elasticsearch => sink(ELASTICSEARCH, &[]),
        HandlerType::Redis | HandlerType::Predis => HandlerSchema {
            level: false,
            bubble: false,
            fields: REDIS,
            rules: &[],
        },
        HandlerType::FingersCrossed => HandlerSchema {
            level: false,
            bubble: true,
            fields: FINGERS_CROSSED,
            rules: FINGERS_CROSSED_RULES,
        },
        HandlerType::Filter => HandlerSchema {
            level: false,
            bubble: true,
            fields: FILTER,
            rules: FILTER_RULES,
        },
        HandlerType::Buffer => sink(BUFFER, &[]),
        HandlerType::Deduplication => HandlerSchema {
            level: false,
            bubble: true,
            fields: DEDUPLICATION,
            rules: &[],
        },
        HandlerType::Group | HandlerType::WhatFailureGroup => HandlerSchema {
            level: false,
            bubble: true,
            fields: GROUP,
            rules: &[],
        },
        HandlerType::SwiftMailer => sink(SWIFT_MAILER, SWIFT_MAILER_RULES),
        HandlerType::NativeMailer => sink(NATIVE_MAILER, &[]),
        HandlerType::Syslog => sink(SYSLOG, &[]),
        HandlerType::SyslogUdp => sink(SYSLOG_UDP, &[]),
        HandlerType::Socket => sink(SOCKET, &[]),
        HandlerType::Pushover => sink(PUSHOVER, &[]),
        HandlerType::Raven | HandlerType::Sentry => sink(RAVEN, RAVEN_RULES),
        HandlerType::NewRelic => sink(NEWRELIC, &[]),
        HandlerType::HipChat => sink(HIPCHAT, &[]),
        HandlerType::Slack => sink(SLACK, &[]),
        HandlerType::SlackWebhook => sink(SLACK_WEBHOOK, &[]),
        HandlerType::SlackBot => sink(SLACK_BOT, &[]),
        HandlerType::Cube => sink(CUBE, &[]),
        HandlerType::Amqp => sink(AMQP, &[]),
        HandlerType::ErrorLog => sink(ERROR_LOG, &[]),
        HandlerType::Loggly => sink(LOGGLY, &[]),
        HandlerType::Logentries => sink(LOGENTRIES, &[]),
        HandlerType::InsightOps => sink(INSIGHTOPS, &[]),
        HandlerType::Flowdock => sink(FLOWDOCK, &[]),
        HandlerType::Rollbar => sink(ROLLBAR, ROLLBAR_RULES),
        HandlerType::ServerLog => sink(SERVER_LOG, &[]),
        HandlerType::Service => HandlerSchema {
            level: false,
            bubble: false,
            fields: SERVICE,
            rules: &[],
        },
    }
}
