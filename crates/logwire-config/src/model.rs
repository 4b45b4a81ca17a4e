//! Normalized configuration tree produced by the loader.

use crate::Level;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Root of a validated logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggingConfig {
    /// Handlers keyed by name.
    pub handlers: BTreeMap<String, HandlerConfig>,
    /// Extra channel names to declare up front.
    pub channels: Vec<String>,
    pub use_microseconds: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            handlers: BTreeMap::new(),
            channels: Vec::new(),
            use_microseconds: true,
        }
    }
}

impl LoggingConfig {
    /// Look up a handler by name.
    pub fn handler(&self, name: &str) -> Option<&HandlerConfig> {
        self.handlers.get(name)
    }

    /// Handlers that are referenced by a wrapper rather than run directly.
    pub fn nested_handlers(&self) -> impl Iterator<Item = (&str, &HandlerConfig)> {
        self.handlers
            .iter()
            .filter(|(_, handler)| handler.nested)
            .map(|(name, handler)| (name.as_str(), handler))
    }
}

/// One normalized entry of the `handlers` mapping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandlerConfig {
    #[serde(rename = "type")]
    pub handler_type: HandlerType,
    pub priority: i64,
    pub level: Level,
    pub bubble: bool,
    pub channels: ChannelFilter,
    pub nested: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatter: Option<String>,
    /// Variant-specific fields after coercion and defaulting.
    #[serde(flatten)]
    pub options: BTreeMap<String, FieldValue>,
}

impl HandlerConfig {
    /// Variant-specific field by name.
    pub fn option(&self, name: &str) -> Option<&FieldValue> {
        self.options.get(name)
    }

    /// String-valued field.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.option(name)? {
            FieldValue::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Boolean field.
    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.option(name)? {
            FieldValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Integer field.
    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.option(name)? {
            FieldValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// Severity field other than the handler's own `level`.
    pub fn level_option(&self, name: &str) -> Option<Level> {
        match self.option(name)? {
            FieldValue::Level(value) => Some(*value),
            _ => None,
        }
    }

    /// Names of the handlers this wrapper delegates to.
    pub fn wrapped_handlers(&self) -> Vec<&str> {
        match (self.option("handler"), self.option("members")) {
            (Some(FieldValue::Text(name)), _) => vec![name.as_str()],
            (_, Some(FieldValue::TextList(names))) => names.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

/// Handler variants known to the schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandlerType {
    Stream,
    RotatingFile,
    Console,
    FirePhp,
    BrowserConsole,
    ChromePhp,
    Gelf,
    Mongo,
    Elasticsearch,
    Redis,
    Predis,
    FingersCrossed,
    Filter,
    Buffer,
    Deduplication,
    Group,
    WhatFailureGroup,
    SwiftMailer,
    NativeMailer,
    Syslog,
    SyslogUdp,
    Socket,
    Pushover,
    Raven,
    Sentry,
    NewRelic,
    HipChat,
    Slack,
    SlackWebhook,
    SlackBot,
    Cube,
    Amqp,
    ErrorLog,
    Loggly,
    Logentries,
    InsightOps,
    Flowdock,
    Rollbar,
    ServerLog,
    Service,
    Null,
    Test,
    Debug,
}

impl HandlerType {
    /// Every variant, in declaration order.
    pub const ALL: [HandlerType; 43] = [
        Self::Stream,
        Self::RotatingFile,
        Self::Console,
        Self::FirePhp,
        Self::BrowserConsole,
        Self::ChromePhp,
        Self::Gelf,
        Self::Mongo,
        Self::Elasticsearch,
        Self::Redis,
        Self::Predis,
        Self::FingersCrossed,
        Self::Filter,
        Self::Buffer,
        Self::Deduplication,
        Self::Group,
        Self::WhatFailureGroup,
        Self::SwiftMailer,
        Self::NativeMailer,
        Self::Syslog,
        Self::SyslogUdp,
        Self::Socket,
        Self::Pushover,
        Self::Raven,
        Self::Sentry,
        Self::NewRelic,
        Self::HipChat,
        Self::Slack,
        Self::SlackWebhook,
        Self::SlackBot,
        Self::Cube,
        Self::Amqp,
        Self::ErrorLog,
        Self::Loggly,
        Self::Logentries,
        Self::InsightOps,
        Self::Flowdock,
        Self::Rollbar,
        Self::ServerLog,
        Self::Service,
        Self::Null,
        Self::Test,
        Self::Debug,
    ];

    /// Name used in configuration input.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Stream => "stream",
            Self::RotatingFile => "rotating_file",
            Self::Console => "console",
            Self::FirePhp => "firephp",
            Self::BrowserConsole => "browser_console",
            Self::ChromePhp => "chromephp",
            Self::Gelf => "gelf",
            Self::Mongo => "mongo",
            Self::Elasticsearch => "elasticsearch",
            Self::Redis => "redis",
            Self::Predis => "predis",
            Self::FingersCrossed => "fingers_crossed",
            Self::Filter => "filter",
            Self::Buffer => "buffer",
            Self::Deduplication => "deduplication",
            Self::Group => "group",
            Self::WhatFailureGroup => "whatfailuregroup",
            Self::SwiftMailer => "swift_mailer",
            Self::NativeMailer => "native_mailer",
            Self::Syslog => "syslog",
            Self::SyslogUdp => "syslogudp",
            Self::Socket => "socket",
            Self::Pushover => "pushover",
            Self::Raven => "raven",
            Self::Sentry => "sentry",
            Self::NewRelic => "newrelic",
            Self::HipChat => "hipchat",
            Self::Slack => "slack",
            Self::SlackWebhook => "slackwebhook",
            Self::SlackBot => "slackbot",
            Self::Cube => "cube",
            Self::Amqp => "amqp",
            Self::ErrorLog => "error_log",
            Self::Loggly => "loggly",
            Self::Logentries => "logentries",
            Self::InsightOps => "insightops",
            Self::Flowdock => "flowdock",
            Self::Rollbar => "rollbar",
            Self::ServerLog => "server_log",
            Self::Service => "service",
            Self::Null => "null",
            Self::Test => "test",
            Self::Debug => "debug",
        }
    }

    /// Whether the variant wraps other handlers by reference.
    pub fn is_wrapper(self) -> bool {
        matches!(
            self,
            Self::FingersCrossed
                | Self::Filter
                | Self::Buffer
                | Self::Deduplication
                | Self::Group
                | Self::WhatFailureGroup
        )
    }
}

impl FromStr for HandlerType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| format!("unknown handler type \"{raw}\""))
    }
}

impl fmt::Display for HandlerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for HandlerType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Polarity of a channel filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelFilterType {
    #[default]
    Inclusive,
    Exclusive,
}

/// Channel selection attached to a handler.
///
/// An empty element list places no restriction on channels.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ChannelFilter {
    #[serde(rename = "type")]
    pub filter_type: ChannelFilterType,
    pub elements: Vec<String>,
}

impl ChannelFilter {
    /// Filter passing only the listed channels.
    pub fn inclusive(elements: Vec<String>) -> Self {
        Self {
            filter_type: ChannelFilterType::Inclusive,
            elements,
        }
    }

    /// Filter passing every channel except the listed ones.
    pub fn exclusive(elements: Vec<String>) -> Self {
        Self {
            filter_type: ChannelFilterType::Exclusive,
            elements,
        }
    }

    /// True when the filter restricts nothing.
    pub fn is_unrestricted(&self) -> bool {
        self.elements.is_empty()
    }

    /// Whether records on `channel` reach the handler.
    pub fn allows(&self, channel: &str) -> bool {
        if self.is_unrestricted() {
            return true;
        }
        let listed = self.elements.iter().any(|element| element == channel);
        match self.filter_type {
            ChannelFilterType::Inclusive => listed,
            ChannelFilterType::Exclusive => !listed,
        }
    }
}

/// Reference to a service defined elsewhere in the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceReference {
    pub id: String,
}

impl ServiceReference {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Field that takes either a service reference or inline connection settings.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ServiceOrInline<T> {
    Service(ServiceReference),
    Inline(T),
}

/// Inline redis connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedisParams {
    pub host: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub port: u16,
    pub database: u32,
    pub key_name: String,
}

/// Inline mongo connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MongoParams {
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pwd: Option<String>,
    pub database: String,
    pub collection: String,
}

/// Inline elasticsearch client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ElasticsearchParams {
    pub host: String,
    pub port: u16,
    pub transport: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Inline gelf publisher settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GelfPublisherParams {
    pub hostname: String,
    pub port: u16,
    pub chunk_size: u32,
}

/// Message prototype for mailer handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailPrototype {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

/// HTTP status ignored by `fingers_crossed`, optionally only for some URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExcludedHttpCode {
    pub code: u16,
    pub urls: Vec<String>,
}

/// Console verbosity tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
    Debug,
}

impl Verbosity {
    /// Tiers from least to most verbose.
    pub const ALL: [Verbosity; 5] = [
        Self::Quiet,
        Self::Normal,
        Self::Verbose,
        Self::VeryVerbose,
        Self::Debug,
    ];

    /// Key used in the normalized tree.
    pub fn key(self) -> &'static str {
        match self {
            Self::Quiet => "VERBOSITY_QUIET",
            Self::Normal => "VERBOSITY_NORMAL",
            Self::Verbose => "VERBOSITY_VERBOSE",
            Self::VeryVerbose => "VERBOSITY_VERY_VERBOSE",
            Self::Debug => "VERBOSITY_DEBUG",
        }
    }

    fn default_level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARNING,
            Self::Verbose => Level::NOTICE,
            Self::VeryVerbose => Level::INFO,
            Self::Debug => Level::DEBUG,
        }
    }
}

impl FromStr for Verbosity {
    type Err = String;

    /// Accepts `VERBOSITY_VERY_VERBOSE`, `very_verbose` and similar spellings.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let upper = raw.trim().to_ascii_uppercase();
        let bare = upper.strip_prefix("VERBOSITY_").unwrap_or(&upper);
        Self::ALL
            .iter()
            .copied()
            .find(|tier| tier.key().strip_prefix("VERBOSITY_") == Some(bare))
            .ok_or_else(|| format!("unknown verbosity \"{raw}\""))
    }
}

/// Severity per console verbosity tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerbosityLevelMap {
    levels: [Level; 5],
}

impl Default for VerbosityLevelMap {
    fn default() -> Self {
        Self {
            levels: Verbosity::ALL.map(Verbosity::default_level),
        }
    }
}

impl VerbosityLevelMap {
    pub fn get(&self, tier: Verbosity) -> Level {
        self.levels[tier as usize]
    }

    pub fn set(&mut self, tier: Verbosity, level: Level) {
        self.levels[tier as usize] = level;
    }
}

impl Serialize for VerbosityLevelMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(Verbosity::ALL.len()))?;
        for tier in Verbosity::ALL {
            map.serialize_entry(tier.key(), &self.get(tier))?;
        }
        map.end()
    }
}

/// Coerced value of a variant-specific field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Level(Level),
    TextList(Vec<String>),
    LevelList(Vec<Level>),
    Reference(ServiceReference),
    Redis(ServiceOrInline<RedisParams>),
    Mongo(ServiceOrInline<MongoParams>),
    Elasticsearch(ServiceOrInline<ElasticsearchParams>),
    Gelf(ServiceOrInline<GelfPublisherParams>),
    Prototype(EmailPrototype),
    HttpCodes(Vec<ExcludedHttpCode>),
    Verbosity(VerbosityLevelMap),
    Map(Map<String, Value>),
}
