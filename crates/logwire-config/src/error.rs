//! Error types for config validation and normalization.

use std::fmt;
use thiserror::Error;

/// Why a configuration node was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationReason {
    /// `type` names no known handler variant.
    UnknownType,
    /// A key the resolved variant does not declare.
    UnrecognizedField,
    /// A field the variant requires is absent after merge.
    MissingRequiredField,
    /// A value failed its type, format or enum constraint.
    InvalidValue,
    /// Fields that cannot be combined were set together.
    MutuallyExclusiveFields,
    /// A channel filter mixes inclusive and exclusive entries.
    InconsistentChannelPolarity,
}

impl ValidationReason {
    /// Stable snake_case code for the reason.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::UnknownType => "unknown_type",
            Self::UnrecognizedField => "unrecognized_field",
            Self::MissingRequiredField => "missing_required_field",
            Self::InvalidValue => "invalid_value",
            Self::MutuallyExclusiveFields => "mutually_exclusive_fields",
            Self::InconsistentChannelPolarity => "inconsistent_channel_polarity",
        }
    }
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned while validating or rendering config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A specific field failed validation.
    #[error("invalid config at {path}: {message} ({reason})")]
    InvalidField {
        path: String,
        handler: Option<String>,
        reason: ValidationReason,
        message: String,
    },
    /// Several handlers failed validation in the same run.
    #[error("{}", summarize(.0))]
    Multiple(Vec<ConfigError>),
    /// Rendering the normalized tree failed.
    #[error("failed to encode config: {0}")]
    EncodeFailed(#[from] serde_json::Error),
}

impl ConfigError {
    /// Reason of the first validation failure, if any.
    pub fn reason(&self) -> Option<ValidationReason> {
        self.violations().first().and_then(|err| match err {
            Self::InvalidField { reason, .. } => Some(*reason),
            _ => None,
        })
    }

    /// Path of the first validation failure, if any.
    pub fn path(&self) -> Option<&str> {
        self.violations().into_iter().find_map(|err| match err {
            Self::InvalidField { path, .. } => Some(path.as_str()),
            _ => None,
        })
    }

    /// Handler named by the first validation failure, if any.
    pub fn handler(&self) -> Option<&str> {
        self.violations().into_iter().find_map(|err| match err {
            Self::InvalidField { handler, .. } => handler.as_deref(),
            _ => None,
        })
    }

    /// Flatten nested failures into a list of leaf errors.
    pub fn violations(&self) -> Vec<&ConfigError> {
        match self {
            Self::Multiple(errors) => errors.iter().flat_map(|err| err.violations()).collect(),
            other => vec![other],
        }
    }

    /// Attach the owning handler name to a field error.
    pub(crate) fn with_handler(self, name: &str) -> Self {
        match self {
            Self::InvalidField {
                path,
                handler: None,
                reason,
                message,
            } => Self::InvalidField {
                path,
                handler: Some(name.to_string()),
                reason,
                message,
            },
            other => other,
        }
    }

    /// Collapse collected errors into one, keeping a single error unwrapped.
    pub(crate) fn collect(mut errors: Vec<ConfigError>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.pop(),
            _ => Some(Self::Multiple(errors)),
        }
    }
}

fn summarize(errors: &[ConfigError]) -> String {
    let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
    format!("{} config errors: {}", errors.len(), details.join("; "))
}
