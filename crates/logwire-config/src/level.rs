//! Severity scale shared by every handler.

use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Numeric log severity.
///
/// Named levels follow the usual eight-step scale; any other code is kept
/// verbatim so custom levels such as `150` survive normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Level(u32);

impl Level {
    pub const DEBUG: Level = Level(100);
    pub const INFO: Level = Level(200);
    pub const NOTICE: Level = Level(250);
    pub const WARNING: Level = Level(300);
    pub const ERROR: Level = Level(400);
    pub const CRITICAL: Level = Level(500);
    pub const ALERT: Level = Level(550);
    pub const EMERGENCY: Level = Level(600);

    /// Wrap a raw numeric code.
    pub const fn from_code(code: u32) -> Self {
        Level(code)
    }

    /// Numeric code of the level.
    pub const fn code(self) -> u32 {
        self.0
    }

    /// Canonical upper-case name when the code is on the named scale.
    pub fn name(self) -> Option<&'static str> {
        SEVERITY_SCALE
            .iter()
            .find(|(_, level)| *level == self)
            .map(|(name, _)| *name)
    }
}

/// Named severities in ascending order.
static SEVERITY_SCALE: [(&str, Level); 8] = [
    ("DEBUG", Level::DEBUG),
    ("INFO", Level::INFO),
    ("NOTICE", Level::NOTICE),
    ("WARNING", Level::WARNING),
    ("ERROR", Level::ERROR),
    ("CRITICAL", Level::CRITICAL),
    ("ALERT", Level::ALERT),
    ("EMERGENCY", Level::EMERGENCY),
];

/// A level name that is neither on the scale nor numeric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLevel(pub String);

impl fmt::Display for UnknownLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown level \"{}\"", self.0)
    }
}

impl std::error::Error for UnknownLevel {}

impl FromStr for Level {
    type Err = UnknownLevel;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        if let Ok(code) = trimmed.parse::<u32>() {
            return Ok(Level(code));
        }
        SEVERITY_SCALE
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(trimmed))
            .map(|(_, level)| *level)
            .ok_or_else(|| UnknownLevel(raw.to_string()))
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}
