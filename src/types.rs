//! Shared primitive types: severity levels, completion statuses, values.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Arbitrary attribute value stored in record extras.
pub type Value = serde_json::Value;

/// Caller-defined severity ordinal. Higher is more severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Level(pub u8);

impl Level {
    /// Verbose diagnostic detail.
    pub const DEBUG: Level = Level(10);
    /// Routine operational events.
    pub const INFO: Level = Level(20);
    /// Failures that need attention.
    pub const CRITICAL: Level = Level(50);

    /// Well-known name for the built-in levels, if any.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Self::DEBUG => Some("debug"),
            Self::INFO => Some("info"),
            Self::CRITICAL => Some("critical"),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "level{}", self.0),
        }
    }
}

/// Completion status of a record. An unset status is `None` on the record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// The unit of work completed as intended.
    Success,
    /// The unit of work completed but did not achieve its goal.
    Failure,
    /// The unit of work was aborted by an error.
    Exception,
    /// Caller-supplied status string.
    Custom(String),
}

impl Status {
    /// Parses a status name; anything unrecognized becomes [`Status::Custom`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "success" => Self::Success,
            "failure" => Self::Failure,
            "exception" => Self::Exception,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Lowercase status name.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Exception => "exception",
            Self::Custom(s) => s,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
