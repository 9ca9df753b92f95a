use serde::{Deserialize, Serialize};

use crate::encoding::{
    DEFAULT_ENCODING, DEFAULT_ERRORS, Encoding, ErrorMode, encode, validate_encoding,
};

use super::EmitResult;

/// Native line terminator, appended after each entry by default.
#[cfg(windows)]
pub const LINE_SEP: &str = "\r\n";
/// Native line terminator, appended after each entry by default.
#[cfg(not(windows))]
pub const LINE_SEP: &str = "\n";

/// Settings for stream-like emitters. Every field is optional.
///
/// ```
/// use entrylog::emit::config::EmitterConfig;
///
/// let cfg = EmitterConfig::from_json(r#"{"encoding": "latin-1", "sep": ""}"#).unwrap();
/// assert_eq!(cfg.encoding.as_deref(), Some("latin-1"));
/// assert_eq!(cfg.errors, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Byte encoding; falls back to the stream's own, then `utf-8`.
    pub encoding: Option<String>,
    /// Error-handling mode; falls back to `backslashreplace`.
    pub errors: Option<String>,
    /// Written after every entry; an empty string disables it. Falls back to
    /// [`LINE_SEP`].
    pub sep: Option<String>,
}

impl EmitterConfig {
    /// Parses a JSON object; missing keys keep their fallbacks.
    pub fn from_json(json: &str) -> EmitResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Sets the byte encoding.
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Sets the error-handling mode.
    pub fn with_errors(mut self, errors: impl Into<String>) -> Self {
        self.errors = Some(errors.into());
        self
    }

    /// Sets the separator written after every entry.
    pub fn with_sep(mut self, sep: impl Into<String>) -> Self {
        self.sep = Some(sep.into());
        self
    }

    /// Applies fallbacks and validates the encoding pair.
    pub(crate) fn resolve(&self, declared_encoding: Option<&str>) -> EmitResult<Resolved> {
        let encoding = self
            .encoding
            .as_deref()
            .or(declared_encoding.filter(|e| !e.is_empty()))
            .unwrap_or(DEFAULT_ENCODING);
        let errors = self.errors.as_deref().unwrap_or(DEFAULT_ERRORS);
        let (encoding, errors) = validate_encoding(encoding, errors)?;

        let sep = self.sep.clone().unwrap_or_else(|| LINE_SEP.to_string());
        let sep_bytes = encode(&sep, encoding, errors)?;

        Ok(Resolved {
            encoding,
            errors,
            sep,
            sep_bytes,
        })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct Resolved {
    pub(crate) encoding: Encoding,
    pub(crate) errors: ErrorMode,
    pub(crate) sep: String,
    pub(crate) sep_bytes: Vec<u8>,
}
