//! Text codecs and encoding-setting validation.
//!
//! Entries are always UTF-8 `str` in memory; sinks may ask for another byte
//! encoding plus an error-handling mode for characters it cannot represent.

use std::fmt;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default encoding when neither the caller nor the stream declares one.
pub const DEFAULT_ENCODING: &str = "utf-8";
/// Default error-handling mode for stream sinks.
pub const DEFAULT_ERRORS: &str = "backslashreplace";

/// Configuration errors raised before a codec is trusted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    /// Unknown encoding name.
    #[error("unknown encoding: {name} ({reason})")]
    EncodingLookup {
        /// Name as given.
        name: String,
        /// Why the lookup failed.
        reason: String,
    },
    /// Unknown error-handling mode.
    #[error("unknown error handler name {name:?} ({reason})")]
    ErrorBehaviorLookup {
        /// Name as given.
        name: String,
        /// Why the lookup failed.
        reason: String,
    },
}

/// A character could not be represented under `strict` handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{encoding} codec can't encode character {ch:?} in position {position}")]
pub struct EncodeError {
    /// Codec that rejected the character.
    pub encoding: Encoding,
    /// The unencodable character.
    pub ch: char,
    /// Character index within the text.
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum LookupError {
    Unknown(String),
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(name) => write!(f, "no codec registered under {name:?}"),
        }
    }
}

/// Supported byte encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Encoding {
    /// UTF-8.
    Utf8,
    /// 7-bit ASCII.
    Ascii,
    /// ISO-8859-1.
    Latin1,
    /// UTF-16, little endian, no BOM.
    Utf16Le,
    /// UTF-16, big endian, no BOM.
    Utf16Be,
}

impl Encoding {
    /// Resolves a codec name. Case-insensitive; `_` and spaces count as `-`.
    pub fn lookup(name: &str) -> Result<Self, EncodingError> {
        Self::find(name).map_err(|err| EncodingError::EncodingLookup {
            name: name.to_string(),
            reason: err.to_string(),
        })
    }

    fn find(name: &str) -> Result<Self, LookupError> {
        match normalize(name).as_str() {
            "utf-8" | "utf8" | "u8" => Ok(Self::Utf8),
            "ascii" | "us-ascii" | "646" => Ok(Self::Ascii),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" | "l1" => Ok(Self::Latin1),
            "utf-16-le" | "utf-16le" => Ok(Self::Utf16Le),
            "utf-16-be" | "utf-16be" => Ok(Self::Utf16Be),
            _ => Err(LookupError::Unknown(name.to_string())),
        }
    }

    /// Canonical codec name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Ascii => "ascii",
            Self::Latin1 => "latin-1",
            Self::Utf16Le => "utf-16-le",
            Self::Utf16Be => "utf-16-be",
        }
    }

    fn max_char(self) -> u32 {
        match self {
            Self::Ascii => 0x7f,
            Self::Latin1 => 0xff,
            Self::Utf8 | Self::Utf16Le | Self::Utf16Be => char::MAX as u32,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Strategy for characters the target encoding cannot represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorMode {
    /// Fail with [`EncodeError`].
    Strict,
    /// Drop the character.
    Ignore,
    /// Write `?`.
    Replace,
    /// Write a `\xNN`, `\uNNNN` or `\UNNNNNNNN` escape.
    BackslashReplace,
    /// Write an `&#N;` character reference.
    XmlCharRefReplace,
}

impl ErrorMode {
    /// Resolves an error-handler name.
    pub fn lookup(name: &str) -> Result<Self, EncodingError> {
        Self::find(name).map_err(|err| EncodingError::ErrorBehaviorLookup {
            name: name.to_string(),
            reason: err.to_string(),
        })
    }

    fn find(name: &str) -> Result<Self, LookupError> {
        match name {
            "strict" => Ok(Self::Strict),
            "ignore" => Ok(Self::Ignore),
            "replace" => Ok(Self::Replace),
            "backslashreplace" => Ok(Self::BackslashReplace),
            "xmlcharrefreplace" => Ok(Self::XmlCharRefReplace),
            _ => Err(LookupError::Unknown(name.to_string())),
        }
    }

    /// Canonical handler name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Ignore => "ignore",
            Self::Replace => "replace",
            Self::BackslashReplace => "backslashreplace",
            Self::XmlCharRefReplace => "xmlcharrefreplace",
        }
    }
}

impl fmt::Display for ErrorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn normalize(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| match c {
            '_' | ' ' => '-',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// Encodes `text` into bytes under `encoding`, applying `errors` to
/// characters outside the codec's range.
pub fn encode(text: &str, encoding: Encoding, errors: ErrorMode) -> Result<Vec<u8>, EncodeError> {
    match encoding {
        Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
        Encoding::Utf16Le => Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
        Encoding::Utf16Be => Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect()),
        Encoding::Ascii | Encoding::Latin1 => encode_single_byte(text, encoding, errors),
    }
}

fn encode_single_byte(
    text: &str,
    encoding: Encoding,
    errors: ErrorMode,
) -> Result<Vec<u8>, EncodeError> {
    let max = encoding.max_char();
    let mut out = Vec::with_capacity(text.len());
    for (position, ch) in text.chars().enumerate() {
        let code = ch as u32;
        if code <= max {
            out.push(code as u8);
            continue;
        }
        match errors {
            ErrorMode::Strict => {
                return Err(EncodeError {
                    encoding,
                    ch,
                    position,
                });
            }
            ErrorMode::Ignore => {}
            ErrorMode::Replace => out.push(b'?'),
            ErrorMode::BackslashReplace => out.extend_from_slice(backslash_escape(code).as_bytes()),
            ErrorMode::XmlCharRefReplace => out.extend_from_slice(format!("&#{code};").as_bytes()),
        }
    }
    Ok(out)
}

fn backslash_escape(code: u32) -> String {
    let mut s = String::with_capacity(10);
    let _ = match code {
        0..=0xff => write!(s, "\\x{code:02x}"),
        0x100..=0xffff => write!(s, "\\u{code:04x}"),
        _ => write!(s, "\\U{code:08x}"),
    };
    s
}

/// Checks an `(encoding, errors)` pair before it is used for repeated writes.
///
/// The encoding is resolved first, then the error mode, so an unknown
/// encoding is reported even when the error mode is also unknown. Only an
/// unknown name fails; whether a mode would reject a given character is a
/// matter for [`encode`].
pub fn validate_encoding(encoding: &str, errors: &str) -> Result<(Encoding, ErrorMode), EncodingError> {
    let codec = Encoding::lookup(encoding)?;
    let mode = ErrorMode::lookup(errors)?;
    Ok((codec, mode))
}
