//! Emitters: sinks that persist finished entries.
//!
//! An entry is the final text of one record event. Every emitter accepts
//! entries through four named hooks (`on_begin`, `on_warn`, `on_end`,
//! `on_comment`); the shipped emitters route all of them to
//! [`Emitter::emit_entry`].

/// In-memory emitter for tests and introspection.
pub mod aggregate;
/// Encoding / separator configuration shared by stream-like emitters.
pub mod config;
/// Append-mode file emitter.
pub mod file;
/// SQLite entry journal emitter.
pub mod sqlite;
/// Emitter over any writable byte stream.
pub mod stream;

use std::borrow::Cow;
use std::io;

use thiserror::Error;

use crate::{
    encoding::{EncodeError, EncodingError},
    record::Record,
};

/// Entry as handed to an emitter.
///
/// `Bytes` is undecoded input; stream-like emitters reject it because it
/// means something upstream skipped decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entry<'a> {
    /// Decoded text.
    Text(&'a str),
    /// Undecoded bytes.
    Bytes(&'a [u8]),
}

impl Entry<'_> {
    /// Text form, replacing invalid UTF-8 in byte entries.
    pub fn to_text_lossy(&self) -> Cow<'_, str> {
        match self {
            Self::Text(s) => Cow::Borrowed(s),
            Self::Bytes(b) => String::from_utf8_lossy(b),
        }
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        match self {
            Self::Text(s) => s.len(),
            Self::Bytes(b) => b.len(),
        }
    }

    /// True for a zero-length entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<'a> From<&'a str> for Entry<'a> {
    fn from(value: &'a str) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<&'a String> for Entry<'a> {
    fn from(value: &'a String) -> Self {
        Self::Text(value)
    }
}

impl<'a> From<&'a [u8]> for Entry<'a> {
    fn from(value: &'a [u8]) -> Self {
        Self::Bytes(value)
    }
}

/// Errors surfaced by emitters.
#[derive(Debug, Error)]
pub enum EmitError {
    /// Encoding settings failed validation.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    /// Stream shortcut token was not recognized.
    #[error("expected a writable stream (or shortcut values \"stderr\" or \"stdout\"), not {0:?}")]
    InvalidStream(String),
    /// Raw bytes reached an emitter that expects decoded text.
    #[error("expected decoded text, not {len} raw bytes")]
    Decode {
        /// Byte length of the rejected entry.
        len: usize,
    },
    /// Strict encoding met an unencodable character.
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// Opening the sink failed.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// Opening or reading the SQLite journal failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Emitter configuration could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result alias for emitter operations.
pub type EmitResult<T> = Result<T, EmitError>;

/// A sink for record entries.
///
/// Only construction-time misconfiguration and upstream misuse (undecoded
/// input) surface as errors; transient sink failures are reported to the
/// note channel and swallowed by implementations.
pub trait Emitter: Send {
    /// Persists one entry of `record`.
    fn emit_entry(&mut self, record: &Record, entry: Entry<'_>) -> EmitResult<()>;

    /// A transaction began.
    fn on_begin(&mut self, record: &Record, entry: Entry<'_>) -> EmitResult<()> {
        self.emit_entry(record, entry)
    }

    /// A warning is being published.
    fn on_warn(&mut self, record: &Record, entry: Entry<'_>) -> EmitResult<()> {
        self.emit_entry(record, entry)
    }

    /// A record completed.
    fn on_end(&mut self, record: &Record, entry: Entry<'_>) -> EmitResult<()> {
        self.emit_entry(record, entry)
    }

    /// A free-form comment.
    fn on_comment(&mut self, record: &Record, entry: Entry<'_>) -> EmitResult<()> {
        self.emit_entry(record, entry)
    }
}
