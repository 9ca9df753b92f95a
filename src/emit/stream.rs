use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    encoding::{Encoding, ErrorMode, encode},
    note::{self, NoteSink},
    record::Record,
};

use super::{EmitError, EmitResult, Emitter, Entry, config::EmitterConfig};

/// Byte sink behind a [`StreamEmitter`].
///
/// Only `write` is required. Streams without a flush capability keep the
/// default no-op `flush`.
pub trait EntryStream: Send {
    /// Writes all of `bytes`.
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Flushes buffered bytes.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Encoding the stream itself declares, if any.
    fn encoding(&self) -> Option<&str> {
        None
    }

    /// Releases the underlying handle. Further writes should fail.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Adapts any [`io::Write`] into an [`EntryStream`].
#[derive(Debug)]
pub struct WriteStream<W> {
    inner: W,
    encoding: Option<String>,
}

impl<W: Write + Send> WriteStream<W> {
    /// Wraps `inner` with no declared encoding.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            encoding: None,
        }
    }

    /// Declares the encoding the wrapped writer expects.
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Wrapped writer.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Unwraps the writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write + Send> EntryStream for WriteStream<W> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }
}

/// What a [`StreamEmitter`] writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamTarget {
    /// Process standard output.
    Stdout,
    /// Process standard error.
    Stderr,
    /// A file opened by [`FileEmitter`](super::file::FileEmitter).
    File(PathBuf),
    /// A caller-provided stream.
    Custom,
}

/// Encodes entries and writes them, separator-terminated, to a stream.
pub struct StreamEmitter {
    pub(super) stream: Box<dyn EntryStream>,
    target: StreamTarget,
    encoding: Encoding,
    errors: ErrorMode,
    sep: String,
    sep_bytes: Vec<u8>,
    notes: Arc<dyn NoteSink>,
}

impl StreamEmitter {
    /// Wraps a caller-provided stream.
    ///
    /// Fails if the resolved encoding or error mode is unknown.
    pub fn new(stream: impl EntryStream + 'static, config: &EmitterConfig) -> EmitResult<Self> {
        Self::build(Box::new(stream), StreamTarget::Custom, config)
    }

    /// Resolves the `"stdout"` / `"stderr"` shortcut tokens.
    pub fn from_token(token: &str, config: &EmitterConfig) -> EmitResult<Self> {
        match token {
            "stdout" => Self::stdout(config),
            "stderr" => Self::stderr(config),
            other => Err(EmitError::InvalidStream(other.to_string())),
        }
    }

    /// Emitter over standard output.
    pub fn stdout(config: &EmitterConfig) -> EmitResult<Self> {
        Self::build(
            Box::new(WriteStream::new(io::stdout())),
            StreamTarget::Stdout,
            config,
        )
    }

    /// Emitter over standard error.
    pub fn stderr(config: &EmitterConfig) -> EmitResult<Self> {
        Self::build(
            Box::new(WriteStream::new(io::stderr())),
            StreamTarget::Stderr,
            config,
        )
    }

    pub(super) fn build(
        stream: Box<dyn EntryStream>,
        target: StreamTarget,
        config: &EmitterConfig,
    ) -> EmitResult<Self> {
        let resolved = config.resolve(stream.encoding())?;
        tracing::debug!(
            ?target,
            encoding = %resolved.encoding,
            errors = %resolved.errors,
            "stream emitter ready"
        );
        Ok(Self {
            stream,
            target,
            encoding: resolved.encoding,
            errors: resolved.errors,
            sep: resolved.sep,
            sep_bytes: resolved.sep_bytes,
            notes: note::default_sink(),
        })
    }

    /// Routes internal-failure notes to `notes` instead of `tracing`.
    pub fn with_notes(mut self, notes: Arc<dyn NoteSink>) -> Self {
        self.set_notes(notes);
        self
    }

    /// In-place form of [`StreamEmitter::with_notes`].
    pub fn set_notes(&mut self, notes: Arc<dyn NoteSink>) {
        self.notes = notes;
    }

    /// What this emitter writes to.
    pub fn target(&self) -> &StreamTarget {
        &self.target
    }

    /// Resolved byte encoding.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Resolved error-handling mode.
    pub fn errors(&self) -> ErrorMode {
        self.errors
    }

    /// Separator written after each entry.
    pub fn sep(&self) -> &str {
        &self.sep
    }

    pub(super) fn notes(&self) -> &dyn NoteSink {
        self.notes.as_ref()
    }

    /// Flushes the stream; failures are noted, never returned.
    pub fn flush(&mut self) {
        if let Err(err) = self.stream.flush() {
            crate::note!(self.notes, "stream_flush", "got {err} on {:?}.flush()", self);
        }
    }

    fn write_encoded(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.stream.write(bytes)?;
        if !self.sep_bytes.is_empty() {
            self.stream.write(&self.sep_bytes)?;
        }
        self.flush();
        Ok(())
    }
}

impl Emitter for StreamEmitter {
    fn emit_entry(&mut self, _record: &Record, entry: Entry<'_>) -> EmitResult<()> {
        let text = match entry {
            Entry::Text(text) => text,
            Entry::Bytes(bytes) => {
                crate::note!(
                    self.notes,
                    "emit_encode",
                    "got decode error on {:?}.emit_entry(); expected decoded text, not {bytes:?}",
                    self
                );
                return Err(EmitError::Decode { len: bytes.len() });
            }
        };

        let encoded = match encode(text, self.encoding, self.errors) {
            Ok(encoded) => encoded,
            Err(err) => {
                crate::note!(self.notes, "emit_encode", "got {err} on {:?}.emit_entry()", self);
                return Err(err.into());
            }
        };

        if let Err(err) = self.write_encoded(&encoded) {
            crate::note!(self.notes, "stream_emit", "got {err} on {:?}.emit_entry()", self);
        }
        Ok(())
    }
}

impl fmt::Debug for StreamEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<StreamEmitter stream={:?}>", self.target)
    }
}
