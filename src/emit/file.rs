use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{note::NoteSink, record::Record};

use super::{
    EmitResult, Emitter, Entry,
    config::EmitterConfig,
    stream::{EntryStream, StreamEmitter, StreamTarget},
};

struct FileStream {
    file: Option<BufWriter<File>>,
}

impl EntryStream for FileStream {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        match &mut self.file {
            Some(file) => file.write_all(bytes),
            None => Err(io::Error::other("write to closed file")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.file {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }

    /// Takes the handle before flushing, so a failed flush still closes.
    fn close(&mut self) -> io::Result<()> {
        match self.file.take() {
            Some(mut file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// [`StreamEmitter`] over a file it opens in append mode.
///
/// Existing content is never truncated. The file is closed on drop.
pub struct FileEmitter {
    path: PathBuf,
    inner: StreamEmitter,
    closed: bool,
}

impl FileEmitter {
    /// Opens (creating if needed) `path`, made absolute first, for appending.
    pub fn open(path: impl AsRef<Path>, config: &EmitterConfig) -> EmitResult<Self> {
        let path = std::path::absolute(path.as_ref())?;
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let stream = FileStream {
            file: Some(BufWriter::new(file)),
        };
        let inner = StreamEmitter::build(
            Box::new(stream),
            StreamTarget::File(path.clone()),
            config,
        )?;
        tracing::debug!(path = %path.display(), "opened file emitter");
        Ok(Self {
            path,
            inner,
            closed: false,
        })
    }

    /// Routes internal-failure notes to `notes` instead of `tracing`.
    pub fn with_notes(mut self, notes: Arc<dyn NoteSink>) -> Self {
        self.inner.set_notes(notes);
        self
    }

    /// Absolute path of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Underlying stream emitter.
    pub fn stream_emitter(&self) -> &StreamEmitter {
        &self.inner
    }

    /// True once [`FileEmitter::close`] has run.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Flushes buffered bytes; failures are noted.
    pub fn flush(&mut self) {
        self.inner.flush();
    }

    /// Flushes and closes the file. Failures are noted, never returned; the
    /// handle is released either way. Calling it again is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        match self.inner.stream.close() {
            Ok(()) => tracing::debug!(path = %self.path.display(), "closed file emitter"),
            Err(err) => {
                crate::note!(self.inner.notes(), "file_close", "got {err} on {:?}.close()", self.inner);
            }
        }
    }
}

impl Emitter for FileEmitter {
    fn emit_entry(&mut self, record: &Record, entry: Entry<'_>) -> EmitResult<()> {
        self.inner.emit_entry(record, entry)
    }
}

impl Drop for FileEmitter {
    fn drop(&mut self) {
        self.close();
    }
}
