//! Diagnostic side channel for internal failures.
//!
//! Emitters report problems they swallow (or are about to surface) here. A
//! note sink must never fail or panic back into the logging path.

use std::fmt;
use std::sync::{Arc, Mutex};

/// Receiver of internal-failure notes.
pub trait NoteSink: Send + Sync {
    /// Records one note under `tag`.
    fn note(&self, tag: &str, args: fmt::Arguments<'_>);
}

/// Forwards notes to `tracing` as warnings on target `entrylog::note`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotes;

impl NoteSink for TracingNotes {
    fn note(&self, tag: &str, args: fmt::Arguments<'_>) {
        tracing::warn!(target: "entrylog::note", tag, "{}", args);
    }
}

/// One collected note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    /// Failure site, e.g. `stream_emit`.
    pub tag: String,
    /// Rendered message.
    pub message: String,
}

/// Keeps every note in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotes {
    notes: Arc<Mutex<Vec<Note>>>,
}

impl MemoryNotes {
    /// Empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// All notes collected so far, oldest first.
    pub fn notes(&self) -> Vec<Note> {
        self.notes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Tags of all notes collected so far.
    pub fn tags(&self) -> Vec<String> {
        self.notes().into_iter().map(|n| n.tag).collect()
    }

    /// Forgets every collected note.
    pub fn clear(&self) {
        self.notes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }
}

impl NoteSink for MemoryNotes {
    fn note(&self, tag: &str, args: fmt::Arguments<'_>) {
        let note = Note {
            tag: tag.to_string(),
            message: args.to_string(),
        };
        self.notes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(note);
    }
}

/// Default note sink shared by emitters.
pub fn default_sink() -> Arc<dyn NoteSink> {
    Arc::new(TracingNotes)
}

/// `note!(sink, "tag", "format {}", args...)`
#[macro_export]
macro_rules! note {
    ($sink:expr, $tag:expr, $($arg:tt)+) => {{
        let sink: &dyn $crate::note::NoteSink = &*$sink;
        $crate::note::NoteSink::note(sink, $tag, format_args!($($arg)+))
    }};
}
