use crate::record::Record;

use super::{EmitResult, Emitter, Entry};

/// Keeps every `(record, entry)` pair in memory, in arrival order.
///
/// Unbounded; call [`AggregateEmitter::clear`] to reset. Byte entries are
/// stored lossily decoded, so emitting never fails.
#[derive(Debug, Default, Clone)]
pub struct AggregateEmitter {
    items: Vec<(Record, String)>,
}

impl AggregateEmitter {
    /// Empty aggregate.
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries, oldest first.
    pub fn get_entries(&self) -> Vec<&str> {
        self.items.iter().map(|(_, entry)| entry.as_str()).collect()
    }

    /// Entry at `idx`, if that many were emitted.
    pub fn get_entry(&self, idx: usize) -> Option<&str> {
        self.items.get(idx).map(|(_, entry)| entry.as_str())
    }

    /// Record snapshots, parallel to [`Self::get_entries`].
    pub fn get_records(&self) -> Vec<&Record> {
        self.items.iter().map(|(record, _)| record).collect()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drops every stored pair.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl Emitter for AggregateEmitter {
    fn emit_entry(&mut self, record: &Record, entry: Entry<'_>) -> EmitResult<()> {
        self.items
            .push((record.clone(), entry.to_text_lossy().into_owned()));
        Ok(())
    }
}
