//! SQLite-backed append-only entry journal.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, params};

use crate::{
    note::{self, NoteSink},
    record::Record,
    types::Status,
};

use super::{EmitError, EmitResult, Emitter, Entry};

/// One persisted entry row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    /// Append order.
    pub seq: u64,
    /// Insert time, milliseconds since the Unix epoch.
    pub ts_ms: u64,
    /// Name of the record the entry belongs to.
    pub record_name: String,
    /// Record status at emit time, if set.
    pub status: Option<String>,
    /// Entry text.
    pub entry: String,
}

/// Appends each entry as a row of the `entries` table.
///
/// Insert failures are transient sink failures: noted and swallowed.
pub struct SqliteEmitter {
    conn: Connection,
    notes: Arc<dyn NoteSink>,
}

impl SqliteEmitter {
    /// Opens or creates a SQLite journal at `path`.
    pub fn open(path: impl AsRef<Path>) -> EmitResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Journal in a private in-memory database.
    pub fn open_in_memory() -> EmitResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> EmitResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self {
            conn,
            notes: note::default_sink(),
        })
    }

    /// Routes internal-failure notes to `notes` instead of `tracing`.
    pub fn with_notes(mut self, notes: Arc<dyn NoteSink>) -> Self {
        self.notes = notes;
        self
    }

    /// All stored entries in append order.
    pub fn entries(&self) -> EmitResult<Vec<StoredEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT seq, ts_ms, record_name, status, entry FROM entries ORDER BY seq ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            let seq: i64 = row.get(0)?;
            let ts_ms: i64 = row.get(1)?;
            Ok(StoredEntry {
                seq: seq as u64,
                ts_ms: ts_ms as u64,
                record_name: row.get(2)?,
                status: row.get(3)?,
                entry: row.get(4)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn insert(&self, record: &Record, entry: &str) -> rusqlite::Result<usize> {
        self.conn.execute(
            "INSERT INTO entries(ts_ms, record_name, status, entry) VALUES (?1, ?2, ?3, ?4)",
            params![
                now_ms() as i64,
                record.name(),
                record.status().map(Status::as_str),
                entry,
            ],
        )
    }
}

impl Emitter for SqliteEmitter {
    fn emit_entry(&mut self, record: &Record, entry: Entry<'_>) -> EmitResult<()> {
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

        if let Err(err) = self.insert(record, text) {
            crate::note!(self.notes, "sqlite_emit", "got {err} on {:?}.emit_entry()", self);
        }
        Ok(())
    }
}

impl fmt::Debug for SqliteEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<SqliteEmitter path={:?}>", self.conn.path())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
