//! Logger collaborator contract and a fan-out reference logger.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    emit::{EmitResult, Emitter, Entry},
    record::{Message, Record},
};

/// Owner of records; receives them when they start and when they finish.
///
/// Implementations must not panic back into the record: delivery problems
/// are theirs to handle.
pub trait Logger: Send + Sync {
    /// A record was entered as a transaction.
    fn enqueue_start(&self, record: &Record);
    /// A record completed (or a transaction scope ended).
    fn enqueue(&self, record: &Record);
}

/// Entry rendering used by [`EmitterLogger`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryFormat {
    /// `"<status> <name> (<secs>s): <message>"`
    #[default]
    Plain,
    /// One JSON object per entry.
    Json,
}

/// Which hook an entry is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// [`Emitter::on_begin`].
    Begin,
    /// [`Emitter::on_warn`].
    Warn,
    /// [`Emitter::on_end`].
    End,
    /// [`Emitter::on_comment`].
    Comment,
}

impl Phase {
    fn as_str(self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Warn => "warn",
            Self::End => "end",
            Self::Comment => "comment",
        }
    }
}

type SharedEmitter = Arc<Mutex<dyn Emitter>>;

/// Renders records and delivers them to every registered emitter.
///
/// Each emitter sits behind its own lock, so one encode + write + flush
/// runs as a single critical section even when the logger is shared across
/// threads. Emitter errors are logged and dropped.
pub struct EmitterLogger {
    name: String,
    format: EntryFormat,
    emitters: Mutex<Vec<SharedEmitter>>,
}

impl EmitterLogger {
    /// Logger with no emitters and plain entries.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            format: EntryFormat::default(),
            emitters: Mutex::new(Vec::new()),
        }
    }

    /// Selects the entry rendering.
    pub fn with_format(mut self, format: EntryFormat) -> Self {
        self.format = format;
        self
    }

    /// Logger name, included in JSON entries.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers an emitter; the returned handle keeps access to it.
    pub fn add_emitter<E: Emitter + 'static>(&self, emitter: E) -> Arc<Mutex<E>> {
        let shared = Arc::new(Mutex::new(emitter));
        lock(&self.emitters).push(shared.clone());
        shared
    }

    /// Number of registered emitters.
    pub fn emitter_count(&self) -> usize {
        lock(&self.emitters).len()
    }

    /// New record owned by this logger.
    #[track_caller]
    pub fn record(self: &Arc<Self>, name: impl Into<String>) -> Record {
        Record::new(name).with_logger(self.clone())
    }

    /// Sends a free-form comment through `on_comment`.
    #[track_caller]
    pub fn comment(&self, message: impl Into<Message>) {
        let record = Record::new("comment").with_message(message);
        let entry = self.render(&record, Phase::Comment, record.message().unwrap_or_default());
        self.dispatch(&record, Phase::Comment, &entry);
    }

    /// Renders one entry for `record`. `detail` is the warning text for
    /// [`Phase::Warn`] and the message otherwise.
    pub fn render(&self, record: &Record, phase: Phase, detail: &str) -> String {
        match self.format {
            EntryFormat::Plain => match phase {
                Phase::Begin => format!("begin {}", record.name()),
                Phase::Warn => format!("warn {}: {}", record.name(), detail),
                Phase::Comment => format!("comment: {detail}"),
                Phase::End => format!(
                    "{} {} ({:.6}s): {}",
                    record.status().map(|s| s.as_str()).unwrap_or("unset"),
                    record.name(),
                    record.duration().as_secs_f64(),
                    detail
                ),
            },
            EntryFormat::Json => {
                let mut value = record.to_json();
                if let Some(obj) = value.as_object_mut() {
                    obj.insert("logger".into(), json!(self.name));
                    obj.insert("event".into(), json!(phase.as_str()));
                    if phase == Phase::Warn {
                        obj.insert("warning".into(), json!(detail));
                    }
                }
                value.to_string()
            }
        }
    }

    fn dispatch(&self, record: &Record, phase: Phase, entry: &str) {
        let emitters = lock(&self.emitters).clone();
        for emitter in emitters {
            let mut emitter = lock(&emitter);
            let result: EmitResult<()> = match phase {
                Phase::Begin => emitter.on_begin(record, Entry::Text(entry)),
                Phase::Warn => emitter.on_warn(record, Entry::Text(entry)),
                Phase::End => emitter.on_end(record, Entry::Text(entry)),
                Phase::Comment => emitter.on_comment(record, Entry::Text(entry)),
            };
            if let Err(err) = result {
                tracing::warn!(logger = %self.name, record = %record.name(), %err, "emitter rejected entry");
            }
        }
    }
}

impl Logger for EmitterLogger {
    fn enqueue_start(&self, record: &Record) {
        let entry = self.render(record, Phase::Begin, record.message().unwrap_or_default());
        self.dispatch(record, Phase::Begin, &entry);
    }

    fn enqueue(&self, record: &Record) {
        for warning in record.warnings() {
            let entry = self.render(record, Phase::Warn, warning);
            self.dispatch(record, Phase::Warn, &entry);
        }
        let entry = self.render(record, Phase::End, record.message().unwrap_or_default());
        self.dispatch(record, Phase::End, &entry);
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
