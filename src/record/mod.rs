//! The record: one logged unit of work and its completion lifecycle.
//!
//! A record starts open, may collect warnings, and is completed by exactly one
//! of [`Record::success`], [`Record::failure`] or [`Record::exception`]. On
//! completion it hands itself to its logger, unless it is inside a
//! transaction scope, in which case the hand-off waits for scope exit.

/// Two-tier field access and JSON projection.
pub mod fields;
/// Scoped transactions with guaranteed exit handling.
pub mod scope;

use std::any::type_name;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use hashbrown::HashMap;

use crate::{
    callpoint::{CallContext, Callpoint},
    logger::Logger,
    types::{Level, Status, Value},
};

/// Completion message as handed in by the caller.
///
/// Byte messages are decoded as UTF-8 when the record is completed; invalid
/// sequences are replaced rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Already-decoded text.
    Text(String),
    /// Bytes, decoded as UTF-8 on completion.
    Bytes(Vec<u8>),
}

impl Message {
    /// Decoded text form.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Bytes(b) => match String::from_utf8(b) {
                Ok(s) => s,
                Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
            },
        }
    }
}

impl From<&str> for Message {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Message {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&String> for Message {
    fn from(value: &String) -> Self {
        Self::Text(value.clone())
    }
}

impl From<Vec<u8>> for Message {
    fn from(value: Vec<u8>) -> Self {
        Self::Bytes(value)
    }
}

impl From<&[u8]> for Message {
    fn from(value: &[u8]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Message {
    fn from(value: &[u8; N]) -> Self {
        Self::Bytes(value.to_vec())
    }
}

/// Identity, value, and optional trace of the error that ended a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionInfo {
    /// Error type name.
    pub kind: String,
    /// Rendered error value.
    pub value: String,
    /// Backtrace or cause chain, if known.
    pub trace: Option<String>,
}

impl ExceptionInfo {
    /// Info without a trace.
    pub fn new(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            value: value.into(),
            trace: None,
        }
    }

    /// Attaches a trace.
    pub fn with_trace(mut self, trace: impl Into<String>) -> Self {
        self.trace = Some(trace.into());
        self
    }

    /// Captures an error's type name and message; the `source()` chain, if
    /// any, becomes the trace.
    pub fn from_error<E: Error + ?Sized>(err: &E) -> Self {
        let mut info = Self::new(type_name::<E>(), err.to_string());
        let mut chain = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            chain.push(format!("caused by: {cause}"));
            source = cause.source();
        }
        if !chain.is_empty() {
            info.trace = Some(chain.join("\n"));
        }
        info
    }

    pub(crate) fn panic() -> Self {
        Self::new("panic", "panicked inside transaction scope")
    }

    /// Diagnostic message stored on the record.
    pub fn message(&self) -> String {
        format!("{}, {:?}", self.kind, self.value)
    }
}

/// One logged unit of work.
#[derive(Clone)]
pub struct Record {
    name: String,
    level: Option<Level>,
    logger: Option<Arc<dyn Logger>>,
    status: Option<Status>,
    message: Option<String>,
    raw_message: Option<String>,
    extras: HashMap<String, Value>,
    start_time: SystemTime,
    end_time: Option<SystemTime>,
    duration: Duration,
    warnings: Vec<String>,
    callpoint: Callpoint,
    exc_info: Option<ExceptionInfo>,
    is_transaction: Option<bool>,
    defer_publish: bool,
}

impl Record {
    /// Creates an open record, stamping the start time and capturing the
    /// caller's location.
    #[track_caller]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            level: None,
            logger: None,
            status: None,
            message: None,
            raw_message: None,
            extras: HashMap::new(),
            start_time: SystemTime::now(),
            end_time: None,
            duration: Duration::ZERO,
            warnings: Vec::new(),
            callpoint: Callpoint::caller(),
            exc_info: None,
            is_transaction: None,
            defer_publish: false,
        }
    }

    /// Sets the severity.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    /// Attaches the logger the record publishes to.
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Presets a status without completing.
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    /// Presets the message without completing.
    pub fn with_message(mut self, message: impl Into<Message>) -> Self {
        self.message = Some(message.into().into_text());
        self
    }

    /// Keeps the unformatted message template.
    pub fn with_raw_message(mut self, raw_message: impl Into<String>) -> Self {
        self.raw_message = Some(raw_message.into());
        self
    }

    /// Replaces the extras mapping wholesale.
    pub fn with_extras(mut self, extras: HashMap<String, Value>) -> Self {
        self.extras = extras;
        self
    }

    /// Adds one open-ended attribute.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extras.insert(key.into(), value.into());
        self
    }

    /// Overrides the start time, e.g. for work that began before the
    /// record was created.
    pub fn with_start_time(mut self, start_time: SystemTime) -> Self {
        self.start_time = start_time;
        self
    }

    /// Replaces the captured callpoint.
    pub fn with_callpoint(mut self, callpoint: Callpoint) -> Self {
        self.callpoint = callpoint;
        self
    }

    /// Uses an explicit execution context instead of the caller's location.
    pub fn with_context(mut self, context: &CallContext<'_>) -> Self {
        self.callpoint = Callpoint::from_context(Some(context));
        self
    }

    /// Record name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Severity, if set.
    pub fn level(&self) -> Option<Level> {
        self.level
    }

    /// Attached logger, if any.
    pub fn logger(&self) -> Option<&Arc<dyn Logger>> {
        self.logger.as_ref()
    }

    /// Status; `None` while open.
    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    /// Current message.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Unformatted message template.
    pub fn raw_message(&self) -> Option<&str> {
        self.raw_message.as_deref()
    }

    /// Open-ended attributes.
    pub fn extras(&self) -> &HashMap<String, Value> {
        &self.extras
    }

    /// When the record was created.
    pub fn start_time(&self) -> SystemTime {
        self.start_time
    }

    /// Set only when a transaction completes.
    pub fn end_time(&self) -> Option<SystemTime> {
        self.end_time
    }

    /// Zero until a transaction completes.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Warnings in the order they were added.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Where the record was created.
    pub fn callpoint(&self) -> &Callpoint {
        &self.callpoint
    }

    /// Error that ended the record, if it ended as an exception.
    pub fn exc_info(&self) -> Option<&ExceptionInfo> {
        self.exc_info.as_ref()
    }

    /// `Some(true)` once the record has been entered as a transaction.
    pub fn is_transaction(&self) -> Option<bool> {
        self.is_transaction
    }

    /// True once success, failure or exception was recorded.
    pub fn is_complete(&self) -> bool {
        matches!(
            self.status,
            Some(Status::Success | Status::Failure | Status::Exception)
        )
    }

    /// Time since the record started. Does not modify the record.
    pub fn elapsed(&self) -> Duration {
        SystemTime::now()
            .duration_since(self.start_time)
            .unwrap_or(Duration::ZERO)
    }

    /// Appends a warning. Status is unchanged and nothing is published.
    pub fn warn(&mut self, message: impl Into<String>) -> &mut Self {
        self.warnings.push(message.into());
        self
    }

    /// Completes with status `success`.
    pub fn success(&mut self, message: impl Into<Message>) -> &mut Self {
        self.complete(Status::Success, Some(message.into()))
    }

    /// Completes with status `failure`.
    pub fn failure(&mut self, message: impl Into<Message>) -> &mut Self {
        self.complete(Status::Failure, Some(message.into()))
    }

    /// Completes the record with status `exception` and a message built
    /// from the error's identity and value.
    pub fn exception(&mut self, info: ExceptionInfo) -> &mut Self {
        let message = info.message();
        self.exc_info = Some(info);
        self.complete(Status::Exception, Some(Message::Text(message)))
    }

    /// Shared completion routine.
    ///
    /// Calling it on an already completed record runs it again: status,
    /// message and (for transactions) timestamps are overwritten and the
    /// record is published a second time.
    pub fn complete(&mut self, status: Status, message: Option<Message>) -> &mut Self {
        if self.is_transaction == Some(true) {
            let end = SystemTime::now();
            self.duration = end.duration_since(self.start_time).unwrap_or(Duration::ZERO);
            self.end_time = Some(self.start_time + self.duration);
        }

        self.status = Some(status);
        self.message = message.map(Message::into_text);
        self.publish();
        self
    }

    fn publish(&self) {
        if self.defer_publish {
            return;
        }
        if let Some(logger) = &self.logger {
            tracing::trace!(record = %self.name, "enqueue completed record");
            logger.enqueue(self);
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("name", &self.name)
            .field("level", &self.level)
            .field("has_logger", &self.logger.is_some())
            .field("status", &self.status)
            .field("message", &self.message)
            .field("raw_message", &self.raw_message)
            .field("extras", &self.extras)
            .field("start_time", &self.start_time)
            .field("end_time", &self.end_time)
            .field("duration", &self.duration)
            .field("warnings", &self.warnings)
            .field("callpoint", &self.callpoint)
            .field("exc_info", &self.exc_info)
            .field("is_transaction", &self.is_transaction)
            .finish()
    }
}

/// Creates a [`Record`] whose callpoint carries the enclosing module and
/// function name.
///
/// ```
/// let rec = entrylog::record!("load_config");
/// assert_eq!(rec.callpoint().module_name(), module_path!());
/// ```
#[macro_export]
macro_rules! record {
    ($name:expr) => {
        $crate::record::Record::new($name).with_callpoint($crate::callpoint!())
    };
}
