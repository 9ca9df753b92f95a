//! Transaction scoping.
//!
//! Entering a record as a transaction defers its publish until the scope
//! ends. The exit logic runs on every path out of the scope: explicit
//! finish, explicit failure, early return, `?`, or panic unwinding.

use std::any::type_name;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::thread;

use crate::types::Status;

use super::{ExceptionInfo, Message, Record};

/// Guard for a record entered as a transaction. Dropping it exits the scope.
#[must_use = "dropping the transaction immediately ends it"]
pub struct Transaction<'r> {
    record: &'r mut Record,
    failure: Option<ExceptionInfo>,
}

impl Record {
    /// Enters the record as a transaction and notifies the logger that it
    /// has begun.
    pub fn begin(&mut self) -> Transaction<'_> {
        self.is_transaction = Some(true);
        self.defer_publish = true;
        if let Some(logger) = &self.logger {
            tracing::trace!(record = %self.name, "enqueue started transaction");
            logger.enqueue_start(self);
        }
        Transaction {
            record: self,
            failure: None,
        }
    }

    /// Runs `f` inside a transaction. An `Err` from `f` completes the
    /// record as an exception and is passed back unchanged.
    pub fn scope<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        E: fmt::Display,
        F: FnOnce(&mut Record) -> Result<T, E>,
    {
        let mut txn = self.begin();
        match f(&mut txn) {
            Ok(value) => {
                txn.finish();
                Ok(value)
            }
            Err(err) => {
                txn.fail(ExceptionInfo::new(type_name::<E>(), err.to_string()));
                Err(err)
            }
        }
    }
}

impl Transaction<'_> {
    /// Ends the scope normally.
    pub fn finish(self) {}

    /// Ends the scope as if an error had been raised inside it.
    pub fn fail(mut self, info: ExceptionInfo) {
        self.failure = Some(info);
    }

    fn exit(&mut self) {
        let record = &mut *self.record;
        record.defer_publish = false;

        if let Some(info) = self.failure.take() {
            record.exception(info);
        } else if thread::panicking() {
            record.exception(ExceptionInfo::panic());
        } else {
            let status = record.status.clone().unwrap_or(Status::Success);
            let message = record.message.take().map(Message::Text);
            record.complete(status, message);
        }
    }
}

impl Deref for Transaction<'_> {
    type Target = Record;

    fn deref(&self) -> &Record {
        self.record
    }
}

impl DerefMut for Transaction<'_> {
    fn deref_mut(&mut self) -> &mut Record {
        self.record
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        self.exit();
    }
}
