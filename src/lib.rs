//! Transactional log records and the emitters that deliver their entries.
//!
//! # Examples
//!
//! A record completed outside of any transaction publishes immediately:
//! ```
//! use std::sync::Arc;
//!
//! use entrylog::{emit::aggregate::AggregateEmitter, logger::EmitterLogger, types::Status};
//!
//! let logger = Arc::new(EmitterLogger::new("app"));
//! let sink = logger.add_emitter(AggregateEmitter::new());
//!
//! let mut rec = logger.record("load_config");
//! rec.warn("config file missing, using defaults");
//! rec.success("loaded");
//!
//! assert_eq!(rec.status(), Some(&Status::Success));
//! assert_eq!(sink.lock().unwrap().len(), 2);
//! ```
//!
//! A transaction publishes once, when its scope ends:
//! ```
//! use std::sync::Arc;
//!
//! use entrylog::{emit::aggregate::AggregateEmitter, logger::EmitterLogger, types::Status};
//!
//! let logger = Arc::new(EmitterLogger::new("app"));
//! let sink = logger.add_emitter(AggregateEmitter::new());
//!
//! let mut rec = logger.record("sync_users");
//! let res: Result<u32, std::io::Error> = rec.scope(|rec| {
//!     rec.set("batch", 7).unwrap();
//!     Ok(42)
//! });
//! assert_eq!(res.unwrap(), 42);
//! assert_eq!(rec.status(), Some(&Status::Success));
//! assert_eq!(rec.end_time(), Some(rec.start_time() + rec.duration()));
//! // one begin entry and one end entry
//! assert_eq!(sink.lock().unwrap().len(), 2);
//! ```
//!
//! Writing to a stream:
//! ```no_run
//! use entrylog::{
//!     emit::{Emitter, Entry, config::EmitterConfig, stream::StreamEmitter},
//!     record::Record,
//! };
//!
//! let mut out = StreamEmitter::from_token("stderr", &EmitterConfig::default()).expect("stderr");
//! let rec = Record::new("startup");
//! out.emit_entry(&rec, Entry::Text("service started")).expect("emit");
//! ```
#![deny(missing_docs)]

/// Call-site snapshots.
pub mod callpoint;
/// Emitter trait and the shipped sinks.
pub mod emit;
/// Text codecs and encoding validation.
pub mod encoding;
/// Logger collaborator contract and reference fan-out logger.
pub mod logger;
/// Diagnostic side channel for internal failures.
pub mod note;
/// Records, their lifecycle, and transaction scopes.
pub mod record;
/// Shared primitive types and enums.
pub mod types;
