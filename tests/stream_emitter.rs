use std::io;
use std::sync::{Arc, Mutex};

use entrylog::{
    emit::{
        EmitError, Emitter, Entry,
        config::{EmitterConfig, LINE_SEP},
        stream::{EntryStream, StreamEmitter, StreamTarget, WriteStream},
    },
    encoding::{Encoding, EncodingError, ErrorMode},
    note::MemoryNotes,
    record::Record,
};

#[derive(Clone, Default)]
struct SharedBuf {
    bytes: Arc<Mutex<Vec<u8>>>,
    flushes: Arc<Mutex<usize>>,
    encoding: Option<String>,
}

impl SharedBuf {
    fn contents(&self) -> Vec<u8> {
        self.bytes.lock().expect("lock").clone()
    }

    fn flushes(&self) -> usize {
        *self.flushes.lock().expect("lock")
    }
}

impl EntryStream for SharedBuf {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.bytes.lock().expect("lock").extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        *self.flushes.lock().expect("lock") += 1;
        Ok(())
    }

    fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }
}

/// `io::Write` over a shared buffer, for the `WriteStream` adapter.
#[derive(Clone, Default)]
struct SharedWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for SharedWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct BrokenStream {
    fail_flush: bool,
}

impl EntryStream for BrokenStream {
    fn write(&mut self, _bytes: &[u8]) -> io::Result<()> {
        if self.fail_flush {
            Ok(())
        } else {
            Err(io::Error::other("disk full"))
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::other("flush refused"))
    }
}

fn emitter(buf: &SharedBuf, cfg: EmitterConfig) -> (StreamEmitter, MemoryNotes) {
    let notes = MemoryNotes::new();
    let emitter = StreamEmitter::new(buf.clone(), &cfg)
        .expect("valid config")
        .with_notes(Arc::new(notes.clone()));
    (emitter, notes)
}

#[test]
fn defaults_resolve_to_utf8_backslashreplace_and_native_sep() {
    let buf = SharedBuf::default();
    let (emitter, _) = emitter(&buf, EmitterConfig::default());
    assert_eq!(emitter.encoding(), Encoding::Utf8);
    assert_eq!(emitter.errors(), ErrorMode::BackslashReplace);
    assert_eq!(emitter.sep(), LINE_SEP);
    assert_eq!(emitter.target(), &StreamTarget::Custom);
}

#[test]
fn text_entry_is_encoded_separated_and_flushed() {
    let buf = SharedBuf::default();
    let (mut emitter, notes) = emitter(&buf, EmitterConfig::default().with_sep("|"));
    let rec = Record::new("write");

    emitter.emit_entry(&rec, Entry::Text("caf\u{e9}")).unwrap();
    emitter.on_end(&rec, Entry::Text("done")).unwrap();

    assert_eq!(buf.contents(), "caf\u{e9}|done|".as_bytes());
    assert_eq!(buf.flushes(), 2);
    assert!(notes.notes().is_empty());
}

#[test]
fn empty_sep_writes_entry_only() {
    let buf = SharedBuf::default();
    let (mut emitter, _) = emitter(&buf, EmitterConfig::default().with_sep(""));
    emitter.emit_entry(&Record::new("w"), Entry::Text("x")).unwrap();
    assert_eq!(buf.contents(), b"x");
}

#[test]
fn stream_declared_encoding_is_used() {
    let buf = SharedBuf {
        encoding: Some("latin-1".into()),
        ..SharedBuf::default()
    };
    let (mut emitter, _) = emitter(&buf, EmitterConfig::default().with_sep(""));
    assert_eq!(emitter.encoding(), Encoding::Latin1);

    emitter
        .emit_entry(&Record::new("w"), Entry::Text("\u{e9}\u{2603}"))
        .unwrap();
    assert_eq!(buf.contents(), b"\xe9\\u2603");
}

#[test]
fn explicit_encoding_beats_stream_encoding() {
    let buf = SharedBuf {
        encoding: Some("latin-1".into()),
        ..SharedBuf::default()
    };
    let (emitter, _) = emitter(&buf, EmitterConfig::default().with_encoding("ascii"));
    assert_eq!(emitter.encoding(), Encoding::Ascii);
}

#[test]
fn raw_bytes_are_rejected_without_writing() {
    let buf = SharedBuf::default();
    let (mut emitter, notes) = emitter(&buf, EmitterConfig::default());

    let err = emitter
        .emit_entry(&Record::new("w"), Entry::Bytes(b"raw"))
        .unwrap_err();

    assert!(matches!(err, EmitError::Decode { len: 3 }));
    assert!(buf.contents().is_empty());
    assert_eq!(buf.flushes(), 0);
    assert_eq!(notes.tags(), ["emit_encode"]);
}

#[test]
fn strict_unencodable_entry_is_rejected() {
    let buf = SharedBuf::default();
    let cfg = EmitterConfig::default()
        .with_encoding("ascii")
        .with_errors("strict");
    let (mut emitter, notes) = emitter(&buf, cfg);

    let err = emitter
        .emit_entry(&Record::new("w"), Entry::Text("na\u{ef}ve"))
        .unwrap_err();
    assert!(matches!(err, EmitError::Encode(_)));
    assert!(buf.contents().is_empty());
    assert_eq!(notes.tags(), ["emit_encode"]);
}

#[test]
fn write_failure_is_noted_and_swallowed() {
    let notes = MemoryNotes::new();
    let mut emitter = StreamEmitter::new(BrokenStream { fail_flush: false }, &EmitterConfig::default())
        .unwrap()
        .with_notes(Arc::new(notes.clone()));

    emitter
        .emit_entry(&Record::new("w"), Entry::Text("lost"))
        .expect("write failures never propagate");

    let recorded = notes.notes();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].tag, "stream_emit");
    assert!(recorded[0].message.contains("disk full"));
}

#[test]
fn flush_failure_is_noted_and_swallowed() {
    let notes = MemoryNotes::new();
    let mut emitter = StreamEmitter::new(BrokenStream { fail_flush: true }, &EmitterConfig::default())
        .unwrap()
        .with_notes(Arc::new(notes.clone()));

    emitter.emit_entry(&Record::new("w"), Entry::Text("x")).unwrap();
    emitter.flush();

    assert_eq!(notes.tags(), ["stream_flush", "stream_flush"]);
}

#[test]
fn stream_without_flush_capability_is_fine() {
    struct WriteOnly(Arc<Mutex<Vec<u8>>>);

    impl EntryStream for WriteOnly {
        fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
            self.0.lock().expect("lock").extend_from_slice(bytes);
            Ok(())
        }
    }

    let out = Arc::new(Mutex::new(Vec::new()));
    let notes = MemoryNotes::new();
    let mut emitter = StreamEmitter::new(WriteOnly(out.clone()), &EmitterConfig::default().with_sep("\n"))
        .unwrap()
        .with_notes(Arc::new(notes.clone()));
    emitter.emit_entry(&Record::new("w"), Entry::Text("a")).unwrap();
    emitter.flush();

    assert_eq!(*out.lock().unwrap(), b"a\n");
    assert!(notes.notes().is_empty());
}

#[test]
fn write_stream_adapts_io_write() {
    let out = SharedWriter::default();
    let mut emitter = StreamEmitter::new(
        WriteStream::new(out.clone()).with_encoding("utf-16-le"),
        &EmitterConfig::default().with_sep(""),
    )
    .unwrap();
    assert_eq!(emitter.encoding(), Encoding::Utf16Le);
    emitter.emit_entry(&Record::new("w"), Entry::Text("hi")).unwrap();

    assert_eq!(*out.0.lock().unwrap(), b"h\0i\0");
}

#[test]
fn shortcut_tokens_resolve_to_std_streams() {
    let cfg = EmitterConfig::default();
    let out = StreamEmitter::from_token("stdout", &cfg).unwrap();
    assert_eq!(out.target(), &StreamTarget::Stdout);
    let err = StreamEmitter::from_token("stderr", &cfg).unwrap();
    assert_eq!(err.target(), &StreamTarget::Stderr);
}

#[test]
fn unknown_token_is_rejected() {
    let err = StreamEmitter::from_token("stdlog", &EmitterConfig::default()).unwrap_err();
    assert!(matches!(err, EmitError::InvalidStream(ref t) if t == "stdlog"));
}

#[test]
fn bad_configuration_fails_construction() {
    let bad_enc = StreamEmitter::new(
        SharedBuf::default(),
        &EmitterConfig::default().with_encoding("ebcdic-martian"),
    )
    .unwrap_err();
    assert!(matches!(
        bad_enc,
        EmitError::Encoding(EncodingError::EncodingLookup { .. })
    ));

    let bad_mode = StreamEmitter::new(
        SharedBuf::default(),
        &EmitterConfig::default().with_errors("whatever"),
    )
    .unwrap_err();
    assert!(matches!(
        bad_mode,
        EmitError::Encoding(EncodingError::ErrorBehaviorLookup { .. })
    ));
}

#[test]
fn config_loads_from_json() {
    let cfg = EmitterConfig::from_json(r#"{"encoding":"ascii","errors":"replace","sep":";"}"#).unwrap();
    let buf = SharedBuf::default();
    let (mut emitter, _) = emitter(&buf, cfg);
    emitter.emit_entry(&Record::new("w"), Entry::Text("\u{e9}")).unwrap();
    assert_eq!(buf.contents(), b"?;");

    assert!(matches!(
        EmitterConfig::from_json("{\"sep\": 3}"),
        Err(EmitError::Config(_))
    ));
}
