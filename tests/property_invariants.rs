use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use entrylog::{
    emit::{Emitter, Entry, aggregate::AggregateEmitter},
    encoding::{Encoding, ErrorMode, encode},
    logger::Logger,
    record::{ExceptionInfo, Record},
    types::Status,
};

#[derive(Debug, Clone)]
enum Step {
    Warn,
    Success,
    Failure,
    SetMessage,
}

#[derive(Debug, Clone, Copy)]
enum Exit {
    Normal,
    Fail,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::Warn),
        Just(Step::Success),
        Just(Step::Failure),
        Just(Step::SetMessage),
    ]
}

#[derive(Default)]
struct CountingLogger {
    starts: Mutex<usize>,
    publishes: Mutex<usize>,
}

impl Logger for CountingLogger {
    fn enqueue_start(&self, _record: &Record) {
        *self.starts.lock().expect("lock") += 1;
    }

    fn enqueue(&self, _record: &Record) {
        *self.publishes.lock().expect("lock") += 1;
    }
}

proptest! {
    #[test]
    fn aggregate_preserves_call_order(entries in prop::collection::vec(".{0,16}", 0..64)) {
        let rec = Record::new("prop");
        let mut agg = AggregateEmitter::new();
        for entry in &entries {
            agg.emit_entry(&rec, Entry::Text(entry)).unwrap();
        }
        prop_assert_eq!(agg.get_entries(), entries.iter().map(String::as_str).collect::<Vec<_>>());

        agg.clear();
        prop_assert!(agg.get_entries().is_empty());
    }

    #[test]
    fn lossy_modes_never_fail_and_stay_in_range(text in "\\PC{0,32}") {
        for mode in [ErrorMode::Ignore, ErrorMode::Replace, ErrorMode::BackslashReplace, ErrorMode::XmlCharRefReplace] {
            let ascii = encode(&text, Encoding::Ascii, mode).unwrap();
            prop_assert!(ascii.is_ascii());
            prop_assert!(encode(&text, Encoding::Latin1, mode).is_ok());
        }
        prop_assert_eq!(encode(&text, Encoding::Utf8, ErrorMode::Strict).unwrap(), text.as_bytes());
    }

    #[test]
    fn transactions_publish_exactly_once(
        steps in prop::collection::vec(step_strategy(), 0..12),
        fail in any::<bool>(),
    ) {
        let logger = Arc::new(CountingLogger::default());
        let mut rec = Record::new("txn").with_logger(logger.clone());
        let exit = if fail { Exit::Fail } else { Exit::Normal };

        let mut last_status = None;
        {
            let mut txn = rec.begin();
            for step in &steps {
                match step {
                    Step::Warn => { txn.warn("w"); }
                    Step::Success => { txn.success("ok"); last_status = Some(Status::Success); }
                    Step::Failure => { txn.failure("bad"); last_status = Some(Status::Failure); }
                    Step::SetMessage => { txn.set("message", "progress").unwrap(); }
                }
                prop_assert_eq!(*logger.publishes.lock().unwrap(), 0);
            }
            if let Exit::Fail = exit {
                txn.fail(ExceptionInfo::new("Err", "stop"));
            }
        }

        prop_assert_eq!(*logger.starts.lock().unwrap(), 1);
        prop_assert_eq!(*logger.publishes.lock().unwrap(), 1);

        let expected = match exit {
            Exit::Fail => Status::Exception,
            Exit::Normal => last_status.unwrap_or(Status::Success),
        };
        prop_assert_eq!(rec.status(), Some(&expected));

        let end = rec.end_time().unwrap();
        prop_assert_eq!(end.duration_since(rec.start_time()).unwrap(), rec.duration());
    }
}
