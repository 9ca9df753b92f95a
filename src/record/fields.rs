//! Key-based access over a record's named fields and its extras.
//!
//! Named fields always win: a key that names a field is never looked up in,
//! or written to, the extras mapping.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde_json::{Map, json};
use thiserror::Error;

use crate::types::{Level, Status, Value};

use super::Record;

/// Keys resolved against named fields before extras.
pub const NAMED_FIELDS: &[&str] = &[
    "name",
    "level",
    "status",
    "message",
    "raw_message",
    "start_time",
    "end_time",
    "duration",
    "warnings",
    "callpoint",
];

/// Rejected [`Record::set`] call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The named field is managed by the record lifecycle.
    #[error("field {0:?} is read-only")]
    ReadOnly(String),
    /// The value has the wrong JSON type for the field.
    #[error("field {key:?} expects {expected}")]
    TypeMismatch {
        /// Field name.
        key: String,
        /// Accepted values.
        expected: &'static str,
    },
}

impl Record {
    /// Looks `key` up among named fields, then in extras.
    ///
    /// An unset named field yields `Some(Value::Null)`; it still shadows any
    /// extra of the same name.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self.named_field(key) {
            Some(value) => Some(value),
            None => self.extras.get(key).cloned(),
        }
    }

    /// Writes a named field if `key` names one, otherwise inserts into extras.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), FieldError> {
        let value = value.into();
        match key {
            "name" => {
                self.name = value
                    .as_str()
                    .ok_or_else(|| mismatch(key, "a string"))?
                    .to_string();
            }
            "level" => {
                self.level = match value {
                    Value::Null => None,
                    other => {
                        let n = other
                            .as_u64()
                            .and_then(|n| u8::try_from(n).ok())
                            .ok_or_else(|| mismatch(key, "an integer in 0..=255 or null"))?;
                        Some(Level(n))
                    }
                };
            }
            "status" => {
                self.status = opt_string(key, value)?.map(|s| Status::from_name(&s));
            }
            "message" => self.message = opt_string(key, value)?,
            "raw_message" => self.raw_message = opt_string(key, value)?,
            _ if NAMED_FIELDS.contains(&key) => return Err(FieldError::ReadOnly(key.to_string())),
            _ => {
                self.extras.insert(key.to_string(), value);
            }
        }
        Ok(())
    }

    /// All fields as one JSON object; extras shadowed by a named field are
    /// left out.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for key in NAMED_FIELDS {
            if let Some(value) = self.named_field(key) {
                map.insert((*key).to_string(), value);
            }
        }
        for (key, value) in &self.extras {
            if !NAMED_FIELDS.contains(&key.as_str()) {
                map.insert(key.clone(), value.clone());
            }
        }
        Value::Object(map)
    }

    fn named_field(&self, key: &str) -> Option<Value> {
        let value = match key {
            "name" => json!(self.name),
            "level" => json!(self.level.map(|l| l.0)),
            "status" => json!(self.status.as_ref().map(Status::as_str)),
            "message" => json!(self.message),
            "raw_message" => json!(self.raw_message),
            "start_time" => json!(epoch_secs(self.start_time)),
            "end_time" => json!(self.end_time.map(epoch_secs)),
            "duration" => json!(self.duration.as_secs_f64()),
            "warnings" => json!(self.warnings),
            "callpoint" => json!(self.callpoint.to_string()),
            _ => return None,
        };
        Some(value)
    }
}

fn mismatch(key: &str, expected: &'static str) -> FieldError {
    FieldError::TypeMismatch {
        key: key.to_string(),
        expected,
    }
}

fn opt_string(key: &str, value: Value) -> Result<Option<String>, FieldError> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        _ => Err(mismatch(key, "a string or null")),
    }
}

fn epoch_secs(t: SystemTime) -> f64 {
    t.duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extras_fall_back_after_named_fields() {
        let mut rec = Record::new("fetch").with_extra("user", "ada");
        assert_eq!(rec.get("user"), Some(json!("ada")));
        assert_eq!(rec.get("status"), Some(Value::Null));
        assert_eq!(rec.get("missing"), None);

        rec.set("attempt", 3).unwrap();
        assert_eq!(rec.extras().get("attempt"), Some(&json!(3)));
    }

    #[test]
    fn named_fields_shadow_extras() {
        let mut rec = Record::new("fetch").with_extra("message", "hidden");
        assert_eq!(rec.get("message"), Some(Value::Null));

        rec.set("message", "shown").unwrap();
        assert_eq!(rec.message(), Some("shown"));
        assert_eq!(rec.extras().get("message"), Some(&json!("hidden")));
        assert_eq!(rec.to_json()["message"], json!("shown"));
    }

    #[test]
    fn custom_status_through_set() {
        let mut rec = Record::new("fetch");
        rec.set("status", "retrying").unwrap();
        assert_eq!(rec.status(), Some(&Status::Custom("retrying".into())));
    }

    #[test]
    fn lifecycle_fields_reject_writes() {
        let mut rec = Record::new("fetch");
        assert_eq!(
            rec.set("start_time", 0.0),
            Err(FieldError::ReadOnly("start_time".into()))
        );
        assert!(matches!(
            rec.set("level", "high"),
            Err(FieldError::TypeMismatch { .. })
        ));
    }
}
