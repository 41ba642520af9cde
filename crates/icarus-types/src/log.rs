//! Journal records and file bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

/// A single raw journal record.
///
/// Only `timestamp` and `event` are typed; every other key is kept verbatim
/// so the record serializes back to exactly the shape the game wrote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    /// When the game wrote the record.
    pub timestamp: DateTime<Utc>,
    /// Journal event name (e.g. `FSDJump`, `LoadGame`).
    pub event: String,
    /// All remaining keys of the record.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl LogEvent {
    /// Create a record with no extra fields.
    pub fn new(event: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            event: event.into(),
            fields: Map::new(),
        }
    }

    /// Builder-style field insertion, mostly for tests and fixtures.
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Look up a raw field.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Look up a string field.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Look up an unsigned integer field.
    pub fn u64_field(&self, key: &str) -> Option<u64> {
        self.fields.get(key).and_then(Value::as_u64)
    }
}

/// A file reported by a record source while loading or watching.
///
/// Identity is the file name: the same name is only ever counted once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct LoadedFile {
    /// File name (no directory component).
    pub name: String,
    /// Size on disk at the time it was read.
    pub size_bytes: u64,
    /// Number of lines, for line-oriented sources.
    pub line_count: Option<u64>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_journal_line_and_keeps_extra_fields() {
        let line = r#"{ "timestamp":"2024-03-01T18:22:04Z", "event":"FSDJump", "StarSystem":"Sol", "Population":22780919531 }"#;
        let record: LogEvent = serde_json::from_str(line).unwrap();

        assert_eq!(record.event, "FSDJump");
        assert_eq!(record.str_field("StarSystem"), Some("Sol"));
        assert_eq!(record.u64_field("Population"), Some(22_780_919_531));
        assert!(record.field("timestamp").is_none());
    }

    #[test]
    fn serializes_back_to_flat_shape() {
        let record = LogEvent::new("LoadGame", Utc::now()).with_field("Commander", "Jameson");
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["event"], "LoadGame");
        assert_eq!(json["Commander"], "Jameson");
        assert!(json.get("fields").is_none());
    }
}
