//! JSONL decoding and encoding
//!
//! Uploaded files are decoded one physical line at a time. Blank lines and
//! lines that fail to decode are skipped, but every physical line advances the
//! 1-based line counter so `line_number` always points into the source file.

use crate::error::Result;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

/// One decoded JSONL line
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRecord {
    /// 1-based physical line in the source file
    pub line_number: i64,
    /// The decoded object, untouched
    pub fields: Map<String, Value>,
}

impl ParsedRecord {
    pub fn system(&self) -> Option<String> {
        self.text_field("system")
    }

    pub fn query(&self) -> Option<String> {
        self.text_field("query")
    }

    pub fn response(&self) -> Option<String> {
        self.text_field("response")
    }

    /// Missing keys become an empty string, explicit nulls stay NULL, and
    /// non-string values are stored as their JSON text.
    fn text_field(&self, key: &str) -> Option<String> {
        match self.fields.get(key) {
            None => Some(String::new()),
            Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

/// Records are echoed back to the uploader with their bookkeeping attached
impl Serialize for ParsedRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 3))?;
        for (key, value) in &self.fields {
            if matches!(key.as_str(), "line_number" | "selected" | "annotation_result") {
                continue;
            }
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry("line_number", &self.line_number)?;
        map.serialize_entry("selected", &false)?;
        map.serialize_entry("annotation_result", &Value::Null)?;
        map.end()
    }
}

/// A line that could not be decoded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedLine {
    pub line_number: i64,
    pub reason: String,
}

/// Result of decoding a whole upload
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub records: Vec<ParsedRecord>,
    pub skipped: Vec<SkippedLine>,
}

/// Decode JSONL content into records, tolerating malformed lines
pub fn parse_jsonl(content: &[u8]) -> ParseOutcome {
    let content = content.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(content);
    let mut outcome = ParseOutcome::default();

    for (index, raw) in content.split(|b| *b == b'\n').enumerate() {
        let line_number = index as i64 + 1;

        let line = match std::str::from_utf8(raw) {
            Ok(line) => line.trim(),
            Err(e) => {
                warn!(line = line_number, error = %e, "Skipping line with invalid UTF-8");
                outcome.skipped.push(SkippedLine {
                    line_number,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(line) {
            Ok(Value::Object(fields)) => outcome.records.push(ParsedRecord {
                line_number,
                fields,
            }),
            Ok(other) => {
                let reason = format!("expected a JSON object, found {}", json_kind(&other));
                warn!(line = line_number, %reason, "Skipping line");
                outcome.skipped.push(SkippedLine {
                    line_number,
                    reason,
                });
            }
            Err(e) => {
                warn!(line = line_number, error = %e, "Skipping malformed JSON line");
                outcome.skipped.push(SkippedLine {
                    line_number,
                    reason: e.to_string(),
                });
            }
        }
    }

    outcome
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Serialize items as JSONL, one compact object per line, UTF-8 kept as-is
pub fn to_jsonl<T: Serialize>(items: &[T]) -> Result<String> {
    let mut out = String::new();
    for item in items {
        out.push_str(&serde_json::to_string(item)?);
        out.push('\n');
    }
    Ok(out)
}
