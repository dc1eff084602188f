//! Record update command implementation
//!
//! Edits go straight to the record store; the uploaded file in the content
//! area is left as it was uploaded.

use crate::error::{Error, Result};
use crate::store::{DataRecord, RecordPatch, RecordStore};
use serde_json::{Map, Value};
use tracing::info;

/// Apply field edits to the record at `line_number` of `filename`.
///
/// Accepts `system`, `query`, `response` and `annotation_result` with string
/// or null values. UI-only keys (`line_number`, `selected`, `quality_score`)
/// are ignored. Returns the record as stored after the edit.
pub async fn cmd_update_record(
    db: &RecordStore,
    filename: &str,
    line_number: i64,
    updates: &Map<String, Value>,
) -> Result<DataRecord> {
    let patch = RecordPatch::from_updates(updates)?;
    if patch.is_empty() {
        return Err(Error::Validation(
            "No updatable fields given (expected system, query, response or annotation_result)"
                .to_string(),
        ));
    }

    let file = db.require_active_file(filename).await?;
    let line_not_found = || Error::LineNotFound {
        filename: filename.to_string(),
        line_number,
    };

    let record = db
        .find_record_by_line(file.id, line_number)
        .await?
        .ok_or_else(line_not_found)?;

    if !db.patch_record(record.id, &patch).await? {
        return Err(line_not_found());
    }

    info!(filename = %filename, line = line_number, "Updated record");

    db.get_record(&record.unique_id)
        .await?
        .ok_or_else(|| Error::RecordNotFound(record.unique_id.clone()))
}

/// Parse the CLI's JSON argument into an update mapping
pub fn parse_updates(raw: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw)? {
        Value::Object(map) => Ok(map),
        _ => Err(Error::Validation(
            "Updates must be a JSON object".to_string(),
        )),
    }
}

pub fn print_updated_record(record: &DataRecord) {
    println!("✓ Updated line {} ({})", record.line_number, record.unique_id);
    println!("  system: {}", record.system.as_deref().unwrap_or("<null>"));
    println!("  query: {}", record.query.as_deref().unwrap_or("<null>"));
    println!("  response: {}", record.response.as_deref().unwrap_or("<null>"));
    println!(
        "  annotation: {}",
        record.annotation_result.as_deref().unwrap_or("<none>")
    );
}
