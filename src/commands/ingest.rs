//! Ingest command implementation

use crate::config::Config;
use crate::content::{sanitize_file_name, stored_file_name, ContentArea};
use crate::error::{Error, Result};
use crate::parse::{parse_jsonl, ParsedRecord, SkippedLine};
use crate::progress::record_progress_bar;
use crate::store::{AnnotationType, FileRow, NewFile, RecordStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

/// Records are written in transactions of this many rows
const INSERT_BATCH_SIZE: usize = 500;

/// Outcome of an upload
#[derive(Debug, Clone, Serialize)]
pub struct IngestResult {
    pub filename: String,
    pub original_filename: String,
    pub file_size: i64,
    pub total_count: i64,
    pub annotation_type: AnnotationType,
    pub records_stored: u64,
    pub skipped_lines: Vec<SkippedLine>,
    pub data: Vec<ParsedRecord>,
}

/// Ingest raw JSONL bytes uploaded under `original_name`.
///
/// The upload is rejected before anything is written when the extension is not
/// allowed or the annotation type is unknown. Malformed lines are skipped.
/// The file row is committed before its records; if storing records fails
/// the file row stays behind with the parsed record count.
pub async fn cmd_ingest(
    config: &Config,
    db: &RecordStore,
    content: &[u8],
    original_name: &str,
    annotation_type: &str,
) -> Result<IngestResult> {
    ingest_at(config, db, content, original_name, annotation_type, Utc::now()).await
}

/// Ingest with an explicit upload time, which fixes both the stored filename
/// and the `unique_id` timestamps
async fn ingest_at(
    config: &Config,
    db: &RecordStore,
    content: &[u8],
    original_name: &str,
    annotation_type: &str,
    uploaded_at: DateTime<Utc>,
) -> Result<IngestResult> {
    let original_filename = sanitize_file_name(original_name)?;
    if !config.is_allowed_file(&original_filename) {
        return Err(Error::Validation(format!(
            "Unsupported file format: {} (allowed: {})",
            original_filename,
            config.ingest.allowed_extensions.join(", ")
        )));
    }
    let annotation_type: AnnotationType = annotation_type.parse()?;

    let filename = stored_file_name(&original_filename, uploaded_at);

    let area = ContentArea::new(config);
    area.save_upload(&filename, content).await?;

    let parsed = parse_jsonl(content);
    if !parsed.skipped.is_empty() {
        warn!(
            filename = %filename,
            skipped = parsed.skipped.len(),
            "Some lines could not be parsed"
        );
    }

    let file = db
        .upsert_file(&NewFile {
            filename: filename.clone(),
            original_filename: original_filename.clone(),
            file_size: content.len() as i64,
            total_records: parsed.records.len() as i64,
            annotation_type,
        })
        .await?;

    let retired = db.retire_active_records(file.id).await?;
    if retired > 0 {
        info!(filename = %filename, retired, "Replaced records of re-uploaded file");
    }

    let records_stored = store_records(db, &file, &parsed.records, uploaded_at).await?;

    info!(
        filename = %filename,
        records = parsed.records.len(),
        skipped = parsed.skipped.len(),
        annotation_type = %annotation_type,
        "Ingested file"
    );

    Ok(IngestResult {
        filename,
        original_filename,
        file_size: file.file_size,
        total_count: file.total_records,
        annotation_type,
        records_stored,
        skipped_lines: parsed.skipped,
        data: parsed.records,
    })
}

/// Ingest a JSONL file from the local filesystem
pub async fn cmd_ingest_path(
    config: &Config,
    db: &RecordStore,
    path: &Path,
    name: Option<String>,
    annotation_type: &str,
) -> Result<IngestResult> {
    let original_name = match name {
        Some(n) => n,
        None => path
            .file_name()
            .and_then(|n| n.to_str())
            .map(String::from)
            .ok_or_else(|| Error::Validation(format!("Invalid path: {}", path.display())))?,
    };

    let content = tokio::fs::read(path).await?;
    cmd_ingest(config, db, &content, &original_name, annotation_type).await
}

async fn store_records(
    db: &RecordStore,
    file: &FileRow,
    records: &[ParsedRecord],
    uploaded_at: DateTime<Utc>,
) -> Result<u64> {
    let pb = record_progress_bar(records.len() as u64, &file.filename);
    let mut stored = 0;

    for batch in records.chunks(INSERT_BATCH_SIZE) {
        stored += db.insert_records(file.id, batch, uploaded_at).await?;
        pb.inc(batch.len() as u64);
    }

    pb.finish_and_clear();
    Ok(stored)
}

/// Print an ingestion summary to console
pub fn print_ingest_result(result: &IngestResult) {
    println!("✓ Uploaded {}", result.original_filename);
    println!("  Stored as: {}", result.filename);
    println!("  Annotation type: {}", result.annotation_type);
    println!("  Size: {} bytes", result.file_size);
    println!("  Records: {}", result.total_count);
    if !result.skipped_lines.is_empty() {
        println!("  Skipped lines: {}", result.skipped_lines.len());
        for skipped in &result.skipped_lines {
            println!("    line {}: {}", skipped.line_number, skipped.reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cmd_stats;
    use crate::commands::testing::test_env;
    use crate::store::RecordQuery;

    const SAMPLE: &[u8] = b"{\"system\":\"s1\",\"query\":\"q1\",\"response\":\"r1\"}\n\
{broken\n\
\n\
{\"system\":\"s2\",\"query\":\"q2\",\"response\":\"r2\"}\n";

    #[tokio::test]
    async fn test_ingest_stores_file_and_records() {
        let (config, db, _tmp) = test_env().await;

        let result = cmd_ingest(&config, &db, SAMPLE, "sample.jsonl", "qa")
            .await
            .unwrap();

        assert!(result.filename.ends_with("_sample.jsonl"));
        assert_eq!(result.file_size, SAMPLE.len() as i64);
        assert_eq!(result.total_count, 2);
        assert_eq!(result.records_stored, 2);
        assert_eq!(result.skipped_lines.len(), 1);
        assert_eq!(result.skipped_lines[0].line_number, 2);
        assert!(config.paths.uploads_dir.join(&result.filename).exists());

        let file = db.require_active_file(&result.filename).await.unwrap();
        let page = db
            .query_records(file.id, &RecordQuery::default())
            .await
            .unwrap();
        let lines: Vec<i64> = page.records.iter().map(|r| r.line_number).collect();
        assert_eq!(lines, vec![1, 4]);
        assert!(page.records[0]
            .unique_id
            .starts_with(&format!("{}_1_", file.id)));
    }

    #[tokio::test]
    async fn test_ingest_rejects_before_writing() {
        let (config, db, _tmp) = test_env().await;

        let err = cmd_ingest(&config, &db, SAMPLE, "sample.csv", "qa")
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = cmd_ingest(&config, &db, SAMPLE, "sample.jsonl", "rating")
            .await
            .unwrap_err();
        assert!(err.is_validation());

        assert!(db.list_active_files().await.unwrap().is_empty());
        assert!(!config.paths.uploads_dir.exists()
            || std::fs::read_dir(&config.paths.uploads_dir)
                .unwrap()
                .next()
                .is_none());
    }

    #[tokio::test]
    async fn test_ingest_empty_file() {
        let (config, db, _tmp) = test_env().await;
        let result = cmd_ingest(&config, &db, b"", "empty.jsonl", "scoring")
            .await
            .unwrap();
        assert_eq!(result.total_count, 0);
        assert_eq!(result.annotation_type, AnnotationType::Scoring);
    }

    #[tokio::test]
    async fn test_reupload_replaces_records_and_annotations() {
        let (config, db, _tmp) = test_env().await;
        let at = DateTime::parse_from_rfc3339("2024-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let two_lines = b"{\"query\":\"x\"}\n{\"query\":\"y\"}\n";
        let first = ingest_at(&config, &db, two_lines, "same.jsonl", "qa", at)
            .await
            .unwrap();
        let file_id = db.require_active_file(&first.filename).await.unwrap().id;
        let page = db
            .query_records(file_id, &RecordQuery::default())
            .await
            .unwrap();
        for record in &page.records {
            assert!(db.update_annotation(&record.unique_id, "correct").await.unwrap());
        }

        let one_line = b"{\"query\":\"x\"}\n";
        let second = ingest_at(&config, &db, one_line, "same.jsonl", "qa", at)
            .await
            .unwrap();
        assert_eq!(second.filename, first.filename);

        let file = db.require_active_file(&second.filename).await.unwrap();
        assert_eq!(file.id, file_id);
        assert_eq!(file.total_records, 1);

        let page = db
            .query_records(file_id, &RecordQuery::default())
            .await
            .unwrap();
        let rows: Vec<(i64, Option<&str>, Option<&str>)> = page
            .records
            .iter()
            .map(|r| (r.line_number, r.query.as_deref(), r.annotation_result.as_deref()))
            .collect();
        assert_eq!(rows, vec![(1, Some("x"), None)]);
        assert_eq!(db.count_all_records(file_id).await.unwrap(), 2);

        let stats = cmd_stats(&config, &db, &second.filename).await.unwrap();
        assert_eq!(stats.total_count, 1);
        assert_eq!(stats.correct_count, 0);
        assert_eq!(stats.unannotated_count, 1);
    }

    #[tokio::test]
    async fn test_ingest_path_uses_file_name() {
        let (config, db, tmp) = test_env().await;
        let path = tmp.path().join("local.jsonl");
        std::fs::write(&path, SAMPLE).unwrap();

        let result = cmd_ingest_path(&config, &db, &path, None, "qa")
            .await
            .unwrap();
        assert_eq!(result.original_filename, "local.jsonl");
    }
}
