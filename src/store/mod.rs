//! Record storage using SQLite
//!
//! This module owns all durable state:
//! - Files (one row per uploaded dataset)
//! - Data records (one row per parsed JSONL line, linked to its file)
//!
//! Deletion is always soft: rows are flipped to `deleted` and drop out of every
//! active-record query, but stay in the database.

mod schema;

pub use schema::*;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::parse::ParsedRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;
use tracing::{debug, info};

/// How records of a file are labelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationType {
    /// Binary `correct` / `incorrect` labels
    Qa,
    /// Numeric 1-5 ratings
    Scoring,
}

impl std::fmt::Display for AnnotationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnnotationType::Qa => write!(f, "qa"),
            AnnotationType::Scoring => write!(f, "scoring"),
        }
    }
}

impl FromStr for AnnotationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "qa" => Ok(AnnotationType::Qa),
            "scoring" => Ok(AnnotationType::Scoring),
            _ => Err(Error::Validation(format!(
                "Unsupported annotation type: {} (expected 'qa' or 'scoring')",
                s
            ))),
        }
    }
}

impl AnnotationType {
    /// Interpret a stored annotation value.
    ///
    /// `qa` files only recognise the literal strings `correct` and `incorrect`.
    /// `scoring` files parse the value as a number and compare it against
    /// `threshold`. Anything else yields `None` and counts as unannotated.
    pub fn classify(&self, result: &str, threshold: f64) -> Option<Verdict> {
        match self {
            AnnotationType::Qa => match result {
                "correct" => Some(Verdict::Correct),
                "incorrect" => Some(Verdict::Incorrect),
                _ => None,
            },
            AnnotationType::Scoring => result.trim().parse::<f64>().ok().map(|score| {
                if score >= threshold {
                    Verdict::Correct
                } else {
                    Verdict::Incorrect
                }
            }),
        }
    }
}

/// Outcome bucket of an annotated record, also the selector for exports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Correct,
    Incorrect,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Correct => write!(f, "correct"),
            Verdict::Incorrect => write!(f, "incorrect"),
        }
    }
}

impl FromStr for Verdict {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "correct" => Ok(Verdict::Correct),
            "incorrect" => Ok(Verdict::Incorrect),
            _ => Err(Error::Validation(format!(
                "export_type must be 'correct' or 'incorrect', got '{}'",
                s
            ))),
        }
    }
}

/// Soft-delete marker shared by files and records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RowStatus {
    Active,
    Deleted,
}

impl std::fmt::Display for RowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowStatus::Active => write!(f, "active"),
            RowStatus::Deleted => write!(f, "deleted"),
        }
    }
}

/// Annotation-state filter for record queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationStatus {
    #[default]
    All,
    Annotated,
    NotAnnotated,
}

impl FromStr for AnnotationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" | "" => Ok(AnnotationStatus::All),
            "annotated" => Ok(AnnotationStatus::Annotated),
            "not_annotated" => Ok(AnnotationStatus::NotAnnotated),
            _ => Err(Error::Validation(format!(
                "Unknown annotation status filter: {} (expected all, annotated or not_annotated)",
                s
            ))),
        }
    }
}

/// An uploaded dataset
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct FileRow {
    pub id: i64,
    pub filename: String,
    pub original_filename: String,
    pub file_size: i64,
    pub total_records: i64,
    pub annotation_type: Option<String>,
    pub upload_time: String,
    pub last_modified: String,
    pub status: String,
}

impl FileRow {
    /// Annotation type of the file; anything other than `scoring` is treated as `qa`
    pub fn annotation_type(&self) -> AnnotationType {
        match self.annotation_type.as_deref() {
            Some("scoring") => AnnotationType::Scoring,
            _ => AnnotationType::Qa,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == RowStatus::Active.to_string()
    }
}

/// File metadata produced by ingestion, before it has a row id
#[derive(Debug, Clone)]
pub struct NewFile {
    pub filename: String,
    pub original_filename: String,
    pub file_size: i64,
    pub total_records: i64,
    pub annotation_type: AnnotationType,
}

/// One annotatable record
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DataRecord {
    pub id: i64,
    pub file_id: i64,
    pub unique_id: String,
    pub line_number: i64,
    pub system: Option<String>,
    pub query: Option<String>,
    pub response: Option<String>,
    pub annotation_result: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub status: String,
}

/// Filters and pagination for a record listing
#[derive(Debug, Clone)]
pub struct RecordQuery {
    /// Case-insensitive substring matched against system, query and response
    pub search: Option<String>,
    pub annotation_status: AnnotationStatus,
    /// 1-based page number
    pub page: u32,
    pub per_page: u32,
}

impl Default for RecordQuery {
    fn default() -> Self {
        Self {
            search: None,
            annotation_status: AnnotationStatus::All,
            page: 1,
            per_page: crate::config::default_per_page(),
        }
    }
}

/// A page of records plus the total number of matches before pagination
#[derive(Debug, Clone)]
pub struct RecordPage {
    pub records: Vec<DataRecord>,
    pub total_count: i64,
}

/// Field edits applied to a single record. `Some(None)` clears a field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub system: Option<Option<String>>,
    pub query: Option<Option<String>>,
    pub response: Option<Option<String>>,
    pub annotation_result: Option<Option<String>>,
}

/// Keys the UI attaches to records that are never persisted
const TRANSIENT_FIELDS: &[&str] = &["line_number", "selected", "quality_score"];

impl RecordPatch {
    /// Build a patch from an arbitrary update mapping.
    ///
    /// Transient UI keys are dropped. Unknown keys and values that are neither
    /// strings nor null are rejected.
    pub fn from_updates(updates: &Map<String, Value>) -> Result<Self> {
        let mut patch = RecordPatch::default();

        for (key, value) in updates {
            if TRANSIENT_FIELDS.contains(&key.as_str()) {
                continue;
            }

            let value = match value {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => {
                    return Err(Error::Validation(format!(
                        "Field '{}' must be a string or null, got {}",
                        key, other
                    )))
                }
            };

            match key.as_str() {
                "system" => patch.system = Some(value),
                "query" => patch.query = Some(value),
                "response" => patch.response = Some(value),
                "annotation_result" => patch.annotation_result = Some(value),
                _ => {
                    return Err(Error::Validation(format!(
                        "Field '{}' cannot be updated",
                        key
                    )))
                }
            }
        }

        Ok(patch)
    }

    pub fn is_empty(&self) -> bool {
        self.system.is_none()
            && self.query.is_none()
            && self.response.is_none()
            && self.annotation_result.is_none()
    }

    fn assignments(&self) -> Vec<(&'static str, Option<String>)> {
        [
            ("system", &self.system),
            ("query", &self.query),
            ("response", &self.response),
            ("annotation_result", &self.annotation_result),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.clone().map(|v| (column, v)))
        .collect()
    }
}

/// Build the external key of a record
pub fn make_unique_id(file_id: i64, line_number: i64, ingested_at: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}",
        file_id,
        line_number,
        ingested_at.format("%Y%m%d%H%M%S")
    )
}

/// SQLite's `LOWER()` folds ASCII letters only, so the pattern is folded the same way
fn like_pattern(search: &str) -> String {
    let mut escaped = String::with_capacity(search.len() + 2);
    escaped.push('%');
    for c in search.to_ascii_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Record store handle
#[derive(Clone)]
pub struct RecordStore {
    pool: SqlitePool,
}

impl RecordStore {
    /// Connect to the record database
    pub async fn connect(config: &Config) -> Result<Self> {
        Self::open(&config.paths.db_file).await
    }

    async fn open(db_path: &std::path::Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        debug!("Connecting to SQLite database at {:?}", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// Open the database at `db_path`, creating and migrating the schema when needed
    pub async fn new(db_path: &std::path::Path) -> Result<Self> {
        let store = Self::open(db_path).await?;

        if !store.is_initialized().await? {
            store.init_schema().await?;
        } else {
            store.migrate().await?;
        }

        Ok(store)
    }

    /// Initialize the database schema
    pub async fn init_schema(&self) -> Result<()> {
        info!("Initializing database schema");
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        self.migrate().await
    }

    /// Bring tables created by older versions up to date
    pub async fn migrate(&self) -> Result<()> {
        let columns: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info('files')")
            .fetch_all(&self.pool)
            .await?;

        for (column, ddl) in FILES_COLUMN_MIGRATIONS {
            if !columns.iter().any(|c| c == column) {
                info!(column = %column, "Adding missing column to files");
                sqlx::query(*ddl).execute(&self.pool).await?;
            }
        }

        sqlx::query("UPDATE files SET annotation_type = 'qa' WHERE annotation_type IS NULL")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Check if database is initialized
    pub async fn is_initialized(&self) -> Result<bool> {
        let result: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM sqlite_master WHERE type='table' AND name='files'")
                .fetch_optional(&self.pool)
                .await?;
        Ok(result.is_some())
    }

    // ===== File Operations =====

    /// Insert a file row, or refresh the existing row with the same stored filename.
    ///
    /// The row id survives a refresh so records already pointing at it stay valid.
    pub async fn upsert_file(&self, file: &NewFile) -> Result<FileRow> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            INSERT INTO files (filename, original_filename, file_size, total_records, annotation_type, upload_time, last_modified, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, 'active')
            ON CONFLICT(filename) DO UPDATE SET
                original_filename = excluded.original_filename,
                file_size = excluded.file_size,
                total_records = excluded.total_records,
                annotation_type = excluded.annotation_type,
                last_modified = excluded.last_modified,
                status = 'active'
            "#,
        )
        .bind(&file.filename)
        .bind(&file.original_filename)
        .bind(file.file_size)
        .bind(file.total_records)
        .bind(file.annotation_type.to_string())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.get_file_by_filename(&file.filename)
            .await?
            .ok_or_else(|| Error::FileNotFound(file.filename.clone()))
    }

    /// Get a file row by stored filename, whatever its status
    pub async fn get_file_by_filename(&self, filename: &str) -> Result<Option<FileRow>> {
        let file = sqlx::query_as::<_, FileRow>("SELECT * FROM files WHERE filename = ?")
            .bind(filename)
            .fetch_optional(&self.pool)
            .await?;
        Ok(file)
    }

    /// Resolve a stored filename to its active file
    pub async fn get_active_file(&self, filename: &str) -> Result<Option<FileRow>> {
        let file = sqlx::query_as::<_, FileRow>(
            "SELECT * FROM files WHERE filename = ? AND status = 'active'",
        )
        .bind(filename)
        .fetch_optional(&self.pool)
        .await?;
        Ok(file)
    }

    /// Like `get_active_file`, but a missing file is an error
    pub async fn require_active_file(&self, filename: &str) -> Result<FileRow> {
        self.get_active_file(filename)
            .await?
            .ok_or_else(|| Error::FileNotFound(filename.to_string()))
    }

    /// Get file by ID
    pub async fn get_file(&self, id: i64) -> Result<Option<FileRow>> {
        let file = sqlx::query_as::<_, FileRow>("SELECT * FROM files WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(file)
    }

    /// List active files, newest upload first
    pub async fn list_active_files(&self) -> Result<Vec<FileRow>> {
        let files = sqlx::query_as::<_, FileRow>(
            "SELECT * FROM files WHERE status = 'active' ORDER BY upload_time DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(files)
    }

    /// Soft-delete an active file and all of its records.
    ///
    /// Returns false when no active file carries that name.
    pub async fn soft_delete_file(&self, filename: &str) -> Result<bool> {
        let Some(file) = self.get_active_file(filename).await? else {
            return Ok(false);
        };

        let now = Utc::now().to_rfc3339();

        sqlx::query("UPDATE files SET status = ?, last_modified = ? WHERE id = ?")
            .bind(RowStatus::Deleted.to_string())
            .bind(&now)
            .bind(file.id)
            .execute(&self.pool)
            .await?;

        let result = sqlx::query(
            "UPDATE data_records SET status = ? WHERE file_id = ? AND status = 'active'",
        )
        .bind(RowStatus::Deleted.to_string())
        .bind(file.id)
        .execute(&self.pool)
        .await?;

        debug!(
            filename = %filename,
            records = result.rows_affected(),
            "Soft-deleted file"
        );
        Ok(true)
    }

    // ===== Record Operations =====

    /// Soft-delete every active record of a file (used before re-ingesting it)
    pub async fn retire_active_records(&self, file_id: i64) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE data_records SET status = ?, updated_at = ? WHERE file_id = ? AND status = 'active'",
        )
        .bind(RowStatus::Deleted.to_string())
        .bind(Utc::now().to_rfc3339())
        .bind(file_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Insert parsed records for a file in one transaction.
    ///
    /// A colliding `unique_id` replaces the earlier row's content and clears
    /// its annotation.
    pub async fn insert_records(
        &self,
        file_id: i64,
        records: &[ParsedRecord],
        ingested_at: DateTime<Utc>,
    ) -> Result<u64> {
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;
        let mut written = 0;

        for record in records {
            let result = sqlx::query(
                r#"
                INSERT INTO data_records (file_id, unique_id, line_number, system, query, response, annotation_result, created_at, updated_at, status)
                VALUES (?, ?, ?, ?, ?, ?, NULL, ?, ?, 'active')
                ON CONFLICT(unique_id) DO UPDATE SET
                    file_id = excluded.file_id,
                    line_number = excluded.line_number,
                    system = excluded.system,
                    query = excluded.query,
                    response = excluded.response,
                    annotation_result = NULL,
                    updated_at = excluded.updated_at,
                    status = 'active'
                "#,
            )
            .bind(file_id)
            .bind(make_unique_id(file_id, record.line_number, ingested_at))
            .bind(record.line_number)
            .bind(record.system())
            .bind(record.query())
            .bind(record.response())
            .bind(&now)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
            written += result.rows_affected();
        }

        tx.commit().await?;
        Ok(written)
    }

    /// Filtered, paginated view over a file's active records, ordered by line number
    pub async fn query_records(&self, file_id: i64, query: &RecordQuery) -> Result<RecordPage> {
        let mut conditions = vec!["file_id = ?", "status = 'active'"];

        let pattern = query
            .search
            .as_deref()
            .filter(|s| !s.is_empty())
            .map(like_pattern);

        if pattern.is_some() {
            conditions.push(
                "(LOWER(system) LIKE ? ESCAPE '\\' OR LOWER(query) LIKE ? ESCAPE '\\' OR LOWER(response) LIKE ? ESCAPE '\\')",
            );
        }

        match query.annotation_status {
            AnnotationStatus::All => {}
            AnnotationStatus::Annotated => conditions.push("annotation_result IS NOT NULL"),
            AnnotationStatus::NotAnnotated => conditions.push("annotation_result IS NULL"),
        }

        let where_clause = conditions.join(" AND ");

        let count_sql = format!("SELECT COUNT(*) FROM data_records WHERE {}", where_clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql).bind(file_id);
        if let Some(p) = &pattern {
            count_query = count_query.bind(p.clone()).bind(p.clone()).bind(p.clone());
        }
        let total_count = count_query.fetch_one(&self.pool).await?;

        let page = i64::from(query.page.max(1));
        let per_page = i64::from(query.per_page.max(1));
        let offset = (page - 1) * per_page;

        let select_sql = format!(
            "SELECT * FROM data_records WHERE {} ORDER BY line_number, id LIMIT ? OFFSET ?",
            where_clause
        );
        let mut select_query = sqlx::query_as::<_, DataRecord>(&select_sql).bind(file_id);
        if let Some(p) = &pattern {
            select_query = select_query.bind(p.clone()).bind(p.clone()).bind(p.clone());
        }
        let records = select_query
            .bind(per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(RecordPage {
            records,
            total_count,
        })
    }

    /// Set the annotation of the active record with this unique id.
    ///
    /// Returns false when no active record matches.
    pub async fn update_annotation(&self, unique_id: &str, annotation_result: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE data_records SET annotation_result = ?, updated_at = ?
            WHERE unique_id = ? AND status = 'active'
            "#,
        )
        .bind(annotation_result)
        .bind(Utc::now().to_rfc3339())
        .bind(unique_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Get a record by unique id, whatever its status
    pub async fn get_record(&self, unique_id: &str) -> Result<Option<DataRecord>> {
        let record = sqlx::query_as::<_, DataRecord>("SELECT * FROM data_records WHERE unique_id = ?")
            .bind(unique_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    /// First active record of a file at the given line
    pub async fn find_record_by_line(
        &self,
        file_id: i64,
        line_number: i64,
    ) -> Result<Option<DataRecord>> {
        let record = sqlx::query_as::<_, DataRecord>(
            r#"
            SELECT * FROM data_records
            WHERE file_id = ? AND line_number = ? AND status = 'active'
            ORDER BY id LIMIT 1
            "#,
        )
        .bind(file_id)
        .bind(line_number)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// Apply field edits to one active record by row id
    pub async fn patch_record(&self, id: i64, patch: &RecordPatch) -> Result<bool> {
        let assignments = patch.assignments();
        if assignments.is_empty() {
            return Ok(false);
        }

        let set_clause = assignments
            .iter()
            .map(|(column, _)| format!("{} = ?", column))
            .chain(std::iter::once("updated_at = ?".to_string()))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE data_records SET {} WHERE id = ? AND status = 'active'",
            set_clause
        );

        let mut update = sqlx::query(&sql);
        for (_, value) in assignments {
            update = update.bind(value);
        }
        let result = update
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ===== Statistics =====

    /// Count the active records of a file
    pub async fn count_active_records(&self, file_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM data_records WHERE file_id = ? AND status = 'active'",
        )
        .bind(file_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Active record counts grouped by exact annotation value (NULL included)
    pub async fn annotation_histogram(&self, file_id: i64) -> Result<Vec<(Option<String>, i64)>> {
        let rows: Vec<(Option<String>, i64)> = sqlx::query_as(
            r#"
            SELECT annotation_result, COUNT(*)
            FROM data_records
            WHERE file_id = ? AND status = 'active'
            GROUP BY annotation_result
            "#,
        )
        .bind(file_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Active, annotated records of a file in line order
    pub async fn annotated_records(&self, file_id: i64) -> Result<Vec<DataRecord>> {
        let records = sqlx::query_as::<_, DataRecord>(
            r#"
            SELECT * FROM data_records
            WHERE file_id = ? AND status = 'active' AND annotation_result IS NOT NULL
            ORDER BY line_number, id
            "#,
        )
        .bind(file_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    /// Count every record row of a file, including soft-deleted ones
    pub async fn count_all_records(&self, file_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM data_records WHERE file_id = ?")
            .bind(file_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_jsonl;
    use tempfile::TempDir;

    async fn setup_test_db() -> (RecordStore, TempDir) {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.db_file = tmp.path().join("test.db");

        let db = RecordStore::connect(&config).await.unwrap();
        db.init_schema().await.unwrap();
        (db, tmp)
    }

    fn new_file(name: &str, annotation_type: AnnotationType) -> NewFile {
        NewFile {
            filename: name.to_string(),
            original_filename: "data.jsonl".to_string(),
            file_size: 10,
            total_records: 0,
            annotation_type,
        }
    }

    #[test]
    fn test_classify_qa() {
        let qa = AnnotationType::Qa;
        assert_eq!(qa.classify("correct", 4.0), Some(Verdict::Correct));
        assert_eq!(qa.classify("incorrect", 4.0), Some(Verdict::Incorrect));
        assert_eq!(qa.classify("Correct", 4.0), None);
        assert_eq!(qa.classify("5", 4.0), None);
    }

    #[test]
    fn test_classify_scoring() {
        let scoring = AnnotationType::Scoring;
        assert_eq!(scoring.classify("4.0", 4.0), Some(Verdict::Correct));
        assert_eq!(scoring.classify("5", 4.0), Some(Verdict::Correct));
        assert_eq!(scoring.classify("3.9", 4.0), Some(Verdict::Incorrect));
        assert_eq!(scoring.classify(" 4 ", 4.0), Some(Verdict::Correct));
        assert_eq!(scoring.classify("bad", 4.0), None);
        assert_eq!(scoring.classify("correct", 4.0), None);
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("qa".parse::<AnnotationType>().unwrap(), AnnotationType::Qa);
        assert!("QA".parse::<AnnotationType>().unwrap_err().is_validation());
        assert!("maybe".parse::<Verdict>().unwrap_err().is_validation());
        assert_eq!(
            "not_annotated".parse::<AnnotationStatus>().unwrap(),
            AnnotationStatus::NotAnnotated
        );
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Hello"), "%hello%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("Über ALLES"), "%Über alles%");
    }

    #[test]
    fn test_unique_id_format() {
        let at = DateTime::parse_from_rfc3339("2024-03-05T07:08:09Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(make_unique_id(7, 12, at), "7_12_20240305070809");
    }

    #[test]
    fn test_patch_from_updates() {
        let updates: Map<String, Value> = serde_json::from_str(
            r#"{"query": "new", "response": null, "selected": true, "line_number": 3}"#,
        )
        .unwrap();
        let patch = RecordPatch::from_updates(&updates).unwrap();
        assert_eq!(patch.query, Some(Some("new".to_string())));
        assert_eq!(patch.response, Some(None));
        assert_eq!(patch.system, None);

        let bad: Map<String, Value> = serde_json::from_str(r#"{"id": "1"}"#).unwrap();
        assert!(RecordPatch::from_updates(&bad).unwrap_err().is_validation());

        let bad: Map<String, Value> = serde_json::from_str(r#"{"query": 5}"#).unwrap();
        assert!(RecordPatch::from_updates(&bad).unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_file_upsert_keeps_id() {
        let (db, _tmp) = setup_test_db().await;

        let first = db
            .upsert_file(&new_file("20240101_000000_a.jsonl", AnnotationType::Qa))
            .await
            .unwrap();
        assert!(first.is_active());

        let mut again = new_file("20240101_000000_a.jsonl", AnnotationType::Scoring);
        again.total_records = 3;
        let second = db.upsert_file(&again).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.total_records, 3);
        assert_eq!(second.annotation_type(), AnnotationType::Scoring);
        assert_eq!(db.list_active_files().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_record_roundtrip_and_annotation() {
        let (db, _tmp) = setup_test_db().await;
        let file = db
            .upsert_file(&new_file("f.jsonl", AnnotationType::Qa))
            .await
            .unwrap();

        let parsed = parse_jsonl(
            b"{\"system\":\"s1\",\"query\":\"q1\",\"response\":\"r1\"}\n{\"query\":\"q2\"}\n",
        );
        let written = db
            .insert_records(file.id, &parsed.records, Utc::now())
            .await
            .unwrap();
        assert_eq!(written, 2);

        let page = db
            .query_records(file.id, &RecordQuery::default())
            .await
            .unwrap();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.records[0].system.as_deref(), Some("s1"));
        assert_eq!(page.records[1].system.as_deref(), Some(""));

        let uid = page.records[1].unique_id.clone();
        assert!(db.update_annotation(&uid, "correct").await.unwrap());
        assert!(!db.update_annotation("nonexistent", "correct").await.unwrap());

        let histogram = db.annotation_histogram(file.id).await.unwrap();
        assert!(histogram.contains(&(Some("correct".to_string()), 1)));
        assert!(histogram.contains(&(None, 1)));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_file_but_keeps_rows() {
        let (db, _tmp) = setup_test_db().await;
        let file = db
            .upsert_file(&new_file("gone.jsonl", AnnotationType::Qa))
            .await
            .unwrap();
        let parsed = parse_jsonl(b"{\"query\":\"q\"}\n");
        db.insert_records(file.id, &parsed.records, Utc::now())
            .await
            .unwrap();

        assert!(db.soft_delete_file("gone.jsonl").await.unwrap());
        assert!(!db.soft_delete_file("gone.jsonl").await.unwrap());
        assert!(db.get_active_file("gone.jsonl").await.unwrap().is_none());

        let raw = db.get_file_by_filename("gone.jsonl").await.unwrap().unwrap();
        assert_eq!(raw.status, RowStatus::Deleted.to_string());
        assert_eq!(db.count_active_records(file.id).await.unwrap(), 0);
        assert_eq!(db.count_all_records(file.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_migrate_adds_annotation_type() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.db_file = tmp.path().join("old.db");
        let db = RecordStore::connect(&config).await.unwrap();

        sqlx::query(
            r#"
            CREATE TABLE files (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                filename TEXT NOT NULL UNIQUE,
                original_filename TEXT NOT NULL,
                file_size INTEGER NOT NULL,
                total_records INTEGER NOT NULL,
                upload_time TEXT NOT NULL,
                last_modified TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active'
            )
            "#,
        )
        .execute(&db.pool)
        .await
        .unwrap();
        sqlx::query(
            "INSERT INTO files (filename, original_filename, file_size, total_records, upload_time, last_modified) VALUES ('old.jsonl', 'old.jsonl', 1, 0, 't', 't')",
        )
        .execute(&db.pool)
        .await
        .unwrap();

        db.init_schema().await.unwrap();

        let file = db.get_active_file("old.jsonl").await.unwrap().unwrap();
        assert_eq!(file.annotation_type.as_deref(), Some("qa"));
    }
}
