//! SQLite schema definition

/// SQL schema for the record store
pub const SCHEMA_SQL: &str = r#"
-- Files: one row per uploaded dataset
CREATE TABLE IF NOT EXISTS files (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filename TEXT NOT NULL UNIQUE,
    original_filename TEXT NOT NULL,
    file_size INTEGER NOT NULL,
    total_records INTEGER NOT NULL,
    annotation_type TEXT DEFAULT 'qa',
    upload_time TEXT NOT NULL,
    last_modified TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active'
);

-- Data records: one row per parsed JSONL line
CREATE TABLE IF NOT EXISTS data_records (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_id INTEGER NOT NULL REFERENCES files(id),
    unique_id TEXT NOT NULL UNIQUE,
    line_number INTEGER NOT NULL,
    system TEXT,
    query TEXT,
    response TEXT,
    annotation_result TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active'
);

-- Indexes for performance
CREATE INDEX IF NOT EXISTS idx_data_records_file_id ON data_records(file_id);
CREATE INDEX IF NOT EXISTS idx_data_records_unique_id ON data_records(unique_id);
CREATE INDEX IF NOT EXISTS idx_data_records_annotation_result ON data_records(annotation_result);
CREATE INDEX IF NOT EXISTS idx_data_records_file_line ON data_records(file_id, line_number);
"#;

/// Columns added to `files` after the first release, with their DDL
pub const FILES_COLUMN_MIGRATIONS: &[(&str, &str)] = &[(
    "annotation_type",
    "ALTER TABLE files ADD COLUMN annotation_type TEXT DEFAULT 'qa'",
)];
