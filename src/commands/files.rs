//! File listing, lookup and deletion commands

use crate::config::Config;
use crate::content::{format_file_size, ContentArea};
use crate::error::{Error, Result};
use crate::store::{FileRow, RecordStore};
use serde::Serialize;
use tracing::info;

/// File descriptor with a display-friendly size
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    #[serde(flatten)]
    pub file: FileRow,
    pub file_size_formatted: String,
}

impl From<FileRow> for FileInfo {
    fn from(file: FileRow) -> Self {
        Self {
            file_size_formatted: format_file_size(file.file_size),
            file,
        }
    }
}

/// All active files
#[derive(Debug, Clone, Serialize)]
pub struct FileList {
    pub files: Vec<FileInfo>,
    pub total_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    pub filename: String,
    pub success: bool,
    /// False when the upload was already gone from the content area
    pub upload_removed: bool,
}

/// List active files, newest first
pub async fn cmd_list_files(db: &RecordStore) -> Result<FileList> {
    let files: Vec<FileInfo> = db
        .list_active_files()
        .await?
        .into_iter()
        .map(FileInfo::from)
        .collect();

    Ok(FileList {
        total_count: files.len(),
        files,
    })
}

/// Look up one active file
pub async fn cmd_file_info(db: &RecordStore, filename: &str) -> Result<FileInfo> {
    Ok(db.require_active_file(filename).await?.into())
}

/// Soft-delete a file and its records, then drop its upload
pub async fn cmd_delete_file(
    config: &Config,
    db: &RecordStore,
    filename: &str,
) -> Result<DeleteOutcome> {
    if !db.soft_delete_file(filename).await? {
        return Err(Error::FileNotFound(filename.to_string()));
    }

    let upload_removed = ContentArea::new(config).remove_upload(filename).await?;
    info!(filename = %filename, upload_removed, "Deleted file");

    Ok(DeleteOutcome {
        filename: filename.to_string(),
        success: true,
        upload_removed,
    })
}

/// Print the file list to console
pub fn print_files(list: &FileList) {
    println!("\n📚 Uploaded Files\n");

    if list.files.is_empty() {
        println!("No files uploaded. Use 'annotator ingest' to add one.");
        return;
    }

    for info in &list.files {
        print_file_info(info);
    }
}

pub fn print_file_info(info: &FileInfo) {
    let file = &info.file;
    println!("• {} [{}]", file.filename, file.annotation_type());
    println!("  Original name: {}", file.original_filename);
    println!(
        "  Records: {}, Size: {}",
        file.total_records, info.file_size_formatted
    );
    println!("  Uploaded: {}", file.upload_time);
    println!();
}

pub fn print_delete_outcome(outcome: &DeleteOutcome) {
    println!("✓ Deleted {}", outcome.filename);
    if !outcome.upload_removed {
        println!("  (stored upload was already missing)");
    }
}
