//! On-disk content and output areas
//!
//! Uploads are kept under the content area as `<timestamp>_<original name>`;
//! exports are written to the output area under the name the caller asks for.

use crate::config::Config;
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Reduce a caller-supplied name to a bare file name.
///
/// Directory components are dropped; names that are empty or only dots are rejected.
pub fn sanitize_file_name(name: &str) -> Result<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("").trim();

    if base.is_empty() || base.chars().all(|c| c == '.') {
        return Err(Error::Validation(format!("Invalid file name: '{}'", name)));
    }

    Ok(base.to_string())
}

/// Stored name for an upload: the original name prefixed with its upload time
pub fn stored_file_name(original: &str, uploaded_at: DateTime<Utc>) -> String {
    format!("{}_{}", uploaded_at.format("%Y%m%d_%H%M%S"), original)
}

/// Human-readable size, 1024-based with one decimal above a kilobyte
pub fn format_file_size(bytes: i64) -> String {
    const KB: i64 = 1024;
    const MB: i64 = 1024 * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

/// Handle over the uploads and output directories
#[derive(Debug, Clone)]
pub struct ContentArea {
    uploads_dir: PathBuf,
    output_dir: PathBuf,
}

impl ContentArea {
    pub fn new(config: &Config) -> Self {
        Self {
            uploads_dir: config.paths.uploads_dir.clone(),
            output_dir: config.paths.output_dir.clone(),
        }
    }

    /// Create both directories if they are missing
    pub async fn ensure_dirs(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.uploads_dir).await?;
        tokio::fs::create_dir_all(&self.output_dir).await?;
        Ok(())
    }

    pub fn upload_path(&self, stored_name: &str) -> PathBuf {
        self.uploads_dir.join(stored_name)
    }

    /// Path of an export artifact; the name must be a bare file name
    pub fn export_path(&self, export_name: &str) -> Result<PathBuf> {
        let sanitized = sanitize_file_name(export_name)?;
        if sanitized != export_name {
            return Err(Error::Validation(format!(
                "Export name must be a plain file name, got '{}'",
                export_name
            )));
        }
        Ok(self.output_dir.join(sanitized))
    }

    /// Persist raw upload bytes
    pub async fn save_upload(&self, stored_name: &str, content: &[u8]) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.uploads_dir).await?;
        let path = self.upload_path(stored_name);
        tokio::fs::write(&path, content).await?;
        debug!(path = %path.display(), bytes = content.len(), "Saved upload");
        Ok(path)
    }

    /// Read an upload back
    pub async fn read_upload(&self, stored_name: &str) -> Result<Vec<u8>> {
        let path = self.upload_path(stored_name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::FileNotFound(stored_name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove an upload; returns false when it was already gone
    pub async fn remove_upload(&self, stored_name: &str) -> Result<bool> {
        let path = self.upload_path(stored_name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Upload already missing from content area");
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write a JSONL artifact to the output area
    pub async fn write_export(&self, export_name: &str, jsonl: &str) -> Result<PathBuf> {
        let path = self.export_path(export_name)?;
        tokio::fs::create_dir_all(&self.output_dir).await?;
        tokio::fs::write(&path, jsonl.as_bytes()).await?;
        debug!(path = %path.display(), "Wrote export");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn area(tmp: &TempDir) -> ContentArea {
        let mut config = Config::default();
        config.init_paths(Some(tmp.path().to_path_buf()));
        ContentArea::new(&config)
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("data.jsonl").unwrap(), "data.jsonl");
        assert_eq!(sanitize_file_name("/tmp/x/data.jsonl").unwrap(), "data.jsonl");
        assert_eq!(sanitize_file_name("..\\data.jsonl").unwrap(), "data.jsonl");
        assert!(sanitize_file_name("..").is_err());
        assert!(sanitize_file_name("dir/").is_err());
    }

    #[test]
    fn test_stored_file_name() {
        let at = DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(stored_file_name("a.jsonl", at), "20240102_030405_a.jsonl");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_export_path_rejects_directories() {
        let tmp = TempDir::new().unwrap();
        let area = area(&tmp);
        assert!(area.export_path("out.jsonl").is_ok());
        assert!(area.export_path("../out.jsonl").unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_upload_lifecycle() {
        let tmp = TempDir::new().unwrap();
        let area = area(&tmp);

        area.save_upload("u.jsonl", b"{}\n").await.unwrap();
        assert_eq!(area.read_upload("u.jsonl").await.unwrap(), b"{}\n");
        assert!(area.remove_upload("u.jsonl").await.unwrap());
        assert!(!area.remove_upload("u.jsonl").await.unwrap());
        assert!(area.read_upload("u.jsonl").await.unwrap_err().is_not_found());
    }
}
