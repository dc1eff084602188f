//! Shared fixtures for end-to-end tests

#![allow(dead_code)]

use annotator::commands::{cmd_ingest, cmd_init, cmd_query_records, IngestResult, QueryOptions, RecordView};
use annotator::store::RecordStore;
use annotator::Config;
use tempfile::TempDir;

/// An initialized annotator home in a temp dir
pub struct TestHome {
    pub config: Config,
    pub db: RecordStore,
    _dir: TempDir,
}

impl TestHome {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let config = cmd_init(Some(dir.path().to_path_buf()), false).await.unwrap();
        let db = RecordStore::new(&config.paths.db_file).await.unwrap();
        Self {
            config,
            db,
            _dir: dir,
        }
    }

    pub async fn ingest(&self, content: &str, name: &str, annotation_type: &str) -> IngestResult {
        cmd_ingest(&self.config, &self.db, content.as_bytes(), name, annotation_type)
            .await
            .unwrap()
    }

    /// Every active record of a file in line order
    pub async fn all_records(&self, filename: &str) -> Vec<RecordView> {
        cmd_query_records(
            &self.config,
            &self.db,
            filename,
            QueryOptions {
                per_page: Some(self.config.query.max_per_page),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .data
    }
}

/// JSONL with `n` records whose fields are suffixed by their line number
pub fn numbered_dataset(n: usize) -> String {
    (1..=n)
        .map(|i| {
            format!(
                "{{\"system\":\"system {i}\",\"query\":\"query {i}\",\"response\":\"response {i}\"}}\n"
            )
        })
        .collect()
}
