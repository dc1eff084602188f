//! Record query command implementation

use crate::config::Config;
use crate::error::Result;
use crate::store::{AnnotationStatus, DataRecord, RecordQuery, RecordStore};
use serde::Serialize;
use tracing::debug;

/// Record listing options
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Case-insensitive substring over system, query and response
    pub search: Option<String>,
    /// Annotation-state filter
    pub annotation_status: AnnotationStatus,
    /// 1-based page, defaults to 1
    pub page: Option<u32>,
    /// Page size, clamped to the configured maximum
    pub per_page: Option<u32>,
}

/// A record as handed to the annotation UI
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordView {
    pub id: i64,
    pub unique_id: String,
    pub line_number: i64,
    pub system: Option<String>,
    pub query: Option<String>,
    pub response: Option<String>,
    pub annotation_result: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub selected: bool,
}

impl From<DataRecord> for RecordView {
    fn from(record: DataRecord) -> Self {
        Self {
            id: record.id,
            unique_id: record.unique_id,
            line_number: record.line_number,
            system: record.system,
            query: record.query,
            response: record.response,
            annotation_result: record.annotation_result,
            created_at: record.created_at,
            updated_at: record.updated_at,
            selected: false,
        }
    }
}

/// One page of a file's records
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordsPage {
    pub data: Vec<RecordView>,
    pub total_count: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: i64,
}

/// Number of pages needed for `total` rows
pub fn total_pages(total: i64, per_page: u32) -> i64 {
    let per_page = i64::from(per_page.max(1));
    (total.max(0) + per_page - 1) / per_page
}

/// List a page of the active records of `filename`
pub async fn cmd_query_records(
    config: &Config,
    db: &RecordStore,
    filename: &str,
    options: QueryOptions,
) -> Result<RecordsPage> {
    let file = db.require_active_file(filename).await?;

    let query = RecordQuery {
        search: options.search.filter(|s| !s.is_empty()),
        annotation_status: options.annotation_status,
        page: options.page.unwrap_or(1).max(1),
        per_page: config.clamp_per_page(options.per_page),
    };

    let page = db.query_records(file.id, &query).await?;
    debug!(
        filename = %filename,
        page = query.page,
        returned = page.records.len(),
        total = page.total_count,
        "Queried records"
    );

    Ok(RecordsPage {
        total_pages: total_pages(page.total_count, query.per_page),
        data: page.records.into_iter().map(RecordView::from).collect(),
        total_count: page.total_count,
        page: query.page,
        per_page: query.per_page,
    })
}

fn preview(text: Option<&str>, width: usize) -> String {
    let text = text.unwrap_or("").replace('\n', " ");
    if text.chars().count() > width {
        let cut: String = text.chars().take(width).collect();
        format!("{}...", cut.trim_end())
    } else {
        text
    }
}

/// Print a page of records to console
pub fn print_records(filename: &str, page: &RecordsPage) {
    println!(
        "\n📄 {} (page {}/{}, {} matching records)\n",
        filename,
        page.page,
        page.total_pages.max(1),
        page.total_count
    );

    if page.data.is_empty() {
        println!("No records on this page.");
        return;
    }

    for record in &page.data {
        let label = record.annotation_result.as_deref().unwrap_or("-");
        println!("{:>5}  [{}]  {}", record.line_number, label, record.unique_id);
        println!("       Q: {}", preview(record.query.as_deref(), 100));
        println!("       R: {}\n", preview(record.response.as_deref(), 100));
    }
}
