//! Export command implementation

use crate::config::Config;
use crate::content::ContentArea;
use crate::error::Result;
use crate::parse::to_jsonl;
use crate::store::{DataRecord, RecordStore, Verdict};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

/// The projection written for every exported record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportLine {
    pub system: String,
    pub query: String,
    pub response: String,
}

impl From<&DataRecord> for ExportLine {
    fn from(record: &DataRecord) -> Self {
        Self {
            system: record.system.clone().unwrap_or_default(),
            query: record.query.clone().unwrap_or_default(),
            response: record.response.clone().unwrap_or_default(),
        }
    }
}

/// Where an export landed
#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub export_path: PathBuf,
    pub export_count: usize,
    pub export_type: Verdict,
}

/// Write the active records of `filename` whose annotation falls in
/// `export_type` to the output area as JSONL, in line order.
///
/// `qa` files match `correct` / `incorrect` literally; `scoring` files compare
/// the numeric annotation against the configured threshold.
pub async fn cmd_export(
    config: &Config,
    db: &RecordStore,
    filename: &str,
    export_name: Option<&str>,
    export_type: &str,
) -> Result<ExportResult> {
    let wanted: Verdict = export_type.parse()?;
    let area = ContentArea::new(config);
    let export_name = export_name.unwrap_or(config.export.default_name.as_str());
    area.export_path(export_name)?;

    let file = db.require_active_file(filename).await?;
    let annotation_type = file.annotation_type();
    let threshold = config.stats.score_threshold;

    let lines: Vec<ExportLine> = db
        .annotated_records(file.id)
        .await?
        .iter()
        .filter(|r| {
            r.annotation_result
                .as_deref()
                .and_then(|v| annotation_type.classify(v, threshold))
                == Some(wanted)
        })
        .map(ExportLine::from)
        .collect();

    let export_path = area.write_export(export_name, &to_jsonl(&lines)?).await?;

    info!(
        filename = %filename,
        export_type = %wanted,
        count = lines.len(),
        path = %export_path.display(),
        "Exported records"
    );

    Ok(ExportResult {
        export_path,
        export_count: lines.len(),
        export_type: wanted,
    })
}

pub fn print_export_result(result: &ExportResult) {
    println!(
        "✓ Exported {} {} records to {}",
        result.export_count,
        result.export_type,
        result.export_path.display()
    );
}
