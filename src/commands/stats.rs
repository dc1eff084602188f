//! Annotation statistics command implementation

use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::{AnnotationType, FileRow, RecordStore, Verdict};
use serde::Serialize;
use tracing::debug;

/// The three annotation buckets
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AnnotationDistribution {
    pub correct: i64,
    pub incorrect: i64,
    pub unannotated: i64,
}

/// Annotation counts over a file's active records
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotationStats {
    pub filename: String,
    pub annotation_type: AnnotationType,
    pub total_count: i64,
    pub correct_count: i64,
    pub incorrect_count: i64,
    pub unannotated_count: i64,
    pub annotation_distribution: AnnotationDistribution,
}

/// Bucket grouped annotation values.
///
/// `histogram` pairs each distinct value (NULL included) with its row count.
/// Values the annotation type cannot classify land in `unannotated`, which is
/// always `total - correct - incorrect`.
pub fn tally(
    annotation_type: AnnotationType,
    threshold: f64,
    histogram: &[(Option<String>, i64)],
) -> AnnotationDistribution {
    let mut dist = AnnotationDistribution::default();
    let mut total = 0;

    for (value, count) in histogram {
        total += count;
        let verdict = value
            .as_deref()
            .and_then(|v| annotation_type.classify(v, threshold));
        match verdict {
            Some(Verdict::Correct) => dist.correct += count,
            Some(Verdict::Incorrect) => dist.incorrect += count,
            None => {}
        }
    }

    dist.unannotated = total - dist.correct - dist.incorrect;
    dist
}

/// Statistics for an already resolved file
pub async fn file_stats(config: &Config, db: &RecordStore, file: &FileRow) -> Result<AnnotationStats> {
    let annotation_type = file.annotation_type();
    let histogram = db.annotation_histogram(file.id).await?;
    let dist = tally(annotation_type, config.stats.score_threshold, &histogram);
    let total_count = dist.correct + dist.incorrect + dist.unannotated;

    debug!(
        filename = %file.filename,
        total = total_count,
        correct = dist.correct,
        incorrect = dist.incorrect,
        "Computed annotation stats"
    );

    Ok(AnnotationStats {
        filename: file.filename.clone(),
        annotation_type,
        total_count,
        correct_count: dist.correct,
        incorrect_count: dist.incorrect,
        unannotated_count: dist.unannotated,
        annotation_distribution: dist,
    })
}

/// Statistics by file id; deleted or unknown files are not found
pub async fn cmd_stats_by_id(config: &Config, db: &RecordStore, file_id: i64) -> Result<AnnotationStats> {
    let file = db
        .get_file(file_id)
        .await?
        .filter(|f| f.is_active())
        .ok_or_else(|| Error::FileNotFound(format!("id {}", file_id)))?;
    file_stats(config, db, &file).await
}

/// Statistics by stored filename
pub async fn cmd_stats(config: &Config, db: &RecordStore, filename: &str) -> Result<AnnotationStats> {
    let file = db.require_active_file(filename).await?;
    file_stats(config, db, &file).await
}

/// Print statistics to console
pub fn print_stats(stats: &AnnotationStats) {
    let pct = |n: i64| {
        if stats.total_count == 0 {
            0.0
        } else {
            n as f64 * 100.0 / stats.total_count as f64
        }
    };

    println!("\n📊 {} ({})\n", stats.filename, stats.annotation_type);
    println!("Total records: {}", stats.total_count);
    println!(
        "  Correct:     {:>6} ({:.1}%)",
        stats.correct_count,
        pct(stats.correct_count)
    );
    println!(
        "  Incorrect:   {:>6} ({:.1}%)",
        stats.incorrect_count,
        pct(stats.incorrect_count)
    );
    println!(
        "  Unannotated: {:>6} ({:.1}%)",
        stats.unannotated_count,
        pct(stats.unannotated_count)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::test_env;
    use crate::commands::{cmd_annotate, cmd_ingest, cmd_query_records, QueryOptions};

    fn histogram(values: &[Option<&str>]) -> Vec<(Option<String>, i64)> {
        values
            .iter()
            .map(|v| (v.map(String::from), 1))
            .collect()
    }

    #[test]
    fn test_tally_scoring_threshold() {
        let dist = tally(
            AnnotationType::Scoring,
            4.0,
            &histogram(&[Some("3.9"), Some("4.0"), Some("bad"), None]),
        );
        assert_eq!(
            dist,
            AnnotationDistribution {
                correct: 1,
                incorrect: 1,
                unannotated: 2,
            }
        );
    }

    #[test]
    fn test_tally_qa_exact_values() {
        let dist = tally(
            AnnotationType::Qa,
            4.0,
            &[
                (Some("correct".to_string()), 3),
                (Some("incorrect".to_string()), 2),
                (Some("5".to_string()), 1),
                (Some("CORRECT".to_string()), 1),
                (None, 4),
            ],
        );
        assert_eq!(dist.correct, 3);
        assert_eq!(dist.incorrect, 2);
        assert_eq!(dist.unannotated, 6);
    }

    #[tokio::test]
    async fn test_stats_for_ingested_file() {
        let (config, db, _tmp) = test_env().await;
        let ingested = cmd_ingest(
            &config,
            &db,
            b"{\"query\":\"a\"}\n{\"query\":\"b\"}\n{\"query\":\"c\"}\n",
            "s.jsonl",
            "scoring",
        )
        .await
        .unwrap();
        let page = cmd_query_records(&config, &db, &ingested.filename, QueryOptions::default())
            .await
            .unwrap();
        cmd_annotate(&db, &page.data[0].unique_id, "5").await.unwrap();
        cmd_annotate(&db, &page.data[1].unique_id, "2").await.unwrap();

        let stats = cmd_stats(&config, &db, &ingested.filename).await.unwrap();
        assert_eq!(stats.annotation_type, AnnotationType::Scoring);
        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.correct_count, 1);
        assert_eq!(stats.incorrect_count, 1);
        assert_eq!(stats.unannotated_count, 1);

        let file = db.require_active_file(&ingested.filename).await.unwrap();
        let by_id = cmd_stats_by_id(&config, &db, file.id).await.unwrap();
        assert_eq!(by_id, stats);
        assert!(cmd_stats_by_id(&config, &db, file.id + 100)
            .await
            .unwrap_err()
            .is_not_found());
    }
}
