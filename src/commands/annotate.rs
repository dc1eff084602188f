//! Annotate command implementation

use crate::error::{Error, Result};
use crate::store::RecordStore;
use serde::Serialize;
use tracing::info;

/// Confirmation of a stored annotation
#[derive(Debug, Clone, Serialize)]
pub struct AnnotationOutcome {
    pub unique_id: String,
    pub annotation_result: String,
    pub success: bool,
}

/// Label the active record identified by `unique_id`.
///
/// The value is stored as given; it is not checked against the file's
/// annotation type.
pub async fn cmd_annotate(
    db: &RecordStore,
    unique_id: &str,
    annotation_result: &str,
) -> Result<AnnotationOutcome> {
    if !db.update_annotation(unique_id, annotation_result).await? {
        return Err(Error::RecordNotFound(unique_id.to_string()));
    }

    info!(unique_id = %unique_id, result = %annotation_result, "Annotated record");

    Ok(AnnotationOutcome {
        unique_id: unique_id.to_string(),
        annotation_result: annotation_result.to_string(),
        success: true,
    })
}

pub fn print_annotation(outcome: &AnnotationOutcome) {
    println!(
        "✓ {} annotated as '{}'",
        outcome.unique_id, outcome.annotation_result
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::test_env;
    use crate::commands::{cmd_ingest, cmd_query_records, QueryOptions};

    #[tokio::test]
    async fn test_annotate_touches_only_target() {
        let (config, db, _tmp) = test_env().await;
        let ingested = cmd_ingest(
            &config,
            &db,
            b"{\"query\":\"a\"}\n{\"query\":\"b\"}\n",
            "a.jsonl",
            "qa",
        )
        .await
        .unwrap();

        let before = cmd_query_records(&config, &db, &ingested.filename, QueryOptions::default())
            .await
            .unwrap();
        let target = &before.data[0];

        let outcome = cmd_annotate(&db, &target.unique_id, "incorrect")
            .await
            .unwrap();
        assert!(outcome.success);

        let after = cmd_query_records(&config, &db, &ingested.filename, QueryOptions::default())
            .await
            .unwrap();
        assert_eq!(after.data[0].annotation_result.as_deref(), Some("incorrect"));
        assert_eq!(after.data[1], before.data[1]);
    }

    #[tokio::test]
    async fn test_annotate_unknown_id() {
        let (_config, db, _tmp) = test_env().await;
        let err = cmd_annotate(&db, "nonexistent", "correct").await.unwrap_err();
        assert!(matches!(err, Error::RecordNotFound(_)));
    }
}
