//! Default values for configuration

/// Default directory for uploaded JSONL files (relative to the base dir)
pub fn default_uploads_dir() -> String {
    std::env::var("ANNOTATOR_UPLOADS_DIR").unwrap_or_else(|_| "uploads".to_string())
}

/// Default directory for exported JSONL files (relative to the base dir)
pub fn default_output_dir() -> String {
    std::env::var("ANNOTATOR_OUTPUT_DIR").unwrap_or_else(|_| "output".to_string())
}

/// Default database file name
pub fn default_db_file_name() -> String {
    "files.db".to_string()
}

/// Only JSONL uploads are accepted by default
pub fn default_allowed_extensions() -> Vec<String> {
    vec!["jsonl".to_string()]
}

/// Default page size
pub fn default_per_page() -> u32 {
    20
}

/// Hard ceiling on any configured page size
pub const PER_PAGE_LIMIT: u32 = 100;

/// Upper bound for the page size
pub fn default_max_per_page() -> u32 {
    PER_PAGE_LIMIT
}

/// Scores at or above this value count as `correct` for `scoring` files
pub fn default_score_threshold() -> f64 {
    4.0
}

/// Default export artifact name
pub fn default_export_name() -> String {
    "filtered_dataset.jsonl".to_string()
}
