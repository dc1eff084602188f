//! Error types for annotator

use thiserror::Error;

/// Main error type for annotator operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Line {line_number} not found in {filename}")]
    LineNotFound { filename: String, line_number: i64 },

    #[error("Not initialized: run 'annotator init' first")]
    NotInitialized,

    #[error("Already initialized at {0}")]
    AlreadyInitialized(String),
}

impl Error {
    /// True for the "unknown filename / unique_id / line" family
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::FileNotFound(_) | Error::RecordNotFound(_) | Error::LineNotFound { .. }
        )
    }

    /// True for errors raised before any state change because the input was rejected
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

/// Result type alias for annotator
pub type Result<T> = std::result::Result<T, Error>;
