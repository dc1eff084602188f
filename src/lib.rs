//! annotator - JSONL dataset annotation backend
//!
//! This crate provides:
//! - Ingestion of uploaded JSONL files into a SQLite record store
//! - Paginated, filterable, searchable views over a file's records
//! - Per-record annotation (`qa` correct/incorrect labels or `scoring` 1-5 ratings)
//! - Annotation statistics and export of the annotated subset back to JSONL

pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod parse;
pub mod progress;
pub mod store;

pub use config::Config;
pub use error::{Error, Result};
