//! Operations exposed to the outer surface (CLI)

pub mod annotate;
pub mod export;
pub mod files;
pub mod ingest;
pub mod init;
pub mod query;
pub mod stats;
pub mod update;

pub use annotate::*;
pub use export::*;
pub use files::*;
pub use ingest::*;
pub use init::*;
pub use query::*;
pub use stats::*;
pub use update::*;
