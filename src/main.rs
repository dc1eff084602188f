//! annotator CLI entry point

use annotator::{
    commands::{
        cmd_annotate, cmd_delete_file, cmd_export, cmd_file_info, cmd_ingest_path, cmd_init,
        cmd_list_files, cmd_query_records, cmd_stats, cmd_update_record, parse_updates,
        print_annotation, print_delete_outcome, print_export_result, print_file_info, print_files,
        print_ingest_result, print_records, print_stats, print_updated_record, QueryOptions,
    },
    config::Config,
    error::{Error, Result},
    progress::PinnedLogWriter,
    store::{AnnotationStatus, RecordStore},
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "annotator")]
#[command(version, about = "Upload, annotate and export JSONL datasets", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "ANNOTATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the configuration, content areas and database
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Upload a JSONL file
    Ingest {
        /// Path to the JSONL file
        path: PathBuf,

        /// Annotation type of the dataset (qa or scoring)
        #[arg(short = 't', long = "type", default_value = "qa")]
        annotation_type: String,

        /// Name to record instead of the file's own name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// List uploaded files
    Files,

    /// Show one uploaded file
    Info {
        /// Stored filename (see 'annotator files')
        filename: String,
    },

    /// Page through a file's records
    Records {
        /// Stored filename
        filename: String,

        /// Case-insensitive text to look for in system, query or response
        #[arg(short, long)]
        search: Option<String>,

        /// all, annotated or not_annotated
        #[arg(long, default_value = "all")]
        status: String,

        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: u32,

        /// Records per page
        #[arg(long)]
        per_page: Option<u32>,
    },

    /// Label one record
    Annotate {
        /// Record unique id (see 'annotator records')
        unique_id: String,

        /// Annotation value, e.g. correct, incorrect or a score
        result: String,
    },

    /// Edit fields of the record at a line
    Update {
        /// Stored filename
        filename: String,

        /// 1-based line number in the uploaded file
        line_number: i64,

        /// JSON object of field updates, e.g. '{"response": "..."}'
        updates: String,
    },

    /// Show annotation statistics for a file
    Stats {
        /// Stored filename
        filename: String,
    },

    /// Export correct or incorrect records to the output area
    Export {
        /// Stored filename
        filename: String,

        /// correct or incorrect
        #[arg(short = 't', long = "type", default_value = "correct")]
        export_type: String,

        /// Artifact name inside the output area
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Delete an uploaded file and its records
    Delete {
        /// Stored filename
        filename: String,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(PinnedLogWriter))
        .with(filter)
        .init();

    if let Commands::Init { force } = cli.command {
        return handle_init(cli.config.as_deref(), force).await;
    }

    let config = load_config(cli.config.as_deref())?;
    let db = RecordStore::new(&config.paths.db_file)
        .await
        .with_context(|| format!("opening database {}", config.paths.db_file.display()))?;

    match cli.command {
        Commands::Init { .. } => unreachable!(),

        Commands::Ingest {
            path,
            annotation_type,
            name,
        } => {
            let result = cmd_ingest_path(&config, &db, &path, name, &annotation_type).await?;
            if cli.json {
                print_json(&result)?;
            } else {
                print_ingest_result(&result);
            }
        }

        Commands::Files => {
            let list = cmd_list_files(&db).await?;
            if cli.json {
                print_json(&list)?;
            } else {
                print_files(&list);
            }
        }

        Commands::Info { filename } => {
            let info = cmd_file_info(&db, &filename).await?;
            if cli.json {
                print_json(&info)?;
            } else {
                print_file_info(&info);
            }
        }

        Commands::Records {
            filename,
            search,
            status,
            page,
            per_page,
        } => {
            let options = QueryOptions {
                search,
                annotation_status: status.parse::<AnnotationStatus>()?,
                page: Some(page),
                per_page,
            };
            let records = cmd_query_records(&config, &db, &filename, options).await?;
            if cli.json {
                print_json(&records)?;
            } else {
                print_records(&filename, &records);
            }
        }

        Commands::Annotate { unique_id, result } => {
            let outcome = cmd_annotate(&db, &unique_id, &result).await?;
            if cli.json {
                print_json(&outcome)?;
            } else {
                print_annotation(&outcome);
            }
        }

        Commands::Update {
            filename,
            line_number,
            updates,
        } => {
            let updates = parse_updates(&updates)?;
            let record = cmd_update_record(&db, &filename, line_number, &updates).await?;
            if cli.json {
                print_json(&record)?;
            } else {
                print_updated_record(&record);
            }
        }

        Commands::Stats { filename } => {
            let stats = cmd_stats(&config, &db, &filename).await?;
            if cli.json {
                print_json(&stats)?;
            } else {
                print_stats(&stats);
            }
        }

        Commands::Export {
            filename,
            export_type,
            output,
        } => {
            let result =
                cmd_export(&config, &db, &filename, output.as_deref(), &export_type).await?;
            if cli.json {
                print_json(&result)?;
            } else {
                print_export_result(&result);
            }
        }

        Commands::Delete { filename } => {
            let outcome = cmd_delete_file(&config, &db, &filename).await?;
            if cli.json {
                print_json(&outcome)?;
            } else {
                print_delete_outcome(&outcome);
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// A `--config` path names either the TOML file or the directory holding it
fn split_config_path(path: &Path) -> (PathBuf, PathBuf) {
    if path.extension().is_some_and(|e| e == "toml") {
        let base = path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(Config::default_base_dir);
        (base, path.to_path_buf())
    } else {
        (path.to_path_buf(), path.join("config.toml"))
    }
}

async fn handle_init(config_path: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let base_dir = config_path.map(|p| split_config_path(p).0);
    let config = cmd_init(base_dir, force)
        .await
        .context("initializing annotator")?;

    println!("✓ annotator initialized successfully");
    println!("  Config: {}", config.paths.config_file.display());
    println!("  Database: {}", config.paths.db_file.display());
    println!("  Uploads: {}", config.paths.uploads_dir.display());
    println!("  Exports: {}", config.paths.output_dir.display());
    println!("\nNext steps:");
    println!("  1. Upload a dataset: annotator ingest data.jsonl --type qa");
    println!("  2. Browse it: annotator records <stored filename>");

    Ok(())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        if !Config::default_config_path().exists() {
            return Err(Error::NotInitialized.into());
        }
        return Config::load_default().context("loading default config");
    };

    let config_path = split_config_path(path).1;
    if !config_path.exists() {
        return Err(Error::NotInitialized.into());
    }

    Config::load(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))
}
