//! Configuration management for annotator
//!
//! Handles loading, saving, and validating configuration from TOML files.
//! A `Config` is built once at startup and handed to every command by reference.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Content and output areas
    #[serde(default)]
    pub storage: StorageConfig,

    /// Upload acceptance rules
    #[serde(default)]
    pub ingest: IngestConfig,

    /// Pagination settings
    #[serde(default)]
    pub query: QueryConfig,

    /// Annotation statistics
    #[serde(default)]
    pub stats: StatsConfig,

    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// Where uploads and exports live on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Uploaded files, relative to the base directory unless absolute
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: String,

    /// Exported files, relative to the base directory unless absolute
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Accepted file extensions (case-insensitive, without the dot)
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Page size used when the caller does not give one
    #[serde(default = "default_per_page")]
    pub default_per_page: u32,

    /// Requested page sizes are clamped to this value
    #[serde(default = "default_max_per_page")]
    pub max_per_page: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Threshold separating good from bad scores on `scoring` files
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Artifact name used when the caller does not give one
    #[serde(default = "default_export_name")]
    pub default_name: String,
}

/// Internal paths configuration
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    /// Base directory for annotator data
    pub base_dir: PathBuf,

    /// Path to config file
    pub config_file: PathBuf,

    /// Path to SQLite database
    pub db_file: PathBuf,

    /// Resolved content area
    pub uploads_dir: PathBuf,

    /// Resolved output area
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            ingest: IngestConfig::default(),
            query: QueryConfig::default(),
            stats: StatsConfig::default(),
            export: ExportConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            uploads_dir: default_uploads_dir(),
            output_dir: default_output_dir(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
        }
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_per_page: default_per_page(),
            max_per_page: default_max_per_page(),
        }
    }
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            score_threshold: default_score_threshold(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            default_name: default_export_name(),
        }
    }
}

impl Config {
    /// Get the default base directory for annotator (~/.annotator)
    pub fn default_base_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".annotator")
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        Self::default_base_dir().join("config.toml")
    }

    /// Resolve internal paths against a base directory
    pub fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(Self::default_base_dir);
        self.paths = self.resolve_paths(&base, base.join("config.toml"));
    }

    fn resolve_paths(&self, base: &Path, config_file: PathBuf) -> PathsConfig {
        PathsConfig {
            config_file,
            db_file: base.join(default_db_file_name()),
            uploads_dir: base.join(&self.storage.uploads_dir),
            output_dir: base.join(&self.storage.output_dir),
            base_dir: base.to_path_buf(),
        }
    }

    /// Load configuration from a specific file path
    pub fn load(config_path: &Path) -> Result<Self> {
        debug!("Loading config from {:?}", config_path);

        if !config_path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                config_path.display()
            )));
        }

        let content = std::fs::read_to_string(config_path)?;
        let mut config: Config = toml::from_str(&content)?;

        let base = config_path.parent().unwrap_or(Path::new(".")).to_path_buf();
        config.paths = config.resolve_paths(&base, config_path.to_path_buf());

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from default location
    pub fn load_default() -> Result<Self> {
        Self::load(&Self::default_config_path())
    }

    /// Load configuration from a base directory, falling back to defaults
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = loaded.resolve_paths(&config.paths.base_dir, config.paths.config_file.clone());
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Check if annotator is initialized (config and DB exist)
    pub fn is_initialized(&self) -> bool {
        self.paths.config_file.exists() && self.paths.db_file.exists()
    }

    /// Clamp a requested page size into `[1, max_per_page]`
    pub fn clamp_per_page(&self, per_page: Option<u32>) -> u32 {
        per_page
            .unwrap_or(self.query.default_per_page)
            .clamp(1, self.query.max_per_page)
    }

    /// Whether an uploaded name carries an accepted extension
    pub fn is_allowed_file(&self, filename: &str) -> bool {
        match filename.rsplit_once('.') {
            Some((_, ext)) => self
                .ingest
                .allowed_extensions
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext)),
            None => false,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.ingest.allowed_extensions.is_empty() {
            return Err(Error::Config(
                "ingest.allowed_extensions must not be empty".to_string(),
            ));
        }

        if self.query.max_per_page == 0 || self.query.max_per_page > PER_PAGE_LIMIT {
            return Err(Error::Config(format!(
                "query.max_per_page must be between 1 and {}",
                PER_PAGE_LIMIT
            )));
        }

        if self.query.default_per_page == 0 || self.query.default_per_page > self.query.max_per_page
        {
            return Err(Error::Config(
                "query.default_per_page must be between 1 and query.max_per_page".to_string(),
            ));
        }

        if !self.stats.score_threshold.is_finite() {
            return Err(Error::Config(
                "stats.score_threshold must be a finite number".to_string(),
            ));
        }

        if self.export.default_name.trim().is_empty() {
            return Err(Error::Config(
                "export.default_name must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
