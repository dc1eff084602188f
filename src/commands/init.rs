//! Init command implementation

use crate::config::Config;
use crate::content::ContentArea;
use crate::error::{Error, Result};
use crate::store::RecordStore;
use std::path::PathBuf;
use tracing::info;

/// Create the config file, content/output areas and database under `base_dir`
pub async fn cmd_init(base_dir: Option<PathBuf>, force: bool) -> Result<Config> {
    let mut config = Config::default();
    config.init_paths(base_dir);

    if config.paths.config_file.exists() && !force {
        return Err(Error::AlreadyInitialized(
            config.paths.base_dir.display().to_string(),
        ));
    }

    std::fs::create_dir_all(&config.paths.base_dir)?;

    config.validate()?;
    config.save()?;
    info!("Created config at {:?}", config.paths.config_file);

    ContentArea::new(&config).ensure_dirs().await?;

    let db = RecordStore::connect(&config).await?;
    db.init_schema().await?;
    info!("Created database at {:?}", config.paths.db_file);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_creates_layout() {
        let tmp = TempDir::new().unwrap();
        let config = cmd_init(Some(tmp.path().to_path_buf()), false).await.unwrap();

        assert!(config.is_initialized());
        assert!(config.paths.uploads_dir.is_dir());
        assert!(config.paths.output_dir.is_dir());

        let again = cmd_init(Some(tmp.path().to_path_buf()), false).await;
        assert!(matches!(again, Err(Error::AlreadyInitialized(_))));

        assert!(cmd_init(Some(tmp.path().to_path_buf()), true).await.is_ok());
    }
}
