//! Data directory layout
//!
//! Everything the store persists lives under one directory:
//!
//! ```text
//! <data_dir>/
//!   sqlite/statline.db      identities, values, reports (+ -wal / -shm)
//! ```
//!
//! `$STATLINE_DATA_DIR` overrides the platform default
//! (`~/.local/share/statline`, `~/Library/Application Support/Statline`,
//! `%APPDATA%\Statline`).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;

use super::config::AppConfig;
use super::constants::{APP_DOT_FOLDER, APP_NAME, ENV_DATA_DIR, SQLITE_DB_FILENAME};
use crate::utils::file::expand_path;

const SQLITE_DIR: &str = "sqlite";

#[derive(Debug, Clone)]
pub struct AppStorage {
    data_dir: PathBuf,
    database_path: PathBuf,
}

impl AppStorage {
    pub async fn init(config: &AppConfig) -> Result<Self> {
        let storage = Self::at(Self::resolve_data_dir()).await?;
        if config.debug {
            tracing::warn!(data_dir = %storage.data_dir.display(), "Debug mode enabled");
        }
        Ok(storage)
    }

    /// Lay out storage under `data_dir`, creating missing directories
    pub async fn at(data_dir: PathBuf) -> Result<Self> {
        let sqlite_dir = data_dir.join(SQLITE_DIR);
        tokio::fs::create_dir_all(&sqlite_dir)
            .await
            .with_context(|| format!("Failed to create data directory: {}", sqlite_dir.display()))?;

        // canonicalize needs the path to exist
        let data_dir = data_dir.canonicalize().unwrap_or(data_dir);
        let database_path = data_dir.join(SQLITE_DIR).join(SQLITE_DB_FILENAME);

        tracing::debug!(
            data_dir = %data_dir.display(),
            database = %database_path.display(),
            "Storage initialized"
        );
        Ok(Self {
            data_dir,
            database_path,
        })
    }

    /// Data directory from `$STATLINE_DATA_DIR`, the platform default, or
    /// `./.statline` as a last resort
    pub fn resolve_data_dir() -> PathBuf {
        Self::resolve_data_dir_from(std::env::var(ENV_DATA_DIR).ok().as_deref())
    }

    fn resolve_data_dir_from(override_dir: Option<&str>) -> PathBuf {
        if let Some(dir) = override_dir.filter(|d| !d.trim().is_empty()) {
            return expand_path(dir);
        }
        if let Some(proj_dirs) = ProjectDirs::from("", "", APP_NAME) {
            return proj_dirs.data_dir().to_path_buf();
        }
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(APP_DOT_FOLDER)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }
}
