use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::AppError;

pub const SUPPORT_DIR_ENV: &str = "IQU_SUPPORT_DIR";
pub const BACKUP_WINDOW: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct Config {
    pub support_dir: PathBuf,
    pub backup_window: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let dir = std::env::var_os(SUPPORT_DIR_ENV)
            .filter(|dir| !dir.is_empty())
            .ok_or_else(|| AppError::Config(format!("{SUPPORT_DIR_ENV} must be set")))?;
        Config::with_support_dir(dir)
    }

    /// Uses `dir` as the support directory, creating it when missing.
    pub fn with_support_dir(dir: impl Into<PathBuf>) -> Result<Self, AppError> {
        let support_dir = dir.into();
        std::fs::create_dir_all(&support_dir)?;
        Ok(Config {
            support_dir,
            backup_window: BACKUP_WINDOW,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.support_dir.join("iqu.db")
    }

    pub fn backup_dir(&self) -> &Path {
        &self.support_dir
    }
}
