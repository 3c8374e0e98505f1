use std::path::PathBuf;

use crate::error::{StudioError, StudioResult};
use crate::scanner::ScannerConfig;
use crate::storage::FileStore;

/// 5 MiB, the usual per-origin budget for browser local storage.
pub const DEFAULT_QUOTA: u64 = 5 * 1024 * 1024;

pub const APP_DIR: &str = "qrism-studio";

#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub quota: u64,
    pub scanner: ScannerConfig,
}

impl Config {
    /// Config rooted at the platform data directory.
    pub fn new() -> StudioResult<Self> {
        Ok(Self::with_data_dir(default_data_dir()?))
    }

    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into(), quota: DEFAULT_QUOTA, scanner: ScannerConfig::default() }
    }

    pub fn open_store(&self) -> StudioResult<FileStore> {
        FileStore::open(self.data_dir.clone(), self.quota)
    }
}

pub fn default_data_dir() -> StudioResult<PathBuf> {
    Ok(dirs::data_dir().ok_or(StudioError::NoDataDir)?.join(APP_DIR))
}
