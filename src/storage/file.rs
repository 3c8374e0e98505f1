use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{quota::StorageEstimate, validate_key, KeyValueStore};
use crate::error::StudioResult;

const EXT: &str = "json";

// File store
//------------------------------------------------------------------------------

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
    quota: u64,
}

impl FileStore {
    /// Opens the store, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>, quota: u64) -> StudioResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        tracing::debug!(dir = %dir.display(), quota, "Opened file store");
        Ok(Self { dir, quota })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> StudioResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{EXT}")))
    }

    fn entries(&self) -> StudioResult<Vec<(String, PathBuf)>> {
        let mut res = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(EXT) {
                continue;
            }
            if let Some(key) = path.file_stem().and_then(|s| s.to_str()) {
                if validate_key(key).is_ok() {
                    res.push((key.to_string(), path.clone()));
                }
            }
        }
        res.sort();
        Ok(res)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StudioResult<Option<String>> {
        match fs::read_to_string(self.path(key)?) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> StudioResult<()> {
        let path = self.path(key)?;

        // Write-then-rename keeps the previous document intact on failure
        let tmp = path.with_extension(format!("{EXT}.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        tracing::trace!(key, bytes = value.len(), "Wrote key");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StudioResult<()> {
        match fs::remove_file(self.path(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> StudioResult<Vec<String>> {
        Ok(self.entries()?.into_iter().map(|(k, _)| k).collect())
    }

    fn estimate(&self) -> StudioResult<Option<StorageEstimate>> {
        let mut used = 0;
        for (_, path) in self.entries()? {
            used += fs::metadata(path)?.len();
        }
        Ok(Some(StorageEstimate::new(used, self.quota)))
    }
}
