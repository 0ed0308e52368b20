// Cache store for the record list shared between build phases.
// Handles JSON serialization and atomic filesystem writes.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use super::paths;
use crate::error::{Error, Result};

/// Handle to one cache artifact: a UTF-8 file holding a JSON array of records.
///
/// The same handle (or one pointing at the same path) must be used for both
/// path enumeration and props computation. Nothing synchronizes two writers
/// on the same location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    /// Use an explicit artifact path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Use `<cache dir>/<name>.json`, see [`paths::cache_dir`].
    pub fn named(name: &str) -> Result<Self> {
        paths::artifact_path(name)
            .map(Self::at)
            .ok_or(Error::NoCacheDir)
    }

    /// Use `<dir>/<name>.json`.
    pub fn in_dir(dir: impl AsRef<Path>, name: &str) -> Self {
        Self::at(dir.as_ref().join(paths::artifact_file_name(name)))
    }

    /// Location of the artifact.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the artifact with `records`.
    pub async fn write_records<T: Serialize>(&self, records: &[T]) -> Result<()> {
        let json = serde_json::to_string(records)?;
        self.write_text(&json).await
    }

    /// Read every record from the artifact.
    ///
    /// A missing artifact is an error, never an empty list.
    pub async fn read_records<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let contents = self.read_text().await?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Check if the artifact exists.
    pub async fn exists(&self) -> bool {
        fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Delete the artifact if present.
    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_text(&self, text: &str) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        // Write atomically via temp file
        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(text.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(&temp_path, &self.path).await?;

        Ok(())
    }

    async fn read_text(&self) -> Result<String> {
        match fs::read_to_string(&self.path).await {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(Error::CacheMissing(self.path.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}
