//! JSON file token store
//!
//! Writes go to a temporary file in the target directory which is then
//! renamed over the target, so a reader never observes a partial record.
//! `tempfile` creates the file with mode 0600 on Unix.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::debug;

use super::traits::TokenCache;
use super::types::TokenRecord;

/// Token cache failure
#[derive(Debug, thiserror::Error)]
pub enum TokenCacheError {
    #[error("token cache I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("token cache is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// [`TokenCache`] backed by a single JSON file
#[derive(Debug, Clone)]
pub struct FileTokenCache {
    path: PathBuf,
}

impl FileTokenCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), TokenCacheError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut file = NamedTempFile::new_in(&dir)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| TokenCacheError::Io(e.error))?;
    Ok(())
}

#[async_trait]
impl TokenCache for FileTokenCache {
    async fn load(&self) -> Result<Option<TokenRecord>, TokenCacheError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let record = serde_json::from_str(&contents)?;
        Ok(Some(record))
    }

    async fn save(&self, record: &TokenRecord) -> Result<(), TokenCacheError> {
        let contents = serde_json::to_vec_pretty(record)?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomically(&path, &contents))
            .await
            .map_err(|e| TokenCacheError::Io(io::Error::other(e.to_string())))??;

        debug!(path = %self.path.display(), "token cache saved");
        Ok(())
    }

    async fn clear(&self) -> Result<(), TokenCacheError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "token cache cleared");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
