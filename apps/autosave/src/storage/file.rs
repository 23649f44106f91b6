use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::debug;

use super::{SlotStorage, StorageError};

/// One JSON file per slot inside a data directory.
///
/// Writes go to a temp file in the same directory and are renamed into
/// place, so readers only ever observe a complete blob.
#[derive(Debug, Clone)]
pub struct FileSlotStorage {
    dir: PathBuf,
    quota_bytes: usize,
}

impl FileSlotStorage {
    pub fn new(dir: impl Into<PathBuf>, quota_bytes: usize) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| StorageError::Io {
            slot: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir, quota_bytes })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{slot}.json"))
    }
}

#[async_trait]
impl SlotStorage for FileSlotStorage {
    async fn load(&self, slot: &str) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(self.slot_path(slot)).await {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io {
                slot: slot.to_string(),
                source,
            }),
        }
    }

    async fn save(&self, slot: &str, blob: &str) -> Result<(), StorageError> {
        if blob.len() > self.quota_bytes {
            return Err(StorageError::QuotaExceeded {
                slot: slot.to_string(),
                size: blob.len(),
                limit: self.quota_bytes,
            });
        }

        let dir = self.dir.clone();
        let path = self.slot_path(slot);
        let bytes = blob.as_bytes().to_vec();
        let slot_name = slot.to_string();

        tokio::task::spawn_blocking(move || -> Result<(), std::io::Error> {
            let mut tmp = NamedTempFile::new_in(&dir)?;
            tmp.write_all(&bytes)?;
            tmp.as_file().sync_all()?;
            tmp.persist(&path).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| StorageError::Unavailable(format!("write task failed: {e}")))?
        .map_err(|source| StorageError::Io {
            slot: slot_name,
            source,
        })?;

        debug!("Wrote {} bytes to slot '{slot}'", blob.len());
        Ok(())
    }
}
