//! The canonical persisted resume document.
//!
//! The whole document is one JSON blob in [`DOCUMENT_SLOT`]. Section writes
//! are read-modify-write over that blob, so they are funnelled through a
//! single async mutex: a write that yields inside the storage layer can never
//! interleave with another section's write and drop it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::models::resume::{Document, SectionKey};
use crate::storage::{SlotStorage, StorageError, DOCUMENT_SLOT};

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct DocumentStore {
    storage: Arc<dyn SlotStorage>,
    write_lock: Arc<Mutex<()>>,
}

impl DocumentStore {
    pub fn new(storage: Arc<dyn SlotStorage>) -> Self {
        Self {
            storage,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Loads the current document. Never fails.
    ///
    /// A missing slot yields an empty document; an unreadable or corrupt slot
    /// is logged and discarded, also yielding an empty document.
    pub async fn read(&self) -> Document {
        match self.load().await {
            Ok(doc) => doc,
            Err(e) => {
                warn!("Could not read document slot, using empty document: {e}");
                Document::default()
            }
        }
    }

    /// Like [`read`](Self::read), but a storage failure is an error rather
    /// than an empty document. Only a missing or corrupt blob recovers.
    async fn load(&self) -> Result<Document, PersistenceError> {
        let Some(blob) = self.storage.load(DOCUMENT_SLOT).await? else {
            return Ok(Document::default());
        };

        match serde_json::from_str::<Value>(&blob).map(Document::from_json) {
            Ok(Some(doc)) => Ok(doc),
            Ok(None) => {
                warn!("Document slot does not hold an object; discarding it");
                Ok(Document::default())
            }
            Err(e) => {
                warn!("Discarding corrupt document slot: {e}");
                Ok(Document::default())
            }
        }
    }

    /// Replaces one section's payload and refreshes `lastSaved`, keeping all
    /// other sections as currently persisted.
    ///
    /// Returns the new `lastSaved` stamp.
    pub async fn write_section(
        &self,
        key: SectionKey,
        payload: Value,
    ) -> Result<DateTime<Utc>, PersistenceError> {
        let _guard = self.write_lock.lock().await;

        // A failed load must abort: writing over it would drop every other section.
        let mut doc = self.load().await?;
        let saved_at = Utc::now();
        doc.sections.insert(key, payload);
        doc.last_saved = Some(saved_at);

        let blob = serde_json::to_string(&doc.to_json())?;
        self.storage.save(DOCUMENT_SLOT, &blob).await?;

        debug!("Committed section '{key}' ({} bytes)", blob.len());
        Ok(saved_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySlotStorage;
    use serde_json::json;
    use std::time::Duration;

    fn store_with(storage: MemorySlotStorage) -> (DocumentStore, Arc<MemorySlotStorage>) {
        let storage = Arc::new(storage);
        (DocumentStore::new(storage.clone()), storage)
    }

    #[tokio::test]
    async fn test_read_missing_slot_is_empty_document() {
        let (store, _) = store_with(MemorySlotStorage::new());
        let doc = store.read().await;
        assert!(doc.sections.is_empty());
        assert!(doc.last_saved.is_none());
    }

    #[tokio::test]
    async fn test_read_corrupt_slot_recovers_to_default() {
        let (store, storage) = store_with(MemorySlotStorage::new());
        storage.put_raw(DOCUMENT_SLOT, "{not json");
        assert_eq!(store.read().await, Document::default());

        storage.put_raw(DOCUMENT_SLOT, "\"a string\"");
        assert_eq!(store.read().await, Document::default());
    }

    #[tokio::test]
    async fn test_write_over_corrupt_slot_replaces_it() {
        let (store, storage) = store_with(MemorySlotStorage::new());
        storage.put_raw(DOCUMENT_SLOT, "garbage");

        store
            .write_section(SectionKey::Skills, json!({"skills": []}))
            .await
            .unwrap();

        let doc = store.read().await;
        assert_eq!(doc.section(SectionKey::Skills), Some(&json!({"skills": []})));
    }

    #[tokio::test]
    async fn test_write_section_is_read_after_write_and_stamps_last_saved() {
        let (store, _) = store_with(MemorySlotStorage::new());
        let payload = json!({"summary": "Backend engineer"});

        let saved_at = store
            .write_section(SectionKey::ProfessionalSummary, payload.clone())
            .await
            .unwrap();

        let doc = store.read().await;
        assert_eq!(doc.section(SectionKey::ProfessionalSummary), Some(&payload));
        assert_eq!(doc.last_saved, Some(saved_at));
    }

    #[tokio::test]
    async fn test_write_section_keeps_unrelated_sections() {
        let (store, _) = store_with(MemorySlotStorage::new());
        store
            .write_section(SectionKey::PersonalInfo, json!({"firstName": "Ada"}))
            .await
            .unwrap();
        store
            .write_section(SectionKey::Skills, json!({"skills": []}))
            .await
            .unwrap();

        let doc = store.read().await;
        assert_eq!(doc.sections.len(), 2);
        assert_eq!(
            doc.section(SectionKey::PersonalInfo),
            Some(&json!({"firstName": "Ada"}))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_interleaved_writes_do_not_lose_updates() {
        let (store, _) =
            store_with(MemorySlotStorage::new().with_write_delay(Duration::from_millis(50)));

        let a = store.write_section(SectionKey::Education, json!({"education": []}));
        let b = store.write_section(SectionKey::Projects, json!({"projects": []}));
        let (ra, rb) = tokio::join!(a, b);
        ra.unwrap();
        rb.unwrap();

        let doc = store.read().await;
        assert!(doc.section(SectionKey::Education).is_some());
        assert!(doc.section(SectionKey::Projects).is_some());
    }

    #[tokio::test]
    async fn test_failed_write_leaves_document_untouched() {
        let (store, storage) = store_with(MemorySlotStorage::new());
        let first = store
            .write_section(SectionKey::PersonalInfo, json!({"firstName": "Ada"}))
            .await
            .unwrap();

        storage.set_fail_writes(true);
        let err = store
            .write_section(SectionKey::PersonalInfo, json!({"firstName": "Grace"}))
            .await
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Storage(_)));

        let doc = store.read().await;
        assert_eq!(
            doc.section(SectionKey::PersonalInfo),
            Some(&json!({"firstName": "Ada"}))
        );
        assert_eq!(doc.last_saved, Some(first));
    }

    #[tokio::test]
    async fn test_failed_load_aborts_write_and_keeps_other_sections() {
        let (store, storage) = store_with(MemorySlotStorage::new());
        store
            .write_section(SectionKey::PersonalInfo, json!({"firstName": "Ada"}))
            .await
            .unwrap();

        storage.set_fail_reads(true);
        let err = store
            .write_section(SectionKey::Skills, json!({"skills": []}))
            .await
            .unwrap_err();
        assert!(matches!(err, PersistenceError::Storage(StorageError::Unavailable(_))));
        // read() still degrades to an empty document while storage is down.
        assert_eq!(store.read().await, Document::default());

        storage.set_fail_reads(false);
        let doc = store.read().await;
        assert_eq!(
            doc.section(SectionKey::PersonalInfo),
            Some(&json!({"firstName": "Ada"}))
        );
        assert!(doc.section(SectionKey::Skills).is_none());
        assert_eq!(storage.write_count(), 1);
    }
}
