use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{SlotStorage, StorageError};

/// In-process slot storage with fault injection.
#[derive(Debug, Default)]
pub struct MemorySlotStorage {
    slots: Mutex<HashMap<String, String>>,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
    quota_bytes: Option<usize>,
    write_delay: Option<Duration>,
    writes: AtomicUsize,
}

impl MemorySlotStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(mut self, quota_bytes: usize) -> Self {
        self.quota_bytes = Some(quota_bytes);
        self
    }

    /// Makes every `save` yield for `delay` before storing.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Writes a raw blob, bypassing quota and failure injection.
    pub fn put_raw(&self, slot: &str, blob: &str) {
        self.lock().insert(slot.to_string(), blob.to_string());
    }

    pub fn get_raw(&self, slot: &str) -> Option<String> {
        self.lock().get(slot).cloned()
    }

    /// Number of successful `save` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.slots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SlotStorage for MemorySlotStorage {
    async fn load(&self, slot: &str) -> Result<Option<String>, StorageError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(format!(
                "injected read failure on slot '{slot}'"
            )));
        }
        Ok(self.get_raw(slot))
    }

    async fn save(&self, slot: &str, blob: &str) -> Result<(), StorageError> {
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(format!(
                "injected write failure on slot '{slot}'"
            )));
        }
        if let Some(limit) = self.quota_bytes {
            if blob.len() > limit {
                return Err(StorageError::QuotaExceeded {
                    slot: slot.to_string(),
                    size: blob.len(),
                    limit,
                });
            }
        }
        self.put_raw(slot, blob);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
