//! Durable storage slots.
//!
//! A slot holds exactly one serialized blob under a fixed name. The document
//! and the section registry each live in their own slot; nothing else shares
//! the medium.

pub mod file;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use file::FileSlotStorage;
pub use memory::MemorySlotStorage;

/// Slot holding the serialized resume document.
pub const DOCUMENT_SLOT: &str = "resume-data";
/// Slot holding the serialized section registry.
pub const REGISTRY_SLOT: &str = "sectionOrder";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on slot '{slot}': {source}")]
    Io {
        slot: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Quota exceeded on slot '{slot}': {size} bytes (limit {limit})")]
    QuotaExceeded {
        slot: String,
        size: usize,
        limit: usize,
    },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// A key-addressed blob store. Writes replace the whole slot atomically.
///
/// Implementations may suspend; callers that do read-modify-write must
/// serialize themselves.
#[async_trait]
pub trait SlotStorage: Send + Sync {
    /// Returns `None` when the slot has never been written.
    async fn load(&self, slot: &str) -> Result<Option<String>, StorageError>;

    async fn save(&self, slot: &str, blob: &str) -> Result<(), StorageError>;
}
