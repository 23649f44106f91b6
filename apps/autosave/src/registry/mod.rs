//! Order and visibility of the resume sections.
//!
//! Lives in its own storage slot so structural UI changes never touch the
//! document or its `lastSaved` stamp. Loaded lazily on first access; every
//! successful mutation is persisted and then announced on the notifier.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::document::PersistenceError;
use crate::models::sections::{default_sections, SectionEntry, SectionId};
use crate::notify::Notifier;
use crate::storage::{SlotStorage, REGISTRY_SLOT};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("New order {got:?} is not a permutation of {expected:?}")]
    NotAPermutation {
        expected: Vec<SectionId>,
        got: Vec<SectionId>,
    },

    #[error("Unknown section '{0}'")]
    UnknownSection(String),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Stored entry as found on disk; every field may be missing.
#[derive(Debug, Deserialize)]
struct StoredEntry {
    id: String,
    title: Option<String>,
    visible: Option<bool>,
}

pub struct SectionRegistry {
    storage: Arc<dyn SlotStorage>,
    notifier: Notifier,
    entries: Mutex<Option<Vec<SectionEntry>>>,
}

impl SectionRegistry {
    pub fn new(storage: Arc<dyn SlotStorage>, notifier: Notifier) -> Self {
        Self {
            storage,
            notifier,
            entries: Mutex::new(None),
        }
    }

    /// Sections in render order.
    ///
    /// Falls back to the defaults while storage is unreadable, without
    /// caching them.
    pub async fn list(&self) -> Vec<SectionEntry> {
        let mut cached = self.entries.lock().await;
        match self.loaded(&mut cached).await {
            Ok(entries) => entries.clone(),
            Err(e) => {
                warn!("Could not read section registry, using defaults: {e}");
                default_sections()
            }
        }
    }

    /// Unknown sections are visible.
    pub async fn is_visible(&self, id: SectionId) -> bool {
        self.list()
            .await
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.visible)
            .unwrap_or(true)
    }

    /// Applies a new order. The input must name every current section exactly
    /// once; otherwise nothing changes.
    pub async fn reorder(&self, new_order: &[SectionId]) -> Result<(), RegistryError> {
        let mut cached = self.entries.lock().await;
        let current = self.loaded(&mut cached).await?;

        if !is_permutation(current, new_order) {
            return Err(RegistryError::NotAPermutation {
                expected: current.iter().map(|e| e.id).collect(),
                got: new_order.to_vec(),
            });
        }

        let reordered: Vec<SectionEntry> = new_order
            .iter()
            .filter_map(|id| current.iter().find(|e| e.id == *id).cloned())
            .collect();

        self.persist(&reordered).await?;
        *cached = Some(reordered);
        drop(cached);

        info!("Section order updated: {new_order:?}");
        self.notifier.publish();
        Ok(())
    }

    /// Flips one section's visibility and returns the new flag. Order is kept.
    pub async fn toggle(&self, id: SectionId) -> Result<bool, RegistryError> {
        let mut cached = self.entries.lock().await;
        let mut updated = self.loaded(&mut cached).await?.clone();

        let entry = updated
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or_else(|| RegistryError::UnknownSection(id.to_string()))?;
        entry.visible = !entry.visible;
        let visible = entry.visible;

        self.persist(&updated).await?;
        *cached = Some(updated);
        drop(cached);

        info!("Section '{id}' visibility set to {visible}");
        self.notifier.publish();
        Ok(visible)
    }

    /// Cached entries, loading them on first use. A read failure is returned
    /// and leaves the cache empty so the next call retries.
    async fn loaded<'a>(
        &self,
        cached: &'a mut Option<Vec<SectionEntry>>,
    ) -> Result<&'a Vec<SectionEntry>, PersistenceError> {
        if cached.is_none() {
            *cached = Some(self.load().await?);
        }
        Ok(cached.get_or_insert_with(default_sections))
    }

    async fn load(&self) -> Result<Vec<SectionEntry>, PersistenceError> {
        let Some(blob) = self.storage.load(REGISTRY_SLOT).await? else {
            return Ok(default_sections());
        };

        match serde_json::from_str::<Vec<StoredEntry>>(&blob) {
            Ok(stored) => Ok(normalize(stored)),
            Err(e) => {
                warn!("Discarding corrupt section registry: {e}");
                Ok(default_sections())
            }
        }
    }

    async fn persist(&self, entries: &[SectionEntry]) -> Result<(), PersistenceError> {
        let blob = serde_json::to_string(entries)?;
        self.storage.save(REGISTRY_SLOT, &blob).await?;
        Ok(())
    }
}

fn is_permutation(current: &[SectionEntry], new_order: &[SectionId]) -> bool {
    if current.len() != new_order.len() {
        return false;
    }
    let wanted: HashSet<SectionId> = new_order.iter().copied().collect();
    wanted.len() == new_order.len() && current.iter().all(|e| wanted.contains(&e.id))
}

/// Keeps stored order and flags, drops unknown and duplicate ids, and appends
/// any known section the stored list lacks.
fn normalize(stored: Vec<StoredEntry>) -> Vec<SectionEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::with_capacity(SectionId::ALL.len());

    for raw in stored {
        let Ok(id) = raw.id.parse::<SectionId>() else {
            warn!("Dropping unknown section '{}' from registry", raw.id);
            continue;
        };
        if !seen.insert(id) {
            continue;
        }
        entries.push(SectionEntry {
            id,
            title: raw.title.unwrap_or_else(|| id.default_title().to_string()),
            visible: raw.visible.unwrap_or(true),
        });
    }

    for id in SectionId::ALL {
        if !seen.contains(&id) {
            entries.push(SectionEntry::new(id));
        }
    }
    entries
}
