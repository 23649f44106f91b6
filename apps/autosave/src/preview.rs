//! Composed resume view consumed by the preview pane and export.
//!
//! The view is rebuilt from the full document, the registry and the template
//! whenever the notifier fires. It never writes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::document::DocumentStore;
use crate::models::resume::{Document, SectionKey};
use crate::models::sections::{SectionEntry, SectionId};
use crate::models::template::TemplateSettings;
use crate::notify::{Notifier, Subscription};
use crate::registry::SectionRegistry;
use crate::template::TemplateState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewSection {
    pub id: SectionId,
    pub title: String,
    /// `None` when the section was never edited.
    pub content: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewDocument {
    pub template: TemplateSettings,
    pub personal_info: Option<Value>,
    pub sections: Vec<PreviewSection>,
    pub last_saved: Option<chrono::DateTime<chrono::Utc>>,
}

/// Visible sections in registry order, with personal info as the header.
pub fn compose(
    doc: &Document,
    registry: &[SectionEntry],
    template: TemplateSettings,
) -> PreviewDocument {
    PreviewDocument {
        template,
        personal_info: doc.section(SectionKey::PersonalInfo).cloned(),
        sections: registry
            .iter()
            .filter(|entry| entry.visible)
            .map(|entry| PreviewSection {
                id: entry.id,
                title: entry.title.clone(),
                content: doc.section(entry.id.document_key()).cloned(),
            })
            .collect(),
        last_saved: doc.last_saved,
    }
}

/// A mounted preview that re-reads its inputs after every change signal.
pub struct PreviewView {
    store: DocumentStore,
    registry: Arc<SectionRegistry>,
    template: TemplateState,
    stale: Arc<AtomicBool>,
    cached: Mutex<Option<PreviewDocument>>,
    _subscription: Subscription,
}

impl PreviewView {
    pub fn mount(
        store: DocumentStore,
        registry: Arc<SectionRegistry>,
        template: TemplateState,
        notifier: &Notifier,
    ) -> Self {
        let stale = Arc::new(AtomicBool::new(true));
        let flag = stale.clone();
        let subscription = notifier.subscribe(move || flag.store(true, Ordering::SeqCst));
        Self {
            store,
            registry,
            template,
            stale,
            cached: Mutex::new(None),
            _subscription: subscription,
        }
    }

    pub async fn current(&self) -> PreviewDocument {
        let mut cached = self.cached.lock().await;
        // Clear the flag before reading so a signal that lands mid-read marks
        // the fresh result stale again.
        let stale = self.stale.swap(false, Ordering::SeqCst);
        if let Some(view) = cached.as_ref().filter(|_| !stale) {
            return view.clone();
        }

        let doc = self.store.read().await;
        let registry = self.registry.list().await;
        let view = compose(&doc, &registry, self.template.get());
        *cached = Some(view.clone());
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySlotStorage;
    use serde_json::json;

    #[test]
    fn test_compose_follows_registry_order_and_visibility() {
        let mut doc = Document::default();
        doc.sections
            .insert(SectionKey::PersonalInfo, json!({"firstName": "Ada"}));
        doc.sections
            .insert(SectionKey::Skills, json!({"skills": []}));

        let mut registry = vec![
            SectionEntry::new(SectionId::Skills),
            SectionEntry::new(SectionId::Summary),
            SectionEntry::new(SectionId::Projects),
        ];
        registry[2].visible = false;

        let view = compose(&doc, &registry, TemplateSettings::default());
        assert_eq!(view.personal_info, Some(json!({"firstName": "Ada"})));
        let ids: Vec<_> = view.sections.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![SectionId::Skills, SectionId::Summary]);
        assert_eq!(view.sections[0].content, Some(json!({"skills": []})));
        assert!(view.sections[1].content.is_none());
    }

    #[tokio::test]
    async fn test_view_refreshes_after_change_signal() {
        let storage = Arc::new(MemorySlotStorage::new());
        let notifier = Notifier::new(8);
        let store = DocumentStore::new(storage.clone());
        let registry = Arc::new(SectionRegistry::new(storage, notifier.clone()));
        let view = PreviewView::mount(
            store.clone(),
            registry.clone(),
            TemplateState::new(notifier.clone()),
            &notifier,
        );

        assert_eq!(view.current().await.sections.len(), 5);

        // A write without a signal is not picked up.
        store
            .write_section(SectionKey::PersonalInfo, json!({"firstName": "Ada"}))
            .await
            .unwrap();
        assert!(view.current().await.personal_info.is_none());

        notifier.publish();
        assert_eq!(
            view.current().await.personal_info,
            Some(json!({"firstName": "Ada"}))
        );

        registry.toggle(SectionId::Summary).await.unwrap();
        assert_eq!(view.current().await.sections.len(), 4);
    }
}
