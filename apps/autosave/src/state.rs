use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use crate::autosave::{AutosaveScheduler, AutosaveSwitch};
use crate::config::Config;
use crate::document::DocumentStore;
use crate::notify::Notifier;
use crate::preview::PreviewView;
use crate::registry::SectionRegistry;
use crate::storage::SlotStorage;
use crate::template::TemplateState;

/// Shared application state injected into all route handlers via Axum extractors.
///
/// Every container here is application-scoped and explicitly wired; nothing
/// reaches for a global.
#[derive(Clone)]
pub struct AppState {
    pub store: DocumentStore,
    pub scheduler: AutosaveScheduler,
    pub registry: Arc<SectionRegistry>,
    pub notifier: Notifier,
    pub autosave: AutosaveSwitch,
    pub template: TemplateState,
    pub preview: Arc<PreviewView>,
    /// Serializes item edits so two requests never mount the same working
    /// copy and overwrite each other's candidate.
    pub item_edits: Arc<Mutex<()>>,
    /// Flips to `true` once shutdown starts; long-lived streams end on it.
    pub shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    pub fn new(storage: Arc<dyn SlotStorage>, config: &Config) -> Self {
        let notifier = Notifier::new(config.notify_capacity);
        let store = DocumentStore::new(storage.clone());
        let autosave = AutosaveSwitch::default();
        let scheduler = AutosaveScheduler::new(
            store.clone(),
            notifier.clone(),
            autosave.clone(),
            config.debounce,
        );
        let registry = Arc::new(SectionRegistry::new(storage, notifier.clone()));
        let template = TemplateState::new(notifier.clone());
        let preview = Arc::new(PreviewView::mount(
            store.clone(),
            registry.clone(),
            template.clone(),
            &notifier,
        ));

        AppState {
            store,
            scheduler,
            registry,
            notifier,
            autosave,
            template,
            preview,
            item_edits: Arc::new(Mutex::new(())),
            shutdown: Arc::new(watch::channel(false).0),
        }
    }
}
