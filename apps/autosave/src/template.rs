use std::sync::{Arc, RwLock};

use tracing::info;

use crate::models::template::TemplateSettings;
use crate::notify::Notifier;

/// Application-scoped template selection. Not persisted; every process
/// starts from the defaults.
#[derive(Clone)]
pub struct TemplateState {
    settings: Arc<RwLock<TemplateSettings>>,
    notifier: Notifier,
}

impl TemplateState {
    pub fn new(notifier: Notifier) -> Self {
        Self {
            settings: Arc::new(RwLock::new(TemplateSettings::default())),
            notifier,
        }
    }

    pub fn get(&self) -> TemplateSettings {
        *self
            .settings
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stores the selection and notifies views when it actually changed.
    pub fn set(&self, settings: TemplateSettings) {
        let changed = {
            let mut current = self
                .settings
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            let changed = *current != settings;
            *current = settings;
            changed
        };
        if changed {
            info!(
                "Template set to {:?} / {:?}",
                settings.template, settings.color_scheme
            );
            self.notifier.publish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::template::{ColorScheme, TemplateKind};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_set_publishes_only_on_change() {
        let notifier = Notifier::new(4);
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let _sub = notifier.subscribe(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        let state = TemplateState::new(notifier);

        state.set(TemplateSettings::default());
        assert_eq!(count.load(Ordering::SeqCst), 0);

        let classic = TemplateSettings {
            template: TemplateKind::Classic,
            color_scheme: ColorScheme::Green,
        };
        state.set(classic);
        assert_eq!(state.get(), classic);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
