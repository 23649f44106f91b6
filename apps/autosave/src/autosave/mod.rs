// Debounced autosave: per-section timers, commit path and save status.
// Commits are the only writer of the document slot.

pub mod scheduler;
pub mod status;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub use scheduler::{AutosaveScheduler, ScheduleOutcome};
pub use status::{SaveSummary, SectionStatus};

/// Application-wide autosave on/off flag shared by every editor.
#[derive(Debug, Clone)]
pub struct AutosaveSwitch(Arc<AtomicBool>);

impl AutosaveSwitch {
    pub fn new(enabled: bool) -> Self {
        Self(Arc::new(AtomicBool::new(enabled)))
    }

    pub fn is_enabled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.0.store(enabled, Ordering::SeqCst);
    }
}

impl Default for AutosaveSwitch {
    fn default() -> Self {
        Self::new(true)
    }
}
