use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::resume::SectionKey;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SavePhase {
    #[default]
    Idle,
    Pending,
    Committing,
}

/// Save state of one section as shown by the status header.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionStatus {
    pub phase: SavePhase,
    pub last_saved: Option<DateTime<Utc>>,
    /// Message of the most recent failed commit; cleared by the next success.
    pub last_error: Option<String>,
}

impl SectionStatus {
    pub fn record_success(&mut self, at: DateTime<Utc>) {
        self.last_saved = Some(at);
        self.last_error = None;
    }

    pub fn record_failure(&mut self, message: String) {
        self.last_error = Some(message);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSummary {
    pub autosave_enabled: bool,
    pub is_saving: bool,
    pub last_saved: Option<DateTime<Utc>>,
    pub sections: BTreeMap<SectionKey, SectionStatus>,
}
