use std::collections::HashMap;

use serde_json::Value;

use crate::models::resume::SectionKey;

/// Remembers, per section, the last value accepted for persistence.
///
/// Comparison is deep structural equality on JSON values: arrays are
/// order-sensitive, objects compare by key set and values. The whole section
/// is the unit of change; editing one list item marks the section changed.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    accepted: HashMap<SectionKey, Value>,
}

impl ChangeDetector {
    /// True if `candidate` differs from the last accepted value for `key`, or
    /// nothing has been accepted for `key` yet.
    pub fn has_changed(&self, key: SectionKey, candidate: &Value) -> bool {
        self.accepted.get(&key) != Some(candidate)
    }

    /// Records `value` as durably committed for `key`.
    pub fn accept(&mut self, key: SectionKey, value: Value) {
        self.accepted.insert(key, value);
    }
}
