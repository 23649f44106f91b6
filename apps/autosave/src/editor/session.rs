use serde::Serialize;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::autosave::{AutosaveScheduler, ScheduleOutcome};
use crate::editor::validation::{Validate, ValidationReport};
use crate::models::resume::{ListSection, SectionItem, SectionKey, SectionPayload};

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Item failed validation")]
    Invalid(ValidationReport),

    #[error("No item with id '{0}'")]
    UnknownItem(String),

    /// The current value of the section cannot be read as its typed shape.
    /// Editing it would replace the whole section, so the editor refuses.
    #[error("Section '{key}' has an unexpected shape: {message}")]
    Shape { key: SectionKey, message: String },

    #[error("Could not encode section: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct ItemChange<I> {
    pub item: I,
    pub outcome: ScheduleOutcome,
}

/// Working copy of one section.
///
/// The copy is provisional: every edit submits the whole section to the
/// scheduler, which decides whether and when it becomes durable. Dropping the
/// editor does not cancel a save it armed.
pub struct SectionEditor<S: SectionPayload> {
    scheduler: AutosaveScheduler,
    working: S,
}

impl<S: SectionPayload> SectionEditor<S> {
    /// Starts from the freshest known value: a pending candidate, then the
    /// stored section, then an empty section.
    pub async fn mount(scheduler: AutosaveScheduler) -> Result<Self, EditorError> {
        let current = match scheduler.working_value(S::KEY) {
            Some(value) => Some(value),
            None => scheduler.store().read().await.sections.remove(&S::KEY),
        };

        let working = match current {
            Some(value) => serde_json::from_value::<S>(value).map_err(|e| {
                warn!("Refusing to edit '{}' section: {e}", S::KEY);
                EditorError::Shape {
                    key: S::KEY,
                    message: e.to_string(),
                }
            })?,
            None => S::default(),
        };

        Ok(Self { scheduler, working })
    }

    pub fn working(&self) -> &S {
        &self.working
    }

    /// Applies `f` to the working copy and submits the result.
    pub fn edit<F>(&mut self, f: F) -> Result<ScheduleOutcome, EditorError>
    where
        F: FnOnce(&mut S),
    {
        f(&mut self.working);
        self.submit()
    }

    pub fn submit(&self) -> Result<ScheduleOutcome, EditorError> {
        let candidate = serde_json::to_value(&self.working)?;
        Ok(self.scheduler.schedule(S::KEY, candidate))
    }
}

impl<S> SectionEditor<S>
where
    S: ListSection,
    S::Item: Validate,
{
    /// Appends a validated item under a freshly generated id.
    pub fn add_item(&mut self, mut item: S::Item) -> Result<ItemChange<S::Item>, EditorError> {
        let report = item.validate();
        if !report.valid {
            return Err(EditorError::Invalid(report));
        }

        let id = loop {
            let id = Uuid::new_v4().to_string();
            if !self.working().items().iter().any(|existing| existing.id() == id) {
                break id;
            }
        };
        item.set_id(id);
        let added = item.clone();
        let outcome = self.edit(|section| section.items_mut().push(added))?;
        Ok(ItemChange { item, outcome })
    }

    /// Replaces the item with the same id, keeping its position.
    pub fn update_item(&mut self, item: S::Item) -> Result<ItemChange<S::Item>, EditorError> {
        let position = self.position(item.id())?;
        let report = item.validate();
        if !report.valid {
            return Err(EditorError::Invalid(report));
        }

        let replacement = item.clone();
        let outcome = self.edit(|section| section.items_mut()[position] = replacement)?;
        Ok(ItemChange { item, outcome })
    }

    /// Removing the last item persists an empty list; the section stays.
    pub fn remove_item(&mut self, id: &str) -> Result<ScheduleOutcome, EditorError> {
        let position = self.position(id)?;
        self.edit(|section| {
            section.items_mut().remove(position);
        })
    }

    fn position(&self, id: &str) -> Result<usize, EditorError> {
        self.working()
            .items()
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| EditorError::UnknownItem(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autosave::AutosaveSwitch;
    use crate::document::DocumentStore;
    use crate::models::resume::{
        PersonalInfo, SectionKey, SkillItem, SkillLevel, Skills, WorkExperience,
        WorkExperienceItem,
    };
    use crate::notify::Notifier;
    use crate::storage::MemorySlotStorage;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn scheduler() -> AutosaveScheduler {
        AutosaveScheduler::new(
            DocumentStore::new(Arc::new(MemorySlotStorage::new())),
            Notifier::new(8),
            AutosaveSwitch::new(true),
            Duration::from_millis(500),
        )
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(600)).await;
    }

    async fn saved<S: SectionPayload>(scheduler: &AutosaveScheduler) -> S {
        let doc = scheduler.store().read().await;
        serde_json::from_value(doc.section(S::KEY).cloned().unwrap()).unwrap()
    }

    fn job(company: &str) -> WorkExperienceItem {
        WorkExperienceItem {
            company: company.into(),
            position: "Engineer".into(),
            location: "Remote".into(),
            start_date: "2021-03".into(),
            current: true,
            description: "Built and ran the billing pipeline for 3 regions".into(),
            ..Default::default()
        }
    }

    fn skill(name: &str) -> SkillItem {
        SkillItem {
            name: name.into(),
            level: SkillLevel::Advanced,
            category: "Languages".into(),
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_on_empty_document_uses_default() {
        let editor = SectionEditor::<PersonalInfo>::mount(scheduler()).await.unwrap();
        assert_eq!(editor.working(), &PersonalInfo::default());
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_submits_and_commits_whole_section() {
        let scheduler = scheduler();
        let mut editor = SectionEditor::<PersonalInfo>::mount(scheduler.clone()).await.unwrap();
        let outcome = editor
            .edit(|p| {
                p.first_name = "Ada".into();
                p.email = "ada@example.com".into();
            })
            .unwrap();
        assert_eq!(outcome, ScheduleOutcome::Scheduled);
        drop(editor);
        settle().await;

        let saved: PersonalInfo = saved(&scheduler).await;
        assert_eq!(saved.first_name, "Ada");
        assert_eq!(saved.email, "ada@example.com");
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_item_generates_unique_ids() {
        let scheduler = scheduler();
        let mut editor = SectionEditor::<WorkExperience>::mount(scheduler.clone()).await.unwrap();
        let a = editor.add_item(job("Acme")).unwrap();
        let b = editor.add_item(job("Globex")).unwrap();

        assert!(!a.item.id.is_empty());
        assert_ne!(a.item.id, b.item.id);
        settle().await;

        let saved: WorkExperience = saved(&scheduler).await;
        assert_eq!(saved.experiences.len(), 2);
        assert_eq!(saved.experiences[0].id, a.item.id);
        assert_eq!(saved.experiences[1].company, "Globex");
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_item_is_not_submitted() {
        let scheduler = scheduler();
        let mut editor = SectionEditor::<WorkExperience>::mount(scheduler.clone()).await.unwrap();
        let mut bad = job("Acme");
        bad.description = "too short".into();

        match editor.add_item(bad) {
            Err(EditorError::Invalid(report)) => {
                assert!(report.field_errors.contains_key("description"))
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert!(editor.working().experiences.is_empty());
        assert!(scheduler.working_value(SectionKey::WorkExperience).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_sees_pending_candidate() {
        let scheduler = scheduler();
        let mut first = SectionEditor::<Skills>::mount(scheduler.clone()).await.unwrap();
        first.add_item(skill("Rust")).unwrap();

        let mut second = SectionEditor::<Skills>::mount(scheduler.clone()).await.unwrap();
        assert_eq!(second.working().skills.len(), 1);
        second.add_item(skill("SQL")).unwrap();
        settle().await;

        let saved: Skills = saved(&scheduler).await;
        let names: Vec<_> = saved.skills.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Rust", "SQL"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_and_remove_by_id() {
        let scheduler = scheduler();
        let mut editor = SectionEditor::<WorkExperience>::mount(scheduler.clone()).await.unwrap();
        let added = editor.add_item(job("Acme")).unwrap().item;

        let mut changed = added.clone();
        changed.position = "Staff Engineer".into();
        editor.update_item(changed).unwrap();
        assert_eq!(editor.working().experiences[0].position, "Staff Engineer");

        assert!(matches!(
            editor.remove_item("missing"),
            Err(EditorError::UnknownItem(_))
        ));
        editor.remove_item(&added.id).unwrap();
        settle().await;

        // The key survives with an empty list.
        let doc = scheduler.store().read().await;
        assert_eq!(
            doc.section(SectionKey::WorkExperience),
            Some(&json!({"experiences": []}))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_refuses_section_with_unexpected_shape() {
        let scheduler = scheduler();
        scheduler
            .store()
            .write_section(SectionKey::Skills, json!({"skills": "oops"}))
            .await
            .unwrap();

        match SectionEditor::<Skills>::mount(scheduler.clone()).await {
            Err(EditorError::Shape { key, .. }) => assert_eq!(key, SectionKey::Skills),
            Err(other) => panic!("expected shape error, got {other:?}"),
            Ok(_) => panic!("expected shape error, got an editor"),
        }

        // The malformed value stays untouched.
        let doc = scheduler.store().read().await;
        assert_eq!(doc.section(SectionKey::Skills), Some(&json!({"skills": "oops"})));
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_refuses_pending_candidate_with_unexpected_shape() {
        let scheduler = scheduler();
        scheduler.schedule(SectionKey::WorkExperience, json!({"experiences": 3}));

        assert!(matches!(
            SectionEditor::<WorkExperience>::mount(scheduler.clone()).await,
            Err(EditorError::Shape { .. })
        ));
    }
}
