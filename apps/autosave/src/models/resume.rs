use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

/// Name of the `lastSaved` stamp inside the persisted document blob.
pub const LAST_SAVED_FIELD: &str = "lastSaved";

/// The closed set of document partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKey {
    PersonalInfo,
    ProfessionalSummary,
    WorkExperience,
    Education,
    Skills,
    Projects,
}

impl SectionKey {
    pub const ALL: [SectionKey; 6] = [
        SectionKey::PersonalInfo,
        SectionKey::ProfessionalSummary,
        SectionKey::WorkExperience,
        SectionKey::Education,
        SectionKey::Skills,
        SectionKey::Projects,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionKey::PersonalInfo => "personalInfo",
            SectionKey::ProfessionalSummary => "professionalSummary",
            SectionKey::WorkExperience => "workExperience",
            SectionKey::Education => "education",
            SectionKey::Skills => "skills",
            SectionKey::Projects => "projects",
        }
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown section key '{0}'")]
pub struct UnknownSectionKey(pub String);

impl FromStr for SectionKey {
    type Err = UnknownSectionKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownSectionKey(s.to_string()))
    }
}

/// The whole resume document.
///
/// Absent keys mean "never edited"; an edited-then-emptied list section keeps
/// its key with an empty list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub sections: BTreeMap<SectionKey, Value>,
    pub last_saved: Option<DateTime<Utc>>,
}

impl Document {
    pub fn section(&self, key: SectionKey) -> Option<&Value> {
        self.sections.get(&key)
    }

    /// Builds a document from the flat persisted object.
    ///
    /// Returns `None` when the blob is not an object. Unknown keys are skipped
    /// and an unreadable `lastSaved` is dropped.
    pub fn from_json(value: Value) -> Option<Self> {
        let Value::Object(map) = value else {
            return None;
        };

        let mut doc = Document::default();
        for (name, payload) in map {
            if name == LAST_SAVED_FIELD {
                doc.last_saved = payload
                    .as_str()
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map(|dt| dt.with_timezone(&Utc));
                continue;
            }
            match name.parse::<SectionKey>() {
                Ok(key) => {
                    doc.sections.insert(key, payload);
                }
                Err(_) => tracing::debug!("Ignoring unknown document key '{name}'"),
            }
        }
        Some(doc)
    }

    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for (key, payload) in &self.sections {
            map.insert(key.as_str().to_string(), payload.clone());
        }
        if let Some(ts) = self.last_saved {
            map.insert(
                LAST_SAVED_FIELD.to_string(),
                Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            );
        }
        Value::Object(map)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Typed section shapes
// ────────────────────────────────────────────────────────────────────────────

/// A typed view of one document section.
pub trait SectionPayload: Serialize + DeserializeOwned + Default + Clone + Send + Sync {
    const KEY: SectionKey;
}

/// An entry of a list-shaped section, carrying a stable client-generated id.
pub trait SectionItem: Serialize + DeserializeOwned + Clone + Send + Sync {
    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
}

pub trait ListSection: SectionPayload {
    type Item: SectionItem;

    fn items(&self) -> &[Self::Item];
    fn items_mut(&mut self) -> &mut Vec<Self::Item>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub location: String,
}

impl SectionPayload for PersonalInfo {
    const KEY: SectionKey = SectionKey::PersonalInfo;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfessionalSummary {
    #[serde(default)]
    pub summary: String,
}

impl SectionPayload for ProfessionalSummary {
    const KEY: SectionKey = SectionKey::ProfessionalSummary;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperienceItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub position: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkExperience {
    #[serde(default)]
    pub experiences: Vec<WorkExperienceItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub field: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub current: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gpa: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Education {
    #[serde(default)]
    pub education: Vec<EducationItem>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
    Expert,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub level: SkillLevel,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skills {
    #[serde(default)]
    pub skills: Vec<SkillItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub current: bool,
    #[serde(default)]
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Projects {
    #[serde(default)]
    pub projects: Vec<ProjectItem>,
}

impl SectionItem for WorkExperienceItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl SectionItem for EducationItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl SectionItem for SkillItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl SectionItem for ProjectItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl SectionPayload for WorkExperience {
    const KEY: SectionKey = SectionKey::WorkExperience;
}

impl ListSection for WorkExperience {
    type Item = WorkExperienceItem;

    fn items(&self) -> &[Self::Item] {
        &self.experiences
    }

    fn items_mut(&mut self) -> &mut Vec<Self::Item> {
        &mut self.experiences
    }
}

impl SectionPayload for Education {
    const KEY: SectionKey = SectionKey::Education;
}

impl ListSection for Education {
    type Item = EducationItem;

    fn items(&self) -> &[Self::Item] {
        &self.education
    }

    fn items_mut(&mut self) -> &mut Vec<Self::Item> {
        &mut self.education
    }
}

impl SectionPayload for Skills {
    const KEY: SectionKey = SectionKey::Skills;
}

impl ListSection for Skills {
    type Item = SkillItem;

    fn items(&self) -> &[Self::Item] {
        &self.skills
    }

    fn items_mut(&mut self) -> &mut Vec<Self::Item> {
        &mut self.skills
    }
}

impl SectionPayload for Projects {
    const KEY: SectionKey = SectionKey::Projects;
}

impl ListSection for Projects {
    type Item = ProjectItem;

    fn items(&self) -> &[Self::Item] {
        &self.projects
    }

    fn items_mut(&mut self) -> &mut Vec<Self::Item> {
        &mut self.projects
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_section_key_round_trips_through_str() {
        for key in SectionKey::ALL {
            assert_eq!(key.as_str().parse::<SectionKey>().unwrap(), key);
        }
        let err = "summary".parse::<SectionKey>().unwrap_err();
        assert_eq!(err.to_string(), "unknown section key 'summary'");
    }

    #[test]
    fn test_from_json_skips_unknown_keys_and_bad_timestamp() {
        let doc = Document::from_json(json!({
            "personalInfo": {"firstName": "Ada"},
            "theme": "dark",
            "lastSaved": "yesterday"
        }))
        .unwrap();

        assert_eq!(doc.sections.len(), 1);
        assert_eq!(
            doc.section(SectionKey::PersonalInfo),
            Some(&json!({"firstName": "Ada"}))
        );
        assert!(doc.last_saved.is_none());
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        assert!(Document::from_json(json!([1, 2, 3])).is_none());
        assert!(Document::from_json(Value::Null).is_none());
    }

    #[test]
    fn test_to_json_is_flat_with_last_saved() {
        let mut doc = Document::default();
        doc.sections
            .insert(SectionKey::Skills, json!({"skills": []}));
        doc.last_saved = Some(Utc::now());

        let value = doc.to_json();
        assert_eq!(value["skills"], json!({"skills": []}));
        assert!(value[LAST_SAVED_FIELD].is_string());
        assert_eq!(Document::from_json(value).unwrap(), doc);
    }

    #[test]
    fn test_typed_section_decodes_camel_case() {
        let mut doc = Document::default();
        doc.sections.insert(
            SectionKey::WorkExperience,
            json!({"experiences": [{
                "id": "a1", "company": "Acme", "position": "Engineer",
                "startDate": "2020-01", "current": true
            }]}),
        );

        let stored = doc.section(WorkExperience::KEY).cloned().unwrap();
        let work: WorkExperience = serde_json::from_value(stored).unwrap();
        assert_eq!(work.experiences[0].start_date, "2020-01");
        assert!(work.experiences[0].current);
        assert!(work.experiences[0].end_date.is_none());
    }
}
