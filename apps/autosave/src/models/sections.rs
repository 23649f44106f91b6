use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::resume::SectionKey;

/// Sections that can be reordered and hidden in the composed view.
///
/// Personal info is always rendered as the header and is not listed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionId {
    Summary,
    Skills,
    Experience,
    Education,
    Projects,
}

impl SectionId {
    /// Default render order.
    pub const ALL: [SectionId; 5] = [
        SectionId::Summary,
        SectionId::Skills,
        SectionId::Experience,
        SectionId::Education,
        SectionId::Projects,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionId::Summary => "summary",
            SectionId::Skills => "skills",
            SectionId::Experience => "experience",
            SectionId::Education => "education",
            SectionId::Projects => "projects",
        }
    }

    pub fn default_title(&self) -> &'static str {
        match self {
            SectionId::Summary => "Professional Summary",
            SectionId::Skills => "Skills",
            SectionId::Experience => "Work Experience",
            SectionId::Education => "Education",
            SectionId::Projects => "Projects",
        }
    }

    /// The document partition holding this section's content.
    pub fn document_key(&self) -> SectionKey {
        match self {
            SectionId::Summary => SectionKey::ProfessionalSummary,
            SectionId::Skills => SectionKey::Skills,
            SectionId::Experience => SectionKey::WorkExperience,
            SectionId::Education => SectionKey::Education,
            SectionId::Projects => SectionKey::Projects,
        }
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionEntry {
    pub id: SectionId,
    pub title: String,
    pub visible: bool,
}

impl SectionEntry {
    pub fn new(id: SectionId) -> Self {
        Self {
            id,
            title: id.default_title().to_string(),
            visible: true,
        }
    }
}

pub fn default_sections() -> Vec<SectionEntry> {
    SectionId::ALL.into_iter().map(SectionEntry::new).collect()
}
