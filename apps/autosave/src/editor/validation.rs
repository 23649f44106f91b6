//! Field validation for section candidates.
//!
//! Pure functions only: the autosave core never calls these on its own.
//! Editors use them to gate item dialogs and to show inline field errors.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::models::resume::{
    Education, EducationItem, PersonalInfo, ProfessionalSummary, ProjectItem, Projects,
    SectionKey, SkillItem, Skills, WorkExperience, WorkExperienceItem,
};

/// Field name used when the candidate does not match the section shape.
pub const SHAPE_FIELD: &str = "_shape";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub valid: bool,
    pub field_errors: BTreeMap<String, String>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self {
            valid: true,
            field_errors: BTreeMap::new(),
        }
    }
}

impl ValidationReport {
    /// Records an error; the first message per field wins.
    fn push(&mut self, field: String, message: &str) {
        self.valid = false;
        self.field_errors
            .entry(field)
            .or_insert_with(|| message.to_string());
    }
}

/// Types whose fields can be checked in place.
pub trait Validate {
    /// Appends errors under `prefix` (empty for top-level fields).
    fn check(&self, prefix: &str, report: &mut ValidationReport);

    fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        self.check("", &mut report);
        report
    }
}

/// Validates a raw candidate for `key`.
pub fn validate(key: SectionKey, candidate: &Value) -> ValidationReport {
    match key {
        SectionKey::PersonalInfo => validate_as::<PersonalInfo>(candidate),
        SectionKey::ProfessionalSummary => validate_as::<ProfessionalSummary>(candidate),
        SectionKey::WorkExperience => validate_as::<WorkExperience>(candidate),
        SectionKey::Education => validate_as::<Education>(candidate),
        SectionKey::Skills => validate_as::<Skills>(candidate),
        SectionKey::Projects => validate_as::<Projects>(candidate),
    }
}

fn validate_as<T: DeserializeOwned + Validate>(candidate: &Value) -> ValidationReport {
    match serde_json::from_value::<T>(candidate.clone()) {
        Ok(typed) => typed.validate(),
        Err(e) => {
            let mut report = ValidationReport::default();
            report.push(SHAPE_FIELD.to_string(), &format!("Invalid section shape: {e}"));
            report
        }
    }
}

fn field(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn require(report: &mut ValidationReport, prefix: &str, name: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        report.push(field(prefix, name), message);
    }
}

fn length_between(
    report: &mut ValidationReport,
    prefix: &str,
    name: &str,
    value: &str,
    (min, max): (usize, usize),
    messages: (&str, &str),
) {
    let len = value.chars().count();
    if len < min {
        report.push(field(prefix, name), messages.0);
    } else if len > max {
        report.push(field(prefix, name), messages.1);
    }
}

fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// An absolute `http`/`https` URL with a host.
fn looks_like_url(value: &str) -> bool {
    match Url::parse(value) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}

/// Digits with at most one dot, e.g. `3.8` or `4`.
fn looks_like_gpa(value: &str) -> bool {
    value.chars().all(|c| c.is_ascii_digit() || c == '.') && value.matches('.').count() <= 1
}

fn check_items<T: Validate>(items: &[T], prefix: &str, list: &str, report: &mut ValidationReport) {
    for (i, item) in items.iter().enumerate() {
        item.check(&field(prefix, &format!("{list}[{i}]")), report);
    }
}

impl Validate for PersonalInfo {
    fn check(&self, p: &str, report: &mut ValidationReport) {
        require(report, p, "firstName", &self.first_name, "First name is required");
        require(report, p, "lastName", &self.last_name, "Last name is required");
        if !looks_like_email(&self.email) {
            report.push(field(p, "email"), "Invalid email address");
        }
        if self.phone.chars().count() < 10 {
            report.push(field(p, "phone"), "Phone number must be at least 10 digits");
        }
        require(report, p, "location", &self.location, "Location is required");
    }
}

impl Validate for ProfessionalSummary {
    fn check(&self, p: &str, report: &mut ValidationReport) {
        length_between(
            report,
            p,
            "summary",
            &self.summary,
            (50, 500),
            (
                "Professional summary should be at least 50 characters",
                "Professional summary should not exceed 500 characters",
            ),
        );
    }
}

impl Validate for WorkExperienceItem {
    fn check(&self, p: &str, report: &mut ValidationReport) {
        require(report, p, "company", &self.company, "Company name is required");
        require(report, p, "position", &self.position, "Position is required");
        require(report, p, "location", &self.location, "Location is required");
        require(report, p, "startDate", &self.start_date, "Start date is required");
        length_between(
            report,
            p,
            "description",
            &self.description,
            (30, 1000),
            (
                "Description should be at least 30 characters",
                "Description should not exceed 1000 characters",
            ),
        );
    }
}

impl Validate for EducationItem {
    fn check(&self, p: &str, report: &mut ValidationReport) {
        require(report, p, "school", &self.school, "School name is required");
        require(report, p, "degree", &self.degree, "Degree is required");
        require(report, p, "field", &self.field, "Field of study is required");
        require(report, p, "location", &self.location, "Location is required");
        require(report, p, "startDate", &self.start_date, "Start date is required");
        if let Some(description) = &self.description {
            if description.chars().count() > 500 {
                report.push(
                    field(p, "description"),
                    "Description should not exceed 500 characters",
                );
            }
        }
        if let Some(gpa) = &self.gpa {
            if !looks_like_gpa(gpa) {
                report.push(field(p, "gpa"), "GPA must be a valid number");
            }
        }
    }
}

impl Validate for SkillItem {
    fn check(&self, p: &str, report: &mut ValidationReport) {
        require(report, p, "name", &self.name, "Skill name is required");
        require(report, p, "category", &self.category, "Category is required");
    }
}

impl Validate for ProjectItem {
    fn check(&self, p: &str, report: &mut ValidationReport) {
        require(report, p, "name", &self.name, "Project name is required");
        length_between(
            report,
            p,
            "description",
            &self.description,
            (30, 500),
            (
                "Description should be at least 30 characters",
                "Description should not exceed 500 characters",
            ),
        );
        if self.technologies.is_empty() {
            report.push(
                field(p, "technologies"),
                "At least one technology is required",
            );
        }
        require(report, p, "role", &self.role, "Role is required");
        if let Some(url) = &self.url {
            if !looks_like_url(url) {
                report.push(field(p, "url"), "Must be a valid URL");
            }
        }
        require(report, p, "startDate", &self.start_date, "Start date is required");
    }
}

impl Validate for WorkExperience {
    fn check(&self, p: &str, report: &mut ValidationReport) {
        check_items(&self.experiences, p, "experiences", report);
    }
}

impl Validate for Education {
    fn check(&self, p: &str, report: &mut ValidationReport) {
        check_items(&self.education, p, "education", report);
    }
}

impl Validate for Skills {
    fn check(&self, p: &str, report: &mut ValidationReport) {
        check_items(&self.skills, p, "skills", report);
    }
}

impl Validate for Projects {
    fn check(&self, p: &str, report: &mut ValidationReport) {
        check_items(&self.projects, p, "projects", report);
    }
}
