//! Canonical CV/profile record and its partial override.
//!
//! Leaf strings are never null: an empty string means "not provided".
//! Every list defaults to empty. Wire names follow the site's JSON
//! (`profile` for the summary, `languages` for spoken languages).

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileRecord {
    pub personal: PersonalInfo,
    #[serde(rename = "profile")]
    pub profile_summary: String,
    pub about: AboutContent,
    pub skills: Vec<Skill>,
    pub education: Vec<Education>,
    pub certificates: Vec<Certificate>,
    pub experience: Vec<Experience>,
    pub projects: Vec<Project>,
    #[serde(rename = "languages")]
    pub languages_spoken: Vec<SpokenLanguage>,
}

impl ProfileRecord {
    /// The all-empty baseline demo overrides are merged onto.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Best display name: full name, then short name.
    pub fn display_name(&self) -> Option<&str> {
        [&self.personal.full_name, &self.personal.name]
            .into_iter()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
    }

    pub fn featured_project(&self) -> Option<&Project> {
        self.projects.iter().find(|p| p.is_highlighted)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonalInfo {
    pub name: String,
    pub full_name: String,
    pub location: String,
    pub phone: String,
    pub email: String,
    pub linkedin: String,
    pub github: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AboutContent {
    pub quote: String,
    pub specialties: Vec<String>,
    pub highlights: Highlights,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Highlights {
    pub education_value: String,
    pub specialization_value: String,
    pub location_value: String,
    pub languages_value: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillCategory {
    Ai,
    #[default]
    Programming,
    Industrial,
    Technology,
}

impl SkillCategory {
    pub const ALL: [SkillCategory; 4] = [
        SkillCategory::Ai,
        SkillCategory::Programming,
        SkillCategory::Industrial,
        SkillCategory::Technology,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SkillCategory::Ai => "ai",
            SkillCategory::Programming => "programming",
            SkillCategory::Industrial => "industrial",
            SkillCategory::Technology => "technology",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SkillCategory::Ai => "Artificial Intelligence",
            SkillCategory::Programming => "Programming",
            SkillCategory::Industrial => "Industrial Engineering",
            SkillCategory::Technology => "Technology",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(raw))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skill {
    pub name: String,
    pub category: SkillCategory,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Completed,
    #[default]
    InProgress,
}

impl CompletionStatus {
    /// Lenient parse used for untrusted input: anything that is not clearly
    /// "completed" counts as in progress.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "completed" | "complete" | "done" | "finished" => CompletionStatus::Completed,
            _ => CompletionStatus::InProgress,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CompletionStatus::Completed => "completed",
            CompletionStatus::InProgress => "in progress",
        }
    }
}

/// End year of an education entry: a year or free text such as "in progress".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EndYear {
    Year(i32),
    Text(String),
}

impl Default for EndYear {
    fn default() -> Self {
        EndYear::Text(String::new())
    }
}

impl EndYear {
    pub fn is_empty(&self) -> bool {
        matches!(self, EndYear::Text(t) if t.trim().is_empty())
    }
}

impl fmt::Display for EndYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndYear::Year(y) => write!(f, "{y}"),
            EndYear::Text(t) => f.write_str(t),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Education {
    pub id: String,
    pub title: String,
    pub institution: String,
    pub start_year: Option<i32>,
    pub end_year: EndYear,
    pub status: CompletionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CertificateCategory {
    Master,
    Specialization,
    #[default]
    Technical,
    Languages,
    Programming,
}

impl CertificateCategory {
    pub const ALL: [CertificateCategory; 5] = [
        CertificateCategory::Master,
        CertificateCategory::Specialization,
        CertificateCategory::Technical,
        CertificateCategory::Languages,
        CertificateCategory::Programming,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CertificateCategory::Master => "master",
            CertificateCategory::Specialization => "specialization",
            CertificateCategory::Technical => "technical",
            CertificateCategory::Languages => "languages",
            CertificateCategory::Programming => "programming",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(raw))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Certificate {
    pub id: String,
    pub name: String,
    pub institution: String,
    pub period: String,
    pub status: CompletionStatus,
    pub description: String,
    pub category: CertificateCategory,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Experience {
    pub id: String,
    pub company: String,
    pub position: String,
    pub location: String,
    pub start_period: String,
    pub end_period: String,
    pub responsibilities: Vec<String>,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub project_type: String,
    pub year: Option<i32>,
    pub short_description: String,
    pub long_description: String,
    pub features: Vec<String>,
    pub technologies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_highlighted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpokenLanguage {
    pub id: String,
    pub name: String,
    pub level: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certification: Option<String>,
    pub description: String,
}

/// Partial profile supplied by a demo visitor or a per-language catalog entry.
/// `None` means "absent"; see [`crate::profile::merge`] for precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personal: Option<PersonalOverride>,
    #[serde(rename = "profile", skip_serializing_if = "Option::is_none")]
    pub profile_summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<AboutOverride>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skills: Option<Vec<Skill>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education: Option<Vec<Education>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificates: Option<Vec<Certificate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<Vec<Experience>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<Project>>,
    #[serde(rename = "languages", skip_serializing_if = "Option::is_none")]
    pub languages_spoken: Option<Vec<SpokenLanguage>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonalOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AboutOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialties: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlights: Option<HighlightsOverride>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HighlightsOverride {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub education_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub languages_value: Option<String>,
}
