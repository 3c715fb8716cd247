//! Read-only summary card shown after a demo CV is generated.

use serde::Serialize;

use crate::profile::ProfileRecord;
use crate::text::period;

const PREVIEW_SKILLS: usize = 6;
const PREVIEW_HIGHLIGHTS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Preview {
    pub full_name: String,
    pub headline: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub linkedin: String,
    pub github: String,
    pub summary: String,
    pub skills: Vec<String>,
    pub experience: Option<PreviewExperience>,
    pub education: Option<PreviewEducation>,
    /// Watermark flag: the preview cannot be edited in place.
    pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewExperience {
    pub position: String,
    pub company: String,
    pub period: String,
    pub highlights: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewEducation {
    pub title: String,
    pub institution: String,
    pub period: String,
}

pub fn build_preview(record: &ProfileRecord) -> Preview {
    let personal = &record.personal;
    let full_name = match (personal.full_name.trim(), personal.name.trim()) {
        ("", name) => name.to_string(),
        (full, _) => full.to_string(),
    };

    Preview {
        full_name,
        headline: record.about.highlights.specialization_value.clone(),
        email: personal.email.clone(),
        phone: personal.phone.clone(),
        location: personal.location.clone(),
        linkedin: personal.linkedin.clone(),
        github: personal.github.clone(),
        summary: record.profile_summary.clone(),
        skills: record
            .skills
            .iter()
            .take(PREVIEW_SKILLS)
            .map(|s| s.name.clone())
            .collect(),
        experience: record.experience.first().map(|e| PreviewExperience {
            position: e.position.clone(),
            company: e.company.clone(),
            period: period(&e.start_period, &e.end_period),
            highlights: e
                .responsibilities
                .iter()
                .take(PREVIEW_HIGHLIGHTS)
                .cloned()
                .collect(),
        }),
        education: record.education.first().map(|e| PreviewEducation {
            title: e.title.clone(),
            institution: e.institution.clone(),
            period: period(
                &e.start_year.map(|y| y.to_string()).unwrap_or_default(),
                &e.end_year.to_string(),
            ),
        }),
        read_only: true,
    }
}
