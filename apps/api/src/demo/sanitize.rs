//! Turns untrusted CV JSON (model output or a visitor's saved session) into a
//! well-formed `ProfileOverride`.
//!
//! Never fails on field-level problems: bad values are coerced, defaulted or
//! dropped. Only a non-object root is rejected.

use std::collections::HashSet;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::profile::models::{
    AboutOverride, Certificate, CertificateCategory, CompletionStatus, Education, EndYear,
    Experience, HighlightsOverride, PersonalOverride, ProfileOverride, Project, Skill,
    SkillCategory, SpokenLanguage,
};

const MAX_SHORT_CHARS: usize = 200;
const MAX_LONG_CHARS: usize = 2000;
const MAX_ID_CHARS: usize = 64;
const MAX_ENTRIES: usize = 20;
const MAX_TAGS: usize = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SanitizeError {
    #[error("expected a JSON object")]
    NotAnObject,
}

/// Trims, strips control characters (newlines survive) and caps length.
fn clean(raw: &str, max: usize) -> String {
    let kept: String = raw
        .trim()
        .chars()
        .filter(|c| *c == '\n' || !c.is_control())
        .take(max)
        .collect();
    kept.trim().to_string()
}

fn scalar_text(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s),
        _ => None,
    }
}

/// `Some` when the key holds a string or a number, even if it cleans to empty.
fn text(obj: &Map<String, Value>, key: &str, max: usize) -> Option<String> {
    match obj.get(key)? {
        Value::Number(n) => Some(n.to_string()),
        value => scalar_text(value).map(|s| clean(s, max)),
    }
}

fn text_or_empty(obj: &Map<String, Value>, key: &str, max: usize) -> String {
    text(obj, key, max).unwrap_or_default()
}

fn tags(obj: &Map<String, Value>, key: &str) -> Vec<String> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(scalar_text)
                .map(|s| clean(s, MAX_SHORT_CHARS))
                .filter(|s| !s.is_empty())
                .take(MAX_TAGS)
                .collect()
        })
        .unwrap_or_default()
}

fn year(value: Option<&Value>) -> Option<i32> {
    let year = match value? {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }?;
    (1000..=9999).contains(&year).then_some(year)
}

fn end_year(value: Option<&Value>) -> EndYear {
    if let Some(y) = year(value) {
        return EndYear::Year(y);
    }
    match value {
        Some(Value::String(s)) => EndYear::Text(clean(s, MAX_SHORT_CHARS)),
        _ => EndYear::default(),
    }
}

/// Hands out entry ids that are unique within one list. A supplied id is
/// kept unless an earlier entry already took it; otherwise the id becomes
/// `demo-<kind>-<n>`, starting at the entry's slot and bumping past taken ones.
struct EntryIds {
    kind: &'static str,
    slot: usize,
    seen: HashSet<String>,
}

impl EntryIds {
    fn new(kind: &'static str) -> Self {
        Self {
            kind,
            slot: 0,
            seen: HashSet::new(),
        }
    }

    fn assign(&mut self, obj: &Map<String, Value>) -> String {
        let supplied = text(obj, "id", MAX_ID_CHARS)
            .filter(|id| !id.is_empty() && !self.seen.contains(id));
        let id = supplied.unwrap_or_else(|| {
            (self.slot..)
                .map(|n| format!("demo-{}-{n}", self.kind))
                .find(|candidate| !self.seen.contains(candidate))
                .unwrap_or_default()
        });
        self.seen.insert(id.clone());
        id
    }
}

/// Sanitises each object of an array with `build`, numbering kept entries
/// from 1. `None` when the key is absent or not an array.
fn entries<T>(
    obj: &Map<String, Value>,
    key: &str,
    kind: &'static str,
    build: impl Fn(&Map<String, Value>, &mut EntryIds) -> Option<T>,
) -> Option<Vec<T>> {
    let items = obj.get(key)?.as_array()?;
    let mut ids = EntryIds::new(kind);
    let mut out = Vec::new();
    for item in items.iter().filter_map(Value::as_object) {
        if out.len() == MAX_ENTRIES {
            break;
        }
        ids.slot = out.len() + 1;
        if let Some(entry) = build(item, &mut ids) {
            out.push(entry);
        }
    }
    Some(out)
}

fn personal(obj: &Map<String, Value>) -> PersonalOverride {
    PersonalOverride {
        name: text(obj, "name", MAX_SHORT_CHARS),
        full_name: text(obj, "fullName", MAX_SHORT_CHARS),
        location: text(obj, "location", MAX_SHORT_CHARS),
        phone: text(obj, "phone", MAX_SHORT_CHARS),
        email: text(obj, "email", MAX_SHORT_CHARS),
        linkedin: text(obj, "linkedin", MAX_SHORT_CHARS),
        github: text(obj, "github", MAX_SHORT_CHARS),
    }
}

fn about(obj: &Map<String, Value>) -> AboutOverride {
    AboutOverride {
        quote: text(obj, "quote", MAX_LONG_CHARS),
        specialties: obj
            .get("specialties")
            .and_then(Value::as_array)
            .map(|_| tags(obj, "specialties")),
        highlights: obj
            .get("highlights")
            .and_then(Value::as_object)
            .map(|h| HighlightsOverride {
                education_value: text(h, "educationValue", MAX_SHORT_CHARS),
                specialization_value: text(h, "specializationValue", MAX_SHORT_CHARS),
                location_value: text(h, "locationValue", MAX_SHORT_CHARS),
                languages_value: text(h, "languagesValue", MAX_SHORT_CHARS),
            }),
    }
}

fn skill(obj: &Map<String, Value>, _ids: &mut EntryIds) -> Option<Skill> {
    let name = text_or_empty(obj, "name", MAX_SHORT_CHARS);
    if name.is_empty() {
        return None;
    }
    let category = obj
        .get("category")
        .and_then(Value::as_str)
        .and_then(SkillCategory::parse)
        .unwrap_or_default();
    Some(Skill { name, category })
}

fn status(obj: &Map<String, Value>) -> CompletionStatus {
    obj.get("status")
        .and_then(Value::as_str)
        .map(CompletionStatus::parse_lenient)
        .unwrap_or_default()
}

fn education(obj: &Map<String, Value>, ids: &mut EntryIds) -> Option<Education> {
    let title = text_or_empty(obj, "title", MAX_SHORT_CHARS);
    let institution = text_or_empty(obj, "institution", MAX_SHORT_CHARS);
    if title.is_empty() && institution.is_empty() {
        return None;
    }
    Some(Education {
        id: ids.assign(obj),
        title,
        institution,
        start_year: year(obj.get("startYear")),
        end_year: end_year(obj.get("endYear")),
        status: status(obj),
        description: text(obj, "description", MAX_LONG_CHARS).filter(|d| !d.is_empty()),
    })
}

fn certificate(obj: &Map<String, Value>, ids: &mut EntryIds) -> Option<Certificate> {
    let name = text_or_empty(obj, "name", MAX_SHORT_CHARS);
    if name.is_empty() {
        return None;
    }
    Some(Certificate {
        id: ids.assign(obj),
        name,
        institution: text_or_empty(obj, "institution", MAX_SHORT_CHARS),
        period: text_or_empty(obj, "period", MAX_SHORT_CHARS),
        status: status(obj),
        description: text_or_empty(obj, "description", MAX_LONG_CHARS),
        category: obj
            .get("category")
            .and_then(Value::as_str)
            .and_then(CertificateCategory::parse)
            .unwrap_or_default(),
    })
}

fn experience(obj: &Map<String, Value>, ids: &mut EntryIds) -> Option<Experience> {
    let company = text_or_empty(obj, "company", MAX_SHORT_CHARS);
    let position = text_or_empty(obj, "position", MAX_SHORT_CHARS);
    if company.is_empty() && position.is_empty() {
        return None;
    }
    Some(Experience {
        id: ids.assign(obj),
        company,
        position,
        location: text_or_empty(obj, "location", MAX_SHORT_CHARS),
        start_period: text_or_empty(obj, "startPeriod", MAX_SHORT_CHARS),
        end_period: text_or_empty(obj, "endPeriod", MAX_SHORT_CHARS),
        responsibilities: tags(obj, "responsibilities"),
        skills: tags(obj, "skills"),
    })
}

fn project(obj: &Map<String, Value>, ids: &mut EntryIds) -> Option<Project> {
    let name = text_or_empty(obj, "name", MAX_SHORT_CHARS);
    if name.is_empty() {
        return None;
    }
    Some(Project {
        id: ids.assign(obj),
        name,
        project_type: text_or_empty(obj, "type", MAX_SHORT_CHARS),
        year: year(obj.get("year")),
        short_description: text_or_empty(obj, "shortDescription", MAX_LONG_CHARS),
        long_description: text_or_empty(obj, "longDescription", MAX_LONG_CHARS),
        features: tags(obj, "features"),
        technologies: tags(obj, "technologies"),
        impact: text(obj, "impact", MAX_LONG_CHARS).filter(|i| !i.is_empty()),
        is_highlighted: obj
            .get("isHighlighted")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

fn spoken_language(obj: &Map<String, Value>, ids: &mut EntryIds) -> Option<SpokenLanguage> {
    let name = text_or_empty(obj, "name", MAX_SHORT_CHARS);
    if name.is_empty() {
        return None;
    }
    Some(SpokenLanguage {
        id: ids.assign(obj),
        name,
        level: text_or_empty(obj, "level", MAX_SHORT_CHARS),
        certification: text(obj, "certification", MAX_SHORT_CHARS).filter(|c| !c.is_empty()),
        description: text_or_empty(obj, "description", MAX_LONG_CHARS),
    })
}

pub fn sanitize_profile(raw: &Value) -> Result<ProfileOverride, SanitizeError> {
    let obj = raw.as_object().ok_or(SanitizeError::NotAnObject)?;

    Ok(ProfileOverride {
        personal: obj.get("personal").and_then(Value::as_object).map(personal),
        profile_summary: text(obj, "profile", MAX_LONG_CHARS),
        about: obj.get("about").and_then(Value::as_object).map(about),
        skills: entries(obj, "skills", "skill", skill),
        education: entries(obj, "education", "edu", education),
        certificates: entries(obj, "certificates", "cert", certificate),
        experience: entries(obj, "experience", "exp", experience),
        projects: entries(obj, "projects", "project", project),
        languages_spoken: entries(obj, "languages", "lang", spoken_language),
    })
}
