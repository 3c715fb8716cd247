//! Compact, human-readable text views of a profile for prompt construction.

use crate::profile::models::{
    Certificate, Education, Experience, PersonalInfo, ProfileRecord, Project, Skill,
    SkillCategory, SpokenLanguage,
};
use crate::text::period;

const NONE_PROVIDED: &str = "(none provided)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detail {
    /// One line per entry.
    Summary,
    /// Entry line plus nested facts.
    Full,
}

fn push_field(out: &mut String, label: &str, value: &str) {
    if !value.trim().is_empty() {
        out.push_str("- ");
        out.push_str(label);
        out.push_str(": ");
        out.push_str(value.trim());
        out.push('\n');
    }
}

fn push_list(out: &mut String, label: &str, items: &[String]) {
    let items: Vec<&str> = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if !items.is_empty() {
        out.push_str("  ");
        out.push_str(label);
        out.push_str(": ");
        out.push_str(&items.join(", "));
        out.push('\n');
    }
}

pub fn personal(out: &mut String, info: &PersonalInfo) {
    push_field(out, "Name", &info.name);
    push_field(out, "Full name", &info.full_name);
    push_field(out, "Location", &info.location);
    push_field(out, "Email", &info.email);
    push_field(out, "Phone", &info.phone);
    push_field(out, "LinkedIn", &info.linkedin);
    push_field(out, "GitHub", &info.github);
}

/// Contact fields as present/missing flags, without the values themselves.
pub fn contact_presence(out: &mut String, info: &PersonalInfo) {
    let flag = |v: &str| if v.trim().is_empty() { "missing" } else { "present" };
    push_field(out, "Name", &info.name);
    push_field(out, "Location", &info.location);
    for (label, value) in [
        ("Email", &info.email),
        ("Phone", &info.phone),
        ("LinkedIn", &info.linkedin),
        ("GitHub", &info.github),
    ] {
        push_field(out, label, flag(value.as_str()));
    }
}

pub fn skill_names(skills: &[Skill]) -> String {
    let names: Vec<&str> = skills
        .iter()
        .map(|s| s.name.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if names.is_empty() {
        NONE_PROVIDED.to_string()
    } else {
        names.join(", ")
    }
}

/// Skills grouped by category, in category order.
pub fn skills(out: &mut String, skills: &[Skill]) {
    if skills.is_empty() {
        out.push_str(NONE_PROVIDED);
        out.push('\n');
        return;
    }
    for category in SkillCategory::ALL {
        let names: Vec<&str> = skills
            .iter()
            .filter(|s| s.category == category)
            .map(|s| s.name.as_str())
            .collect();
        if !names.is_empty() {
            out.push_str(&format!("- {}: {}\n", category.label(), names.join(", ")));
        }
    }
}

pub fn experience(out: &mut String, entries: &[Experience], detail: Detail) {
    if entries.is_empty() {
        out.push_str(NONE_PROVIDED);
        out.push('\n');
        return;
    }
    for e in entries {
        out.push_str(&format!("- {} at {}", e.position, e.company));
        let when = period(&e.start_period, &e.end_period);
        if !when.is_empty() {
            out.push_str(&format!(" ({when})"));
        }
        out.push('\n');
        if detail == Detail::Full {
            if !e.location.trim().is_empty() {
                out.push_str(&format!("  Location: {}\n", e.location.trim()));
            }
            push_list(out, "Responsibilities", &e.responsibilities);
            push_list(out, "Skills", &e.skills);
        }
    }
}

pub fn education(out: &mut String, entries: &[Education], detail: Detail) {
    if entries.is_empty() {
        out.push_str(NONE_PROVIDED);
        out.push('\n');
        return;
    }
    for e in entries {
        out.push_str(&format!("- {} at {}", e.title, e.institution));
        let start = e.start_year.map(|y| y.to_string()).unwrap_or_default();
        let when = period(&start, &e.end_year.to_string());
        if when.is_empty() {
            out.push_str(&format!(" ({})", e.status.label()));
        } else {
            out.push_str(&format!(" ({when}, {})", e.status.label()));
        }
        out.push('\n');
        if detail == Detail::Full {
            if let Some(description) = e.description.as_deref().filter(|d| !d.trim().is_empty()) {
                out.push_str(&format!("  Description: {}\n", description.trim()));
            }
        }
    }
}

pub fn certificates(out: &mut String, entries: &[Certificate]) {
    if entries.is_empty() {
        out.push_str(NONE_PROVIDED);
        out.push('\n');
        return;
    }
    for c in entries {
        out.push_str(&format!("- {} at {}", c.name, c.institution));
        if !c.period.trim().is_empty() {
            out.push_str(&format!(" ({}, {})", c.period.trim(), c.status.label()));
        } else {
            out.push_str(&format!(" ({})", c.status.label()));
        }
        out.push('\n');
        if !c.description.trim().is_empty() {
            out.push_str(&format!("  {}\n", c.description.trim()));
        }
    }
}

pub fn projects(out: &mut String, entries: &[Project], detail: Detail) {
    if entries.is_empty() {
        out.push_str(NONE_PROVIDED);
        out.push('\n');
        return;
    }
    for p in entries {
        out.push_str(&format!("- {}", p.name));
        match (p.project_type.trim(), p.year) {
            ("", None) => {}
            (kind, None) => out.push_str(&format!(" ({kind})")),
            ("", Some(year)) => out.push_str(&format!(" ({year})")),
            (kind, Some(year)) => out.push_str(&format!(" ({kind}, {year})")),
        }
        if p.is_highlighted {
            out.push_str(" [featured]");
        }
        out.push('\n');

        let description = match detail {
            Detail::Full if !p.long_description.trim().is_empty() => &p.long_description,
            _ => &p.short_description,
        };
        if !description.trim().is_empty() {
            out.push_str(&format!("  {}\n", description.trim()));
        }
        if detail == Detail::Full {
            push_list(out, "Technologies", &p.technologies);
            push_list(out, "Features", &p.features);
            if let Some(impact) = p.impact.as_deref().filter(|i| !i.trim().is_empty()) {
                out.push_str(&format!("  Impact: {}\n", impact.trim()));
            }
        }
    }
}

pub fn languages(out: &mut String, entries: &[SpokenLanguage]) {
    if entries.is_empty() {
        out.push_str(NONE_PROVIDED);
        out.push('\n');
        return;
    }
    for l in entries {
        out.push_str(&format!("- {}: {}", l.name, l.level));
        if let Some(cert) = l.certification.as_deref().filter(|c| !c.trim().is_empty()) {
            out.push_str(&format!(" (certified: {})", cert.trim()));
        }
        out.push('\n');
    }
}

/// Every section of the profile, for open-ended conversation.
pub fn full_profile(record: &ProfileRecord) -> String {
    let mut out = String::with_capacity(4096);

    out.push_str("PERSONAL:\n");
    personal(&mut out, &record.personal);

    if !record.profile_summary.trim().is_empty() {
        out.push_str("\nPROFILE:\n");
        out.push_str(record.profile_summary.trim());
        out.push('\n');
    }

    let about = &record.about;
    let highlights = &about.highlights;
    let has_about = !about.quote.trim().is_empty()
        || !about.specialties.is_empty()
        || !highlights.specialization_value.trim().is_empty();
    if has_about {
        out.push_str("\nABOUT:\n");
        push_field(&mut out, "Quote", &about.quote);
        if !about.specialties.is_empty() {
            push_field(&mut out, "Specialties", &about.specialties.join(", "));
        }
        push_field(&mut out, "Education", &highlights.education_value);
        push_field(&mut out, "Specialization", &highlights.specialization_value);
        push_field(&mut out, "Based in", &highlights.location_value);
        push_field(&mut out, "Languages", &highlights.languages_value);
    }

    out.push_str("\nSKILLS:\n");
    skills(&mut out, &record.skills);
    out.push_str("\nEXPERIENCE:\n");
    experience(&mut out, &record.experience, Detail::Full);
    out.push_str("\nEDUCATION:\n");
    education(&mut out, &record.education, Detail::Full);
    out.push_str("\nCERTIFICATES:\n");
    certificates(&mut out, &record.certificates);
    out.push_str("\nPROJECTS:\n");
    projects(&mut out, &record.projects, Detail::Full);
    out.push_str("\nLANGUAGES:\n");
    languages(&mut out, &record.languages_spoken);

    out
}
