//! Field-level merge of a partial override onto a complete profile.
//!
//! Precedence, per top-level field:
//! - `personal`, `about`, `about.highlights`: shallow merge, present sub-fields win.
//! - `profile`: replaced whenever present, including the empty string.
//! - lists: replaced wholesale only by a non-empty override list.

use crate::profile::models::{
    AboutContent, AboutOverride, Highlights, HighlightsOverride, PersonalInfo, PersonalOverride,
    ProfileOverride, ProfileRecord,
};

/// Returns a new record; neither input is modified.
pub fn merge(base: &ProfileRecord, overlay: Option<&ProfileOverride>) -> ProfileRecord {
    let Some(overlay) = overlay else {
        return base.clone();
    };

    ProfileRecord {
        personal: merge_personal(&base.personal, overlay.personal.as_ref()),
        profile_summary: overlay
            .profile_summary
            .clone()
            .unwrap_or_else(|| base.profile_summary.clone()),
        about: merge_about(&base.about, overlay.about.as_ref()),
        skills: pick_list(&base.skills, overlay.skills.as_deref()),
        education: pick_list(&base.education, overlay.education.as_deref()),
        certificates: pick_list(&base.certificates, overlay.certificates.as_deref()),
        experience: pick_list(&base.experience, overlay.experience.as_deref()),
        projects: pick_list(&base.projects, overlay.projects.as_deref()),
        languages_spoken: pick_list(&base.languages_spoken, overlay.languages_spoken.as_deref()),
    }
}

fn pick_list<T: Clone>(base: &[T], overlay: Option<&[T]>) -> Vec<T> {
    match overlay {
        Some(items) if !items.is_empty() => items.to_vec(),
        _ => base.to_vec(),
    }
}

fn pick(base: &str, overlay: Option<&String>) -> String {
    overlay.cloned().unwrap_or_else(|| base.to_string())
}

fn merge_personal(base: &PersonalInfo, overlay: Option<&PersonalOverride>) -> PersonalInfo {
    let Some(o) = overlay else {
        return base.clone();
    };
    PersonalInfo {
        name: pick(&base.name, o.name.as_ref()),
        full_name: pick(&base.full_name, o.full_name.as_ref()),
        location: pick(&base.location, o.location.as_ref()),
        phone: pick(&base.phone, o.phone.as_ref()),
        email: pick(&base.email, o.email.as_ref()),
        linkedin: pick(&base.linkedin, o.linkedin.as_ref()),
        github: pick(&base.github, o.github.as_ref()),
    }
}

fn merge_about(base: &AboutContent, overlay: Option<&AboutOverride>) -> AboutContent {
    let Some(o) = overlay else {
        return base.clone();
    };
    AboutContent {
        quote: pick(&base.quote, o.quote.as_ref()),
        specialties: o
            .specialties
            .clone()
            .unwrap_or_else(|| base.specialties.clone()),
        highlights: merge_highlights(&base.highlights, o.highlights.as_ref()),
    }
}

fn merge_highlights(base: &Highlights, overlay: Option<&HighlightsOverride>) -> Highlights {
    let Some(o) = overlay else {
        return base.clone();
    };
    Highlights {
        education_value: pick(&base.education_value, o.education_value.as_ref()),
        specialization_value: pick(&base.specialization_value, o.specialization_value.as_ref()),
        location_value: pick(&base.location_value, o.location_value.as_ref()),
        languages_value: pick(&base.languages_value, o.languages_value.as_ref()),
    }
}
