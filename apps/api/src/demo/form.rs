use serde::Deserialize;

use crate::errors::{AppError, ErrorCode};
use crate::profile::models::{
    AboutOverride, CompletionStatus, Education, EndYear, Experience, HighlightsOverride,
    PersonalOverride, ProfileOverride, Skill, SkillCategory,
};

const MAX_FORM_SKILLS: usize = 8;
const MAX_EXPERIENCE_HIGHLIGHTS: usize = 3;
const MAX_EXPERIENCE_SKILLS: usize = 4;

// Placeholders for optional fields left blank.
const DEFAULT_CITY: &str = "Your city";
const DEFAULT_LINKEDIN: &str = "linkedin.com/in/your-profile";
const DEFAULT_GITHUB: &str = "github.com/your-profile";
const DEFAULT_LANGUAGES: &str = "English";
const DEFAULT_COMPANY: &str = "Your company";
const DEFAULT_REMOTE: &str = "Remote";
const DEFAULT_START: &str = "2023";
const DEFAULT_CURRENT: &str = "Present";
const DEFAULT_EDUCATION: &str = "Your degree";
const DEFAULT_SPECIALIZATION: &str = "Your specialization";
const DEFAULT_INSTITUTION: &str = "Your institution";
const DEFAULT_END_YEAR: i32 = 2026;
const DEFAULT_TRAINING_DESCRIPTION: &str = "Training in progress.";

/// Answers collected by the guided demo form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DemoForm {
    pub full_name: String,
    pub email: String,
    pub location: String,
    pub linkedin: String,
    pub github: String,
    pub title: String,
    pub profile: String,
    /// Comma-separated.
    pub skills: String,
    pub experience_company: String,
    pub experience_role: String,
    pub experience_period: String,
    /// One highlight per line.
    pub experience_highlights: String,
    pub education_title: String,
    pub education_institution: String,
    pub education_period: String,
}

fn or_default(value: &str, default: &str) -> String {
    match value.trim() {
        "" => default.to_string(),
        v => v.to_string(),
    }
}

fn require(value: &str, field: &str) -> Result<String, AppError> {
    match value.trim() {
        "" => Err(AppError::validation(
            ErrorCode::InvalidRequest,
            format!("{field} is required"),
        )),
        v => Ok(v.to_string()),
    }
}

impl DemoForm {
    pub fn into_override(self) -> Result<ProfileOverride, AppError> {
        let full_name = require(&self.full_name, "fullName")?;
        let email = require(&self.email, "email")?;
        let summary = require(&self.profile, "profile")?;

        let skills: Vec<Skill> = self
            .skills
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .take(MAX_FORM_SKILLS)
            .map(|name| Skill {
                name: name.to_string(),
                category: SkillCategory::Programming,
            })
            .collect();
        if skills.is_empty() {
            return Err(AppError::validation(
                ErrorCode::InvalidRequest,
                "skills is required",
            ));
        }
        let skill_names: Vec<String> = skills.iter().map(|s| s.name.clone()).collect();

        let first_name = full_name
            .split_whitespace()
            .next()
            .unwrap_or(&full_name)
            .to_string();
        let location = self.location.trim();

        let experience = match self.experience_role.trim() {
            "" => Vec::new(),
            role => vec![Experience {
                id: "demo-exp-1".to_string(),
                company: or_default(&self.experience_company, DEFAULT_COMPANY),
                position: role.to_string(),
                location: or_default(location, DEFAULT_REMOTE),
                start_period: or_default(&self.experience_period, DEFAULT_START),
                end_period: DEFAULT_CURRENT.to_string(),
                responsibilities: self
                    .experience_highlights
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .take(MAX_EXPERIENCE_HIGHLIGHTS)
                    .map(str::to_string)
                    .collect(),
                skills: skill_names
                    .iter()
                    .take(MAX_EXPERIENCE_SKILLS)
                    .cloned()
                    .collect(),
            }],
        };

        let education = match self.education_title.trim() {
            "" => Vec::new(),
            title => {
                let period = self.education_period.trim();
                let end_year = match period.parse::<i32>() {
                    Ok(year) => EndYear::Year(year),
                    Err(_) if period.is_empty() => EndYear::Year(DEFAULT_END_YEAR),
                    Err(_) => EndYear::Text(period.to_string()),
                };
                vec![Education {
                    id: "demo-edu-1".to_string(),
                    title: title.to_string(),
                    institution: or_default(&self.education_institution, DEFAULT_INSTITUTION),
                    start_year: None,
                    end_year,
                    status: CompletionStatus::InProgress,
                    description: Some(DEFAULT_TRAINING_DESCRIPTION.to_string()),
                }]
            }
        };

        Ok(ProfileOverride {
            personal: Some(PersonalOverride {
                name: Some(first_name),
                full_name: Some(full_name),
                location: Some(or_default(location, DEFAULT_CITY)),
                phone: Some(String::new()),
                email: Some(email),
                linkedin: Some(or_default(&self.linkedin, DEFAULT_LINKEDIN)),
                github: Some(or_default(&self.github, DEFAULT_GITHUB)),
            }),
            profile_summary: Some(summary.clone()),
            about: Some(AboutOverride {
                quote: Some(summary),
                specialties: Some(skill_names),
                highlights: Some(HighlightsOverride {
                    education_value: Some(or_default(&self.education_title, DEFAULT_EDUCATION)),
                    specialization_value: Some(or_default(&self.title, DEFAULT_SPECIALIZATION)),
                    location_value: Some(or_default(location, DEFAULT_CITY)),
                    languages_value: Some(DEFAULT_LANGUAGES.to_string()),
                }),
            }),
            skills: Some(skills),
            education: Some(education),
            certificates: Some(Vec::new()),
            experience: Some(experience),
            projects: Some(Vec::new()),
            languages_spoken: Some(Vec::new()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> DemoForm {
        DemoForm {
            full_name: "Jane Doe".into(),
            email: "jane@example.com".into(),
            profile: "Data engineer.".into(),
            skills: "Python, SQL".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_required_fields() {
        for blank in ["fullName", "email", "profile", "skills"] {
            let mut form = minimal();
            match blank {
                "fullName" => form.full_name = "  ".into(),
                "email" => form.email.clear(),
                "profile" => form.profile.clear(),
                _ => form.skills = " , ,".into(),
            }
            let err = form.into_override().unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidRequest, "{blank}");
        }
    }

    #[test]
    fn test_minimal_form_uses_placeholders() {
        let overlay = minimal().into_override().unwrap();
        let personal = overlay.personal.unwrap();
        assert_eq!(personal.name.as_deref(), Some("Jane"));
        assert_eq!(personal.location.as_deref(), Some(DEFAULT_CITY));
        assert_eq!(personal.github.as_deref(), Some(DEFAULT_GITHUB));
        assert_eq!(overlay.experience, Some(vec![]));
        assert_eq!(overlay.education, Some(vec![]));
        assert_eq!(overlay.about.unwrap().specialties.unwrap(), vec!["Python", "SQL"]);
    }

    #[test]
    fn test_skills_and_highlights_capped() {
        let form = DemoForm {
            skills: "a,b,c,d,e,f,g,h,i,j".into(),
            experience_role: "Engineer".into(),
            experience_highlights: "one\n\ntwo\nthree\nfour".into(),
            education_title: "BSc".into(),
            education_period: "2024".into(),
            ..minimal()
        };
        let overlay = form.into_override().unwrap();
        assert_eq!(overlay.skills.as_ref().unwrap().len(), 8);

        let experience = &overlay.experience.unwrap()[0];
        assert_eq!(experience.id, "demo-exp-1");
        assert_eq!(experience.company, DEFAULT_COMPANY);
        assert_eq!(experience.responsibilities, vec!["one", "two", "three"]);
        assert_eq!(experience.skills, vec!["a", "b", "c", "d"]);

        let education = &overlay.education.unwrap()[0];
        assert_eq!(education.id, "demo-edu-1");
        assert_eq!(education.end_year, EndYear::Year(2024));
        assert_eq!(education.status, CompletionStatus::InProgress);
    }
}
