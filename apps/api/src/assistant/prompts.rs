//! Prompt construction for every assistant task.
//!
//! A prompt is assembled from fixed blocks in a fixed order:
//! role, response language, grounding rule, data, output schema (structured
//! tasks only), then task directives as a flat dash list. Building a prompt
//! never touches the network.

use crate::assistant::render::{self, Detail};
use crate::assistant::validation::Section;
use crate::language::LanguageCode;
use crate::llm_client::prompts::{
    GROUNDING_INSTRUCTION, JSON_ONLY_INSTRUCTION, RULES_HEADING, SCHEMA_HEADING,
};
use crate::profile::models::ProfileRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind<'a> {
    ChatSystemPrompt,
    ResumeAnalysis,
    InsightGeneration,
    SkillRecommendation,
    SectionQuestionAnswering(Section),
    DemoCvExtraction { cv_text: &'a str },
}

impl TaskKind<'_> {
    /// Tasks whose reply is decoded as JSON downstream.
    pub fn requires_schema(&self) -> bool {
        matches!(
            self,
            TaskKind::ResumeAnalysis
                | TaskKind::InsightGeneration
                | TaskKind::SkillRecommendation
                | TaskKind::DemoCvExtraction { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::ChatSystemPrompt => "chat",
            TaskKind::ResumeAnalysis => "resume-analysis",
            TaskKind::InsightGeneration => "insights",
            TaskKind::SkillRecommendation => "skill-recommendation",
            TaskKind::SectionQuestionAnswering(_) => "section-qa",
            TaskKind::DemoCvExtraction { .. } => "demo-cv-extraction",
        }
    }
}

const RESUME_ANALYSIS_SCHEMA: &str = r#"{
  "completenessScore": <integer 0-100>,
  "sections": {
    "personal": { "score": <0-100>, "feedback": "<comment>" },
    "profile": { "score": <0-100>, "feedback": "<comment>" },
    "education": { "score": <0-100>, "feedback": "<comment>" },
    "experience": { "score": <0-100>, "feedback": "<comment>" },
    "skills": { "score": <0-100>, "feedback": "<comment>" },
    "certificates": { "score": <0-100>, "feedback": "<comment>" },
    "projects": { "score": <0-100>, "feedback": "<comment>" }
  },
  "gaps": ["<gap>"],
  "strengths": ["<strength>"],
  "improvements": ["<improvement>"],
  "atsCompatibility": <integer 0-100>,
  "overallFeedback": "<overall feedback>"
}"#;

const INSIGHTS_SCHEMA: &str = r#"{
  "careerScore": <integer 0-100>,
  "strengths": ["<strength>"],
  "uniqueValue": "<unique value proposition in one sentence>",
  "marketFit": "<how the profile fits the current market>",
  "recommendations": ["<recommendation>"],
  "skillsRadar": {
    "ai": <0-100>,
    "programming": <0-100>,
    "industrial": <0-100>,
    "softSkills": <0-100>,
    "languages": <0-100>
  },
  "careerPaths": ["<career path>"]
}"#;

const SKILL_RECOMMENDATION_SCHEMA: &str = r#"{
  "recommendedSkills": [
    {
      "name": "<skill name>",
      "reason": "<why it complements the current skills>",
      "difficulty": "easy|medium|hard",
      "timeToLearn": "<estimated time>",
      "resources": ["<resource>"]
    }
  ],
  "marketTrends": ["<trend>"],
  "careerAdvice": "<general career advice>"
}"#;

const CV_EXTRACTION_SCHEMA: &str = r#"{
  "personal": {
    "name": "", "fullName": "", "location": "", "phone": "",
    "email": "", "linkedin": "", "github": ""
  },
  "profile": "",
  "about": {
    "quote": "",
    "specialties": [""],
    "highlights": {
      "educationValue": "", "specializationValue": "",
      "locationValue": "", "languagesValue": ""
    }
  },
  "skills": [{"name": "", "category": "ai|programming|industrial|technology"}],
  "education": [{"id": "demo-edu-1", "title": "", "institution": "", "startYear": null, "endYear": "", "status": "completed|in_progress", "description": ""}],
  "certificates": [{"id": "demo-cert-1", "name": "", "institution": "", "period": "", "status": "completed|in_progress", "description": "", "category": "master|specialization|technical|languages|programming"}],
  "experience": [{"id": "demo-exp-1", "company": "", "position": "", "location": "", "startPeriod": "", "endPeriod": "", "responsibilities": [""], "skills": [""]}],
  "projects": [{"id": "demo-project-1", "name": "", "type": "", "year": null, "shortDescription": "", "longDescription": "", "features": [""], "technologies": [""]}],
  "languages": [{"id": "demo-lang-1", "name": "", "level": "", "description": ""}]
}"#;

fn subject(profile: &ProfileRecord) -> &str {
    profile.display_name().unwrap_or("the candidate")
}

fn role(task: &TaskKind<'_>, profile: &ProfileRecord) -> String {
    let name = subject(profile);
    match task {
        TaskKind::ChatSystemPrompt => format!(
            "You are the virtual assistant on the portfolio website of {name}. \
             You answer visitors' questions about {name} in a friendly, professional and concise way."
        ),
        TaskKind::ResumeAnalysis => format!(
            "You are an HR and recruitment expert. Analyze the CV of {name} and provide a detailed, \
             section-by-section assessment."
        ),
        TaskKind::InsightGeneration => format!(
            "You are a career development expert specialized in CV analysis. \
             Produce professional insights about the profile of {name}."
        ),
        TaskKind::SkillRecommendation => format!(
            "You are a career development and technology expert. Review the current skills of {name} \
             and recommend complementary skills that would strengthen the profile."
        ),
        TaskKind::SectionQuestionAnswering(section) => format!(
            "You are an assistant that answers specific questions about the {} section of the CV of {name}.",
            section.as_str()
        ),
        TaskKind::DemoCvExtraction { .. } => {
            "You are an expert CV parser. Extract the information from the CV text below into structured data."
                .to_string()
        }
    }
}

fn data_block(task: &TaskKind<'_>, profile: &ProfileRecord) -> String {
    match task {
        TaskKind::ChatSystemPrompt => {
            format!("PROFILE DATA:\n{}", render::full_profile(profile))
        }
        TaskKind::ResumeAnalysis => {
            let mut out = String::from("CV SUMMARY:\nPERSONAL INFORMATION:\n");
            render::contact_presence(&mut out, &profile.personal);
            out.push_str(&format!("\nPROFILE:\n{}\n", profile.profile_summary.trim()));
            out.push_str(&format!("\nEDUCATION ({} entries):\n", profile.education.len()));
            render::education(&mut out, &profile.education, Detail::Summary);
            out.push_str(&format!("\nEXPERIENCE ({} positions):\n", profile.experience.len()));
            render::experience(&mut out, &profile.experience, Detail::Summary);
            out.push_str(&format!(
                "\nSKILLS ({}):\n{}\n",
                profile.skills.len(),
                render::skill_names(&profile.skills)
            ));
            out.push_str(&format!("\nCERTIFICATES ({}):\n", profile.certificates.len()));
            render::certificates(&mut out, &profile.certificates);
            out.push_str(&format!("\nPROJECTS ({}):\n", profile.projects.len()));
            render::projects(&mut out, &profile.projects, Detail::Summary);
            out
        }
        TaskKind::InsightGeneration => {
            let mut out = String::from("PROFILE:\n");
            render::personal(&mut out, &profile.personal);
            out.push_str(&format!("\nSUMMARY:\n{}\n", profile.profile_summary.trim()));
            out.push_str("\nSKILLS:\n");
            render::skills(&mut out, &profile.skills);
            out.push_str("\nEDUCATION:\n");
            render::education(&mut out, &profile.education, Detail::Summary);
            out.push_str("\nEXPERIENCE:\n");
            render::experience(&mut out, &profile.experience, Detail::Summary);
            out.push_str(&format!(
                "\nCertificates: {}\nProjects: {}\nLanguages:\n",
                profile.certificates.len(),
                profile.projects.len()
            ));
            render::languages(&mut out, &profile.languages_spoken);
            out
        }
        TaskKind::SkillRecommendation => {
            let mut out = String::from("CURRENT SKILLS:\n");
            render::skills(&mut out, &profile.skills);
            out.push_str(&format!("\nPROFILE:\n{}\n", profile.profile_summary.trim()));
            if !profile.about.specialties.is_empty() {
                out.push_str(&format!(
                    "Specialties: {}\n",
                    profile.about.specialties.join(", ")
                ));
            }
            out
        }
        TaskKind::SectionQuestionAnswering(section) => {
            let mut out = format!("{} OF {}:\n", section.as_str().to_uppercase(), subject(profile));
            match section {
                Section::Skills => render::skills(&mut out, &profile.skills),
                Section::Projects => render::projects(&mut out, &profile.projects, Detail::Full),
                Section::Experience => {
                    render::experience(&mut out, &profile.experience, Detail::Full)
                }
                Section::Education => {
                    render::education(&mut out, &profile.education, Detail::Full)
                }
            }
            out
        }
        TaskKind::DemoCvExtraction { cv_text } => format!("CV TEXT:\n{cv_text}"),
    }
}

fn schema(task: &TaskKind<'_>) -> Option<&'static str> {
    match task {
        TaskKind::ResumeAnalysis => Some(RESUME_ANALYSIS_SCHEMA),
        TaskKind::InsightGeneration => Some(INSIGHTS_SCHEMA),
        TaskKind::SkillRecommendation => Some(SKILL_RECOMMENDATION_SCHEMA),
        TaskKind::DemoCvExtraction { .. } => Some(CV_EXTRACTION_SCHEMA),
        TaskKind::ChatSystemPrompt | TaskKind::SectionQuestionAnswering(_) => None,
    }
}

fn task_rules(task: &TaskKind<'_>, profile: &ProfileRecord) -> Vec<String> {
    let name = subject(profile);
    let mut rules: Vec<String> = match task {
        TaskKind::ChatSystemPrompt => vec![
            "Be concise but informative: 2 to 4 sentences per answer.".to_string(),
            "Keep a professional but friendly tone.".to_string(),
            "If asked how to get in touch, share the email and LinkedIn listed in the data, if any."
                .to_string(),
            format!("If asked why to hire {name}, highlight the combination of skills shown in the data."),
            format!("If you do not know something, offer the contact details of {name} for more details."),
            "You may point visitors to the relevant portfolio section for more information.".to_string(),
        ],
        TaskKind::ResumeAnalysis => vec![
            "Scores are integers from 0 to 100.".to_string(),
            "Missing or empty sections lower their score; say what is missing in the feedback.".to_string(),
            "Keep feedback constructive and specific.".to_string(),
            "List at most 3 improvements.".to_string(),
        ],
        TaskKind::InsightGeneration => vec![
            "Use only positive, professional framing.".to_string(),
            "Do not discuss compensation, salary or pay ranges.".to_string(),
            "Limit strengths, recommendations and careerPaths to 3 items each.".to_string(),
        ],
        TaskKind::SkillRecommendation => vec![
            "Recommend 3 to 5 skills that are not already listed.".to_string(),
            "Limit resources to 2 per skill.".to_string(),
            "Limit marketTrends to 3 items.".to_string(),
        ],
        TaskKind::SectionQuestionAnswering(section) => vec![
            format!("Answer only about the {} section.", section.as_str()),
            "Answer concisely and professionally, in 2 to 3 sentences at most.".to_string(),
            "If the detail is not in the data, say that you do not have that information.".to_string(),
        ],
        TaskKind::DemoCvExtraction { .. } => vec![
            "If a field is missing, return an empty string or an empty array.".to_string(),
            "Limit each array to a maximum of 2 items.".to_string(),
            "Use only the category and status values listed in the schema.".to_string(),
        ],
    };

    if let Some(project) = profile.featured_project() {
        if matches!(task, TaskKind::ChatSystemPrompt) {
            rules.push(format!(
                "If asked about projects, feature \"{}\" as the main achievement.",
                project.name
            ));
        }
    }
    rules
}

/// Builds the full prompt text for `task`.
///
/// `extra_rules` are appended after the task's own directives; blank entries
/// are dropped. For demo extraction the profile argument is not rendered:
/// the CV text is the only data.
pub fn build_prompt(
    task: TaskKind<'_>,
    profile: &ProfileRecord,
    language: LanguageCode,
    extra_rules: &[String],
) -> String {
    let mut out = String::with_capacity(4096);

    out.push_str(&role(&task, profile));
    out.push_str("\n\n");

    out.push_str(&format!(
        "LANGUAGE: {} (reply in {} only)\n\n",
        language.instruction(),
        language.english_name()
    ));

    out.push_str(GROUNDING_INSTRUCTION);
    out.push_str("\n\n");

    out.push_str(data_block(&task, profile).trim_end());
    out.push_str("\n\n");

    if let Some(schema) = schema(&task) {
        out.push_str(SCHEMA_HEADING);
        out.push_str(":\n");
        out.push_str(schema);
        out.push('\n');
        out.push_str(JSON_ONLY_INSTRUCTION);
        out.push_str("\n\n");
    }

    out.push_str(RULES_HEADING);
    out.push_str(":\n");
    let extras = extra_rules
        .iter()
        .map(|r| r.trim())
        .filter(|r| !r.is_empty())
        .map(str::to_string);
    for rule in task_rules(&task, profile).into_iter().chain(extras) {
        out.push_str("- ");
        out.push_str(&rule);
        out.push('\n');
    }

    out
}
