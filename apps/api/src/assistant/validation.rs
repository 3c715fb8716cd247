//! Request payload validation for the assistant endpoints.
//!
//! Inputs arrive as loose JSON values; everything here turns them into
//! closed types or a field-specific `AppError`.

use serde_json::Value;

use crate::errors::{AppError, ErrorCode};
use crate::llm_client::{ChatMessage, Role};
use crate::text::truncate_chars;

pub const MAX_QUESTION_CHARS: usize = 500;
pub const MAX_MESSAGE_CHARS: usize = 2000;
pub const MAX_HISTORY_MESSAGES: usize = 20;

/// Portfolio section a visitor can ask a focused question about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Skills,
    Projects,
    Experience,
    Education,
}

impl Section {
    pub const ALL: [Section; 4] = [
        Section::Skills,
        Section::Projects,
        Section::Experience,
        Section::Education,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Section::Skills => "skills",
            Section::Projects => "projects",
            Section::Experience => "experience",
            Section::Education => "education",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == raw.trim())
    }
}

pub fn validate_section(raw: Option<&Value>) -> Result<Section, AppError> {
    raw.and_then(Value::as_str)
        .and_then(Section::parse)
        .ok_or_else(|| AppError::validation(ErrorCode::InvalidSection, "unknown section"))
}

/// Trimmed, non-empty question, capped at [`MAX_QUESTION_CHARS`].
pub fn validate_question(raw: Option<&Value>) -> Result<String, AppError> {
    let question = raw
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::validation(ErrorCode::InvalidQuestion, "question is required"))?;
    Ok(truncate_chars(question, MAX_QUESTION_CHARS).to_string())
}

/// Chat history: a non-empty array of user/assistant turns with text content.
/// Content is capped at [`MAX_MESSAGE_CHARS`] and only the most recent
/// [`MAX_HISTORY_MESSAGES`] turns are kept.
pub fn validate_messages(raw: Option<&Value>) -> Result<Vec<ChatMessage>, AppError> {
    let invalid = |why: &str| AppError::validation(ErrorCode::InvalidMessages, why);

    let items = raw
        .and_then(Value::as_array)
        .ok_or_else(|| invalid("messages must be an array"))?;
    if items.is_empty() {
        return Err(invalid("messages must not be empty"));
    }

    let skip = items.len().saturating_sub(MAX_HISTORY_MESSAGES);
    items
        .iter()
        .skip(skip)
        .map(|item| {
            let role = match item.get("role").and_then(Value::as_str) {
                Some("user") => Role::User,
                Some("assistant") => Role::Assistant,
                _ => return Err(invalid("message role must be user or assistant")),
            };
            let content = item
                .get("content")
                .and_then(Value::as_str)
                .filter(|c| !c.trim().is_empty())
                .ok_or_else(|| invalid("message content must be a non-empty string"))?;
            Ok(ChatMessage::new(
                role,
                truncate_chars(content, MAX_MESSAGE_CHARS).to_string(),
            ))
        })
        .collect()
}
