//! Response languages supported by the assistant.
//!
//! Invalid or missing codes never fail a request: they resolve to the
//! fallback language (`es`).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    #[default]
    Es,
    En,
    Pt,
    De,
    Fr,
    Zh,
    Ja,
    Ar,
    Hi,
    Ko,
}

impl LanguageCode {
    pub const ALL: [LanguageCode; 10] = [
        LanguageCode::Es,
        LanguageCode::En,
        LanguageCode::Pt,
        LanguageCode::De,
        LanguageCode::Fr,
        LanguageCode::Zh,
        LanguageCode::Ja,
        LanguageCode::Ar,
        LanguageCode::Hi,
        LanguageCode::Ko,
    ];

    pub fn code(self) -> &'static str {
        match self {
            LanguageCode::Es => "es",
            LanguageCode::En => "en",
            LanguageCode::Pt => "pt",
            LanguageCode::De => "de",
            LanguageCode::Fr => "fr",
            LanguageCode::Zh => "zh",
            LanguageCode::Ja => "ja",
            LanguageCode::Ar => "ar",
            LanguageCode::Hi => "hi",
            LanguageCode::Ko => "ko",
        }
    }

    /// Strict parse. Case-insensitive, surrounding whitespace ignored.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(raw))
    }

    /// Total parse: anything unrecognised becomes the fallback language.
    pub fn parse_or_default(raw: Option<&str>) -> Self {
        raw.and_then(Self::parse).unwrap_or_default()
    }

    /// Natural-language instruction telling the model which language to answer in.
    pub fn instruction(self) -> &'static str {
        match self {
            LanguageCode::Es => "Responde siempre en español.",
            LanguageCode::En => "Always respond in English.",
            LanguageCode::Pt => "Responda sempre em português.",
            LanguageCode::De => "Antworte immer auf Deutsch.",
            LanguageCode::Fr => "Réponds toujours en français.",
            LanguageCode::Zh => "请始终用中文回答。",
            LanguageCode::Ja => "常に日本語で回答してください。",
            LanguageCode::Ar => "أجب دائمًا باللغة العربية.",
            LanguageCode::Hi => "हमेशा हिंदी में जवाब दें।",
            LanguageCode::Ko => "항상 한국어로 답변하세요.",
        }
    }

    pub fn english_name(self) -> &'static str {
        match self {
            LanguageCode::Es => "Spanish",
            LanguageCode::En => "English",
            LanguageCode::Pt => "Portuguese",
            LanguageCode::De => "German",
            LanguageCode::Fr => "French",
            LanguageCode::Zh => "Chinese",
            LanguageCode::Ja => "Japanese",
            LanguageCode::Ar => "Arabic",
            LanguageCode::Hi => "Hindi",
            LanguageCode::Ko => "Korean",
        }
    }
}

/// Serde adapter for request bodies: accepts any JSON value and falls back
/// to the default language instead of rejecting the request.
pub fn deserialize_lenient<'de, D>(deserializer: D) -> Result<LanguageCode, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(LanguageCode::parse_or_default(
        value.as_ref().and_then(Value::as_str),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Body {
        #[serde(default, deserialize_with = "deserialize_lenient")]
        language: LanguageCode,
    }

    #[test]
    fn test_parse_known_codes() {
        assert_eq!(LanguageCode::parse("en"), Some(LanguageCode::En));
        assert_eq!(LanguageCode::parse(" KO "), Some(LanguageCode::Ko));
        assert_eq!(LanguageCode::parse("xx"), None);
    }

    #[test]
    fn test_every_code_round_trips_through_parse() {
        for lang in LanguageCode::ALL {
            assert_eq!(LanguageCode::parse(lang.code()), Some(lang));
        }
    }

    #[test]
    fn test_invalid_language_defaults_silently() {
        let body: Body = serde_json::from_str(r#"{"language": "klingon"}"#).unwrap();
        assert_eq!(body.language, LanguageCode::Es);

        let body: Body = serde_json::from_str(r#"{"language": 42}"#).unwrap();
        assert_eq!(body.language, LanguageCode::Es);

        let body: Body = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(body.language, LanguageCode::Es);

        let body: Body = serde_json::from_str(r#"{"language": "fr"}"#).unwrap();
        assert_eq!(body.language, LanguageCode::Fr);
    }

    #[test]
    fn test_english_instruction_text() {
        assert_eq!(LanguageCode::En.instruction(), "Always respond in English.");
    }
}
