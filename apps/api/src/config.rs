use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::llm_client::{LlmClientConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::rate_limit::{RateLimitConfig, RateLimitPolicy, RateLimitScope};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
const DEFAULT_MAX_CV_TEXT_CHARS: usize = 12_000;

/// Whose CV the assistant talks about.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppMode {
    /// The site owner's catalog; request overrides are ignored.
    #[default]
    Personal,
    /// Visitors may supply their own CV data per request.
    Demo,
}

impl AppMode {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "personal" => Ok(AppMode::Personal),
            "demo" => Ok(AppMode::Demo),
            other => bail!("APP_MODE must be 'personal' or 'demo', got '{other}'"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Only malformed values fail startup; a missing completion key does not.
#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_key: Option<String>,
    pub llm: LlmClientConfig,
    pub app_mode: AppMode,
    pub profile_path: Option<String>,
    pub rate_limits: RateLimitConfig,
    pub max_upload_bytes: usize,
    pub max_cv_text_chars: usize,
    /// Extra directives appended to every prompt.
    pub house_rules: Vec<String>,
    pub port: u16,
    pub rust_log: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            groq_api_key: None,
            llm: LlmClientConfig::default(),
            app_mode: AppMode::Personal,
            profile_path: None,
            rate_limits: RateLimitConfig::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_cv_text_chars: DEFAULT_MAX_CV_TEXT_CHARS,
            house_rules: Vec::new(),
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut rate_limits = RateLimitConfig::default();
        for scope in RateLimitScope::ALL {
            let key = format!("RATE_LIMIT_{}", scope.env_suffix());
            if let Some(raw) = get(&key) {
                *rate_limits.policy_mut(scope) =
                    RateLimitPolicy::parse(&raw).with_context(|| format!("{key} is invalid"))?;
            }
        }

        let app_mode = match get("APP_MODE") {
            Some(raw) => AppMode::parse(&raw)?,
            None => AppMode::default(),
        };

        Ok(Config {
            groq_api_key: get("GROQ_API_KEY").map(|k| k.trim().to_string()),
            llm: LlmClientConfig {
                base_url: get("LLM_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
                model: get("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                timeout: Duration::from_secs(parse_or(&get, "LLM_TIMEOUT_SECS", 60)?),
                max_retries: parse_or(&get, "LLM_MAX_RETRIES", 2)?,
            },
            app_mode,
            profile_path: get("PROFILE_PATH"),
            rate_limits,
            max_upload_bytes: parse_or(&get, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            max_cv_text_chars: parse_or(&get, "MAX_CV_TEXT_CHARS", DEFAULT_MAX_CV_TEXT_CHARS)?,
            house_rules: get("ASSISTANT_HOUSE_RULES")
                .map(|raw| {
                    raw.split('|')
                        .map(str::trim)
                        .filter(|r| !r.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            port: parse_or(&get, "PORT", 8080)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn demo_mode(&self) -> bool {
        self.app_mode == AppMode::Demo
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert_eq!(config.groq_api_key, None);
        assert_eq!(config.app_mode, AppMode::Personal);
        assert_eq!(config.llm.model, "llama-3.3-70b-versatile");
        assert_eq!(config.llm.timeout, Duration::from_secs(60));
        assert_eq!(config.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(config.max_cv_text_chars, 12_000);
        assert_eq!(config.port, 8080);
        assert_eq!(config.rate_limits.demo_cv_parse, RateLimitPolicy::per_minute(8));
        assert_eq!(config.rate_limits.chat, RateLimitPolicy::per_minute(20));
    }

    #[test]
    fn test_blank_api_key_counts_as_missing() {
        let config = config(&[("GROQ_API_KEY", "   ")]).unwrap();
        assert_eq!(config.groq_api_key, None);
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("APP_MODE", "Demo"),
            ("RATE_LIMIT_DEMO_PARSE", "3/10"),
            ("ASSISTANT_HOUSE_RULES", "Be kind | | Never use emojis"),
            ("PORT", "9000"),
        ])
        .unwrap();
        assert!(config.demo_mode());
        assert_eq!(config.rate_limits.demo_cv_parse.max, 3);
        assert_eq!(
            config.rate_limits.demo_cv_parse.window,
            Duration::from_secs(10)
        );
        assert_eq!(config.house_rules, vec!["Be kind", "Never use emojis"]);
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));

        let err = config(&[("RATE_LIMIT_CHAT", "lots")]).unwrap_err();
        assert!(err.to_string().contains("RATE_LIMIT_CHAT"));

        assert!(config(&[("APP_MODE", "party")]).is_err());
    }
}
