//! Site-owner profile content, one record per response language.
//!
//! The catalog file holds contact details once and per-language content as
//! overrides. Translations may be sparse: anything a language omits falls
//! back to the default language's record.

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::config::{AppMode, Config};
use crate::language::LanguageCode;
use crate::profile::merge::merge;
use crate::profile::models::{PersonalInfo, ProfileOverride, ProfileRecord};

const BUNDLED_PROFILE: &str = include_str!("../../data/profile.example.json");

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogFile {
    #[serde(default)]
    default_language: Option<String>,
    #[serde(default)]
    personal: PersonalInfo,
    #[serde(default)]
    content: HashMap<String, Value>,
}

#[derive(Debug, Clone)]
pub struct ProfileCatalog {
    default_language: LanguageCode,
    default_record: ProfileRecord,
    translations: HashMap<LanguageCode, ProfileRecord>,
}

impl ProfileCatalog {
    /// Loads the catalog named by `PROFILE_PATH`, or the bundled example in
    /// demo mode or when no path is configured.
    pub fn load(config: &Config) -> Result<Self> {
        match (&config.app_mode, &config.profile_path) {
            (AppMode::Personal, Some(path)) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read profile catalog at {path}"))?;
                let catalog = Self::from_json(&raw)
                    .with_context(|| format!("Invalid profile catalog at {path}"))?;
                info!(path = %path, languages = catalog.languages().count(), "Profile catalog loaded");
                Ok(catalog)
            }
            _ => {
                let catalog = Self::bundled()?;
                info!(
                    languages = catalog.languages().count(),
                    "Using bundled example profile"
                );
                Ok(catalog)
            }
        }
    }

    pub fn bundled() -> Result<Self> {
        Self::from_json(BUNDLED_PROFILE).context("Bundled example profile is invalid")
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(raw)?;

        let default_language = match file.default_language.as_deref() {
            None => LanguageCode::default(),
            Some(code) => LanguageCode::parse(code)
                .with_context(|| format!("Unsupported defaultLanguage '{code}'"))?,
        };

        let mut overrides = HashMap::new();
        for (code, value) in file.content {
            let Some(language) = LanguageCode::parse(&code) else {
                warn!(language = %code, "Skipping catalog content for unsupported language");
                continue;
            };
            let overlay: ProfileOverride = serde_json::from_value(value)
                .with_context(|| format!("Invalid catalog content for '{code}'"))?;
            overrides.insert(language, overlay);
        }

        let mut baseline = ProfileRecord::empty();
        baseline.personal = file.personal;
        let default_record = merge(&baseline, overrides.get(&default_language));

        let translations = overrides
            .iter()
            .filter(|(language, _)| **language != default_language)
            .map(|(language, overlay)| (*language, merge(&default_record, Some(overlay))))
            .collect();

        Ok(Self {
            default_language,
            default_record,
            translations,
        })
    }

    pub fn default_language(&self) -> LanguageCode {
        self.default_language
    }

    /// Record for `language`, or the default language's record.
    pub fn get(&self, language: LanguageCode) -> &ProfileRecord {
        self.translations
            .get(&language)
            .unwrap_or(&self.default_record)
    }

    pub fn languages(&self) -> impl Iterator<Item = LanguageCode> + '_ {
        std::iter::once(self.default_language).chain(self.translations.keys().copied())
    }
}
