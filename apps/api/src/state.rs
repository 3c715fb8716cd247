use std::sync::Arc;

use axum::http::HeaderMap;
use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::demo::sanitize::sanitize_profile;
use crate::errors::{AppError, ErrorCode};
use crate::language::LanguageCode;
use crate::llm_client::CompletionGateway;
use crate::profile::{merge, ProfileCatalog, ProfileRecord};
use crate::rate_limit::{client_identity, RateDecision, RateLimitScope, RateLimiter};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// `None` when no completion key is configured; AI routes then answer `api_key_missing`.
    pub gateway: Option<Arc<dyn CompletionGateway>>,
    pub limiter: RateLimiter,
    pub profiles: Arc<ProfileCatalog>,
    pub config: Config,
}

impl AppState {
    pub fn new(
        config: Config,
        profiles: ProfileCatalog,
        gateway: Option<Arc<dyn CompletionGateway>>,
    ) -> Self {
        Self {
            gateway,
            limiter: RateLimiter::new(),
            profiles: Arc::new(profiles),
            config,
        }
    }

    /// Consumes one request from the caller's quota for `scope`.
    pub fn enforce_rate_limit(
        &self,
        headers: &HeaderMap,
        scope: RateLimitScope,
    ) -> Result<(), AppError> {
        let identity = client_identity(headers);
        let policy = self.config.rate_limits.policy(scope);
        match self
            .limiter
            .check_and_consume(&scope.key_for(&identity), policy)
        {
            RateDecision::Allowed => Ok(()),
            RateDecision::Rejected { retry_after } => {
                debug!(scope = scope.key_prefix(), client = %identity, "Quota exhausted");
                Err(AppError::RateLimited { retry_after })
            }
        }
    }

    pub fn gateway(&self) -> Result<Arc<dyn CompletionGateway>, AppError> {
        self.gateway
            .clone()
            .ok_or(AppError::ConfigurationMissing)
    }

    /// Profile a request is answered from.
    ///
    /// Demo mode always starts from the empty baseline, with a supplied
    /// `cvData` sanitised and merged over it. Personal mode ignores `cvData`
    /// and uses the catalog record for `language`.
    pub fn resolve_profile(
        &self,
        language: LanguageCode,
        cv_data: Option<&Value>,
    ) -> Result<ProfileRecord, AppError> {
        let cv_data = cv_data.filter(|v| !v.is_null());
        if !self.config.demo_mode() {
            if cv_data.is_some() {
                debug!("Ignoring cvData override outside demo mode");
            }
            return Ok(self.profiles.get(language).clone());
        }

        let overlay = cv_data
            .map(sanitize_profile)
            .transpose()
            .map_err(|e| AppError::validation(ErrorCode::InvalidRequest, format!("cvData: {e}")))?;
        Ok(merge(&ProfileRecord::empty(), overlay.as_ref()))
    }
}
