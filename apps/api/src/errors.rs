use std::time::Duration;

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Stable, client-facing error codes. The UI maps these to localized messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    ApiKeyMissing,
    InvalidRequest,
    InvalidMessages,
    InvalidQuestion,
    InvalidSection,
    RateLimited,
    ProcessingFailed,
    InvalidFile,
    FileTooLarge,
    UnsupportedFormat,
    EmptyText,
    InvalidModelResponse,
}

const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

// `ALL`, `from_code` and `describe` decode codes on the client side of the
// envelope; the server only emits them.
impl ErrorCode {
    #[cfg_attr(not(test), allow(dead_code))]
    const ALL: [ErrorCode; 12] = [
        ErrorCode::ApiKeyMissing,
        ErrorCode::InvalidRequest,
        ErrorCode::InvalidMessages,
        ErrorCode::InvalidQuestion,
        ErrorCode::InvalidSection,
        ErrorCode::RateLimited,
        ErrorCode::ProcessingFailed,
        ErrorCode::InvalidFile,
        ErrorCode::FileTooLarge,
        ErrorCode::UnsupportedFormat,
        ErrorCode::EmptyText,
        ErrorCode::InvalidModelResponse,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ApiKeyMissing => "api_key_missing",
            ErrorCode::InvalidRequest => "invalid_request",
            ErrorCode::InvalidMessages => "invalid_messages",
            ErrorCode::InvalidQuestion => "invalid_question",
            ErrorCode::InvalidSection => "invalid_section",
            ErrorCode::RateLimited => "rate_limited",
            ErrorCode::ProcessingFailed => "processing_failed",
            ErrorCode::InvalidFile => "invalid_file",
            ErrorCode::FileTooLarge => "file_too_large",
            ErrorCode::UnsupportedFormat => "unsupported_format",
            ErrorCode::EmptyText => "empty_text",
            ErrorCode::InvalidModelResponse => "invalid_model_response",
        }
    }

    #[cfg_attr(not(test), allow(dead_code))]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == code)
    }

    /// Default human-readable message for this code.
    pub fn message(self) -> &'static str {
        match self {
            ErrorCode::ApiKeyMissing => "API key not configured",
            ErrorCode::InvalidRequest
            | ErrorCode::InvalidMessages
            | ErrorCode::InvalidQuestion
            | ErrorCode::InvalidSection => "Invalid request",
            ErrorCode::RateLimited => "Too many requests",
            ErrorCode::ProcessingFailed => "Failed to process request",
            ErrorCode::InvalidFile => "Invalid file upload",
            ErrorCode::FileTooLarge => "File too large",
            ErrorCode::UnsupportedFormat => "Unsupported file format",
            ErrorCode::EmptyText => "No text found in CV",
            ErrorCode::InvalidModelResponse => "Invalid model response",
        }
    }

    /// Resolves a code received over the wire into a message.
    /// Unknown or missing codes fall back to `fallback`, then to a generic message.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn describe(code: Option<&str>, fallback: Option<&str>) -> String {
        code.and_then(Self::from_code)
            .map(|c| c.message().to_string())
            .or_else(|| {
                fallback
                    .filter(|f| !f.trim().is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| GENERIC_MESSAGE.to_string())
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("completion API key is not configured")]
    ConfigurationMissing,

    #[error("Validation error ({}): {message}", .code.as_str())]
    Validation { code: ErrorCode, message: String },

    #[error("rate limit exceeded, retry in {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("upload exceeds {limit} bytes")]
    FileTooLarge { limit: usize },

    #[error("Extraction failed ({}): {detail}", .code.as_str())]
    Extraction { code: ErrorCode, detail: String },

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        AppError::Validation {
            code,
            message: message.into(),
        }
    }

    pub fn extraction(code: ErrorCode, detail: impl Into<String>) -> Self {
        AppError::Extraction {
            code,
            detail: detail.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::ConfigurationMissing => ErrorCode::ApiKeyMissing,
            AppError::Validation { code, .. } | AppError::Extraction { code, .. } => *code,
            AppError::RateLimited { .. } => ErrorCode::RateLimited,
            AppError::FileTooLarge { .. } => ErrorCode::FileTooLarge,
            AppError::Llm(_) | AppError::Internal(_) => ErrorCode::ProcessingFailed,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ConfigurationMissing => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Extraction {
                code: ErrorCode::InvalidModelResponse,
                ..
            } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Extraction { .. } => StatusCode::BAD_REQUEST,
            AppError::Llm(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::validation(ErrorCode::InvalidRequest, rejection.body_text())
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        AppError::Llm(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::ConfigurationMissing => {
                tracing::error!("GROQ_API_KEY is not configured");
            }
            AppError::Validation { code, message } => {
                tracing::debug!(code = code.as_str(), "Validation error: {message}");
            }
            AppError::RateLimited { retry_after } => {
                tracing::warn!(retry_after_ms = retry_after.as_millis() as u64, "Rate limited");
            }
            AppError::FileTooLarge { limit } => {
                tracing::warn!(limit, "Upload rejected: file too large");
            }
            AppError::Extraction { code, detail } => {
                tracing::warn!(code = code.as_str(), "Extraction failed: {detail}");
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
            }
        }

        let code = self.code();
        let body = Json(json!({
            "error": code.message(),
            "errorCode": code.as_str(),
        }));

        let mut response = (self.status(), body).into_response();
        if let AppError::RateLimited { retry_after } = &self {
            let secs = retry_after.as_millis().div_ceil(1000).max(1);
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn envelope(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_codes_round_trip() {
        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::from_code(code.as_str()), Some(code));
        }
        assert_eq!(ErrorCode::from_code("nope"), None);
    }

    #[test]
    fn test_describe_unknown_code_never_fails() {
        assert_eq!(
            ErrorCode::describe(Some("rate_limited"), None),
            "Too many requests"
        );
        assert_eq!(
            ErrorCode::describe(Some("brand_new_code"), Some("Server said no")),
            "Server said no"
        );
        assert_eq!(ErrorCode::describe(Some("brand_new_code"), None), GENERIC_MESSAGE);
        assert_eq!(ErrorCode::describe(None, Some("   ")), GENERIC_MESSAGE);
    }

    #[tokio::test]
    async fn test_configuration_missing_is_500_with_stable_code() {
        let (status, body) = envelope(AppError::ConfigurationMissing).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["errorCode"], "api_key_missing");
        assert_eq!(body["error"], "API key not configured");
    }

    #[tokio::test]
    async fn test_rate_limited_sets_retry_after() {
        let response = AppError::RateLimited {
            retry_after: Duration::from_millis(1500),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "2");
    }

    #[tokio::test]
    async fn test_retry_after_rounds_up_to_whole_seconds() {
        for (millis, expected) in [(1, "1"), (999, "1"), (1000, "1"), (2000, "2"), (2001, "3")] {
            let response = AppError::RateLimited {
                retry_after: Duration::from_millis(millis),
            }
            .into_response();
            assert_eq!(response.headers()[header::RETRY_AFTER], expected, "{millis}ms");
        }
        let response = AppError::RateLimited {
            retry_after: Duration::ZERO,
        }
        .into_response();
        assert_eq!(response.headers()[header::RETRY_AFTER], "1");
    }

    #[tokio::test]
    async fn test_internal_details_never_reach_client() {
        let err = AppError::Internal(anyhow::anyhow!("db password is hunter2"));
        let (status, body) = envelope(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["errorCode"], "processing_failed");
        assert!(!body.to_string().contains("hunter2"));
    }

    #[tokio::test]
    async fn test_extraction_status_depends_on_code() {
        let (status, body) =
            envelope(AppError::extraction(ErrorCode::EmptyText, "blank")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errorCode"], "empty_text");

        let (status, body) =
            envelope(AppError::extraction(ErrorCode::InvalidModelResponse, "garbage")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["errorCode"], "invalid_model_response");
    }

    #[tokio::test]
    async fn test_file_too_large_is_413() {
        let (status, body) = envelope(AppError::FileTooLarge { limit: 10 }).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["errorCode"], "file_too_large");
    }
}
