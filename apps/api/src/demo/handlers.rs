use axum::{
    extract::{
        multipart::MultipartError, rejection::JsonRejection, FromRequest, Multipart, Request,
        State,
    },
    http::{header, HeaderMap, StatusCode},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::assistant::prompts::{build_prompt, TaskKind};
use crate::demo::extract::{extract_text, DocumentFormat};
use crate::demo::flow::{DemoEvent, DemoFlow};
use crate::demo::form::DemoForm;
use crate::demo::preview::{build_preview, Preview};
use crate::demo::sanitize::sanitize_profile;
use crate::errors::{AppError, ErrorCode};
use crate::language::{self, LanguageCode};
use crate::llm_client::{parse_structured, CompletionGateway, CompletionRequest};
use crate::profile::{merge, ProfileOverride, ProfileRecord};
use crate::rate_limit::RateLimitScope;
use crate::state::AppState;
use crate::text::truncate_chars;

const EXTRACTION_TEMPERATURE: f32 = 0.2;

// ────────────────────────────────────────────────────────────────────────────
// Request / response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseTextRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default, deserialize_with = "language::deserialize_lenient")]
    pub language: LanguageCode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CvDataResponse {
    pub cv_data: ProfileOverride,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub cv_data: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub profile: ProfileRecord,
    pub preview: Preview,
}

struct Upload {
    file_name: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

// ────────────────────────────────────────────────────────────────────────────
// Input collection
// ────────────────────────────────────────────────────────────────────────────

fn multipart_error(err: MultipartError, limit: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::FileTooLarge { limit }
    } else {
        AppError::extraction(ErrorCode::InvalidFile, err.body_text())
    }
}

/// Reads the `file` and `language` parts of an upload and returns the
/// extracted document text.
async fn read_upload(
    mut multipart: Multipart,
    limit: usize,
    max_chars: usize,
) -> Result<(String, LanguageCode), AppError> {
    let mut upload = None;
    let mut language = LanguageCode::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(|e| multipart_error(e, limit))?;
                upload = Some(Upload {
                    file_name,
                    content_type,
                    data,
                });
            }
            Some("language") => {
                let raw = field.text().await.map_err(|e| multipart_error(e, limit))?;
                language = LanguageCode::parse_or_default(Some(raw.as_str()));
            }
            _ => {}
        }
    }

    let upload = upload
        .filter(|u| !u.data.is_empty())
        .ok_or_else(|| AppError::extraction(ErrorCode::InvalidFile, "no file in upload"))?;
    if upload.data.len() > limit {
        return Err(AppError::FileTooLarge { limit });
    }

    let format = DocumentFormat::detect(upload.content_type.as_deref(), upload.file_name.as_deref())
        .ok_or_else(|| {
            AppError::extraction(
                ErrorCode::UnsupportedFormat,
                format!(
                    "content type {:?}, file name {:?}",
                    upload.content_type, upload.file_name
                ),
            )
        })?;

    info!(?format, bytes = upload.data.len(), "Extracting uploaded CV");
    let text = extract_text(upload.data, format, max_chars)
        .await
        .map_err(|e| AppError::extraction(ErrorCode::InvalidFile, e.to_string()))?;
    Ok((text, language))
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("multipart/form-data"))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/demo/parse-cv
///
/// Accepts either a PDF/DOCX upload or pasted text and returns the CV
/// structured as profile override data.
pub async fn handle_parse_cv(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<CvDataResponse>, AppError> {
    state.enforce_rate_limit(request.headers(), RateLimitScope::DemoCvParse)?;
    let gateway = state.gateway()?;

    let flow = DemoFlow::default().transition(DemoEvent::Submit)?;
    let event = match structure_cv(&state, gateway.as_ref(), request).await {
        Ok(cv_data) => DemoEvent::Completed(cv_data),
        Err(e) => {
            let flow = flow.transition(DemoEvent::Failed)?;
            debug!(state = flow.name(), "Demo CV processing failed");
            return Err(e);
        }
    };

    let flow = flow.transition(event)?;
    debug!(state = flow.name(), "Demo CV processed");
    let cv_data = flow
        .into_override()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("demo flow finished without data")))?;
    Ok(Json(CvDataResponse { cv_data }))
}

/// Reads the CV (upload or pasted text) and asks the model to structure it.
async fn structure_cv(
    state: &AppState,
    gateway: &dyn CompletionGateway,
    request: Request,
) -> Result<ProfileOverride, AppError> {
    let headers = request.headers().clone();

    let (raw_text, language) = if is_multipart(&headers) {
        let multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| AppError::extraction(ErrorCode::InvalidFile, e.body_text()))?;
        read_upload(
            multipart,
            state.config.max_upload_bytes,
            state.config.max_cv_text_chars,
        )
        .await?
    } else {
        let Json(body) = Json::<ParseTextRequest>::from_request(request, state).await?;
        (body.text, body.language)
    };

    let text = truncate_chars(raw_text.trim(), state.config.max_cv_text_chars);
    if text.is_empty() {
        return Err(AppError::extraction(
            ErrorCode::EmptyText,
            "no text could be read from the CV",
        ));
    }

    let prompt = build_prompt(
        TaskKind::DemoCvExtraction { cv_text: text },
        &ProfileRecord::empty(),
        language,
        &state.config.house_rules,
    );
    info!(chars = text.chars().count(), language = language.code(), "Structuring demo CV");

    let reply = gateway
        .complete(CompletionRequest::from_prompt(prompt).temperature(EXTRACTION_TEMPERATURE))
        .await?;

    let raw: Value = parse_structured(&reply).map_err(|e| {
        warn!(error = %e, reply_chars = reply.len(), "Model reply is not a CV object");
        AppError::extraction(ErrorCode::InvalidModelResponse, e.to_string())
    })?;
    sanitize_profile(&raw)
        .map_err(|e| AppError::extraction(ErrorCode::InvalidModelResponse, e.to_string()))
}

/// POST /api/v1/demo/form
pub async fn handle_demo_form(
    payload: Result<Json<DemoForm>, JsonRejection>,
) -> Result<Json<CvDataResponse>, AppError> {
    let Json(form) = payload?;
    let cv_data = form.into_override()?;
    Ok(Json(CvDataResponse { cv_data }))
}

/// POST /api/v1/demo/preview
pub async fn handle_demo_preview(
    payload: Result<Json<PreviewRequest>, JsonRejection>,
) -> Result<Json<PreviewResponse>, AppError> {
    let Json(req) = payload?;
    let raw = req
        .cv_data
        .ok_or_else(|| AppError::validation(ErrorCode::InvalidRequest, "cvData is required"))?;
    let overlay = sanitize_profile(&raw)
        .map_err(|e| AppError::validation(ErrorCode::InvalidRequest, format!("cvData: {e}")))?;

    let profile = merge(&ProfileRecord::empty(), Some(&overlay));
    let preview = build_preview(&profile);
    Ok(Json(PreviewResponse { profile, preview }))
}
