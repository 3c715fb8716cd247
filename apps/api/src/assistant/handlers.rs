//! Axum route handlers for the streaming assistant endpoints.
//!
//! Every handler runs the same pipeline: quota, credential, validation,
//! profile resolution, prompt, completion stream.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    Json,
};
use futures::{future, StreamExt, TryStreamExt};
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use crate::assistant::prompts::{build_prompt, TaskKind};
use crate::assistant::validation::{validate_messages, validate_question, validate_section};
use crate::errors::AppError;
use crate::language::{self, LanguageCode};
use crate::llm_client::{ChatMessage, CompletionRequest, TextStream};
use crate::rate_limit::RateLimitScope;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Option<Value>,
    #[serde(default, deserialize_with = "language::deserialize_lenient")]
    pub language: LanguageCode,
    pub cv_data: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileTaskRequest {
    #[serde(default, deserialize_with = "language::deserialize_lenient")]
    pub language: LanguageCode,
    pub cv_data: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionQuestionRequest {
    pub section: Option<Value>,
    pub question: Option<Value>,
    #[serde(default, deserialize_with = "language::deserialize_lenient")]
    pub language: LanguageCode,
    pub cv_data: Option<Value>,
}

/// Body-less POSTs (no JSON content type) are treated as an empty request.
fn body_or_default<T: Default>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(T::default()),
        Err(rejection) => Err(rejection.into()),
    }
}

/// Forwards completion chunks as a `text/plain` body, in arrival order.
/// An upstream failure after the first byte can no longer change the status,
/// so it is logged and the body simply ends.
fn text_stream_response(stream: TextStream, task: &'static str) -> Response {
    let body = stream
        .inspect_err(move |e| error!(task, error = %e, "Completion stream failed"))
        .take_while(|chunk| future::ready(chunk.is_ok()));

    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(body),
    )
        .into_response()
}

async fn run_profile_task(
    state: AppState,
    headers: HeaderMap,
    payload: Result<Json<ProfileTaskRequest>, JsonRejection>,
    scope: RateLimitScope,
    task: TaskKind<'static>,
) -> Result<Response, AppError> {
    state.enforce_rate_limit(&headers, scope)?;
    let gateway = state.gateway()?;
    let req = body_or_default(payload)?;

    let profile = state.resolve_profile(req.language, req.cv_data.as_ref())?;
    let prompt = build_prompt(task, &profile, req.language, &state.config.house_rules);

    info!(task = task.name(), language = req.language.code(), "Streaming completion");
    let stream = gateway.stream(CompletionRequest::from_prompt(prompt)).await?;
    Ok(text_stream_response(stream, task.name()))
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/chat
pub async fn handle_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    state.enforce_rate_limit(&headers, RateLimitScope::Chat)?;
    let gateway = state.gateway()?;
    let Json(req) = payload?;

    let messages: Vec<ChatMessage> = validate_messages(req.messages.as_ref())?;
    let profile = state.resolve_profile(req.language, req.cv_data.as_ref())?;
    let system = build_prompt(
        TaskKind::ChatSystemPrompt,
        &profile,
        req.language,
        &state.config.house_rules,
    );

    info!(
        language = req.language.code(),
        turns = messages.len(),
        "Streaming chat reply"
    );
    let stream = gateway
        .stream(CompletionRequest::with_system(system, messages))
        .await?;
    Ok(text_stream_response(stream, "chat"))
}

/// POST /api/v1/analyze-resume
pub async fn handle_analyze_resume(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ProfileTaskRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    run_profile_task(
        state,
        headers,
        payload,
        RateLimitScope::ResumeAnalysis,
        TaskKind::ResumeAnalysis,
    )
    .await
}

/// POST /api/v1/recommend-skills
pub async fn handle_recommend_skills(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ProfileTaskRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    run_profile_task(
        state,
        headers,
        payload,
        RateLimitScope::SkillRecommendation,
        TaskKind::SkillRecommendation,
    )
    .await
}

/// POST /api/v1/insights
pub async fn handle_insights(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ProfileTaskRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    run_profile_task(
        state,
        headers,
        payload,
        RateLimitScope::InsightGeneration,
        TaskKind::InsightGeneration,
    )
    .await
}

/// POST /api/v1/section-qa
pub async fn handle_section_qa(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SectionQuestionRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    state.enforce_rate_limit(&headers, RateLimitScope::SectionQa)?;
    let gateway = state.gateway()?;
    let Json(req) = payload?;

    let section = validate_section(req.section.as_ref())?;
    let question = validate_question(req.question.as_ref())?;
    let profile = state.resolve_profile(req.language, req.cv_data.as_ref())?;
    let system = build_prompt(
        TaskKind::SectionQuestionAnswering(section),
        &profile,
        req.language,
        &state.config.house_rules,
    );

    info!(section = section.as_str(), language = req.language.code(), "Streaming section answer");
    let stream = gateway
        .stream(CompletionRequest::with_system(
            system,
            vec![ChatMessage::user(question)],
        ))
        .await?;
    Ok(text_stream_response(stream, "section-qa"))
}
