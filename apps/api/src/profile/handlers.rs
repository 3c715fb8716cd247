use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::language::LanguageCode;
use crate::profile::models::ProfileRecord;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    pub language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub language: LanguageCode,
    pub profile: ProfileRecord,
}

/// GET /api/v1/profile?language=xx
pub async fn handle_get_profile(
    State(state): State<AppState>,
    Query(params): Query<ProfileQuery>,
) -> Result<Json<ProfileResponse>, AppError> {
    let language = LanguageCode::parse_or_default(params.language.as_deref());
    let profile = state.profiles.get(language).clone();
    Ok(Json(ProfileResponse { language, profile }))
}
