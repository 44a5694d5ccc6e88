//! Generation handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::error::ApiResult;
use crate::extract::JsonOrForm;
use crate::services::{GenerateRequest, GenerateResponse};
use crate::state::AppState;

/// Render, upload and record a new short.
///
/// POST /api/generations (JSON or form)
pub async fn create_generation(
    State(state): State<AppState>,
    JsonOrForm(request): JsonOrForm<GenerateRequest>,
) -> ApiResult<Json<GenerateResponse>> {
    let response = state.generator.generate(request).await?;
    Ok(Json(response))
}

/// Response shape of the legacy upload endpoint.
#[derive(Debug, Serialize)]
pub struct LegacyGenerateResponse {
    pub video_url: String,
    pub image_url: String,
    pub audio_url: String,
    pub log_id: String,
}

impl From<GenerateResponse> for LegacyGenerateResponse {
    fn from(r: GenerateResponse) -> Self {
        Self {
            video_url: r.video_url,
            image_url: r.image_url,
            audio_url: r.audio_url,
            log_id: r.generation_id.0,
        }
    }
}

/// POST /upload_and_generate
pub async fn upload_and_generate(
    State(state): State<AppState>,
    JsonOrForm(request): JsonOrForm<GenerateRequest>,
) -> ApiResult<Json<LegacyGenerateResponse>> {
    let response = state.generator.generate(request).await?;
    Ok(Json(response.into()))
}
