//! Signed URL handlers.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use validator::Validate;

use shorts_models::GenerationId;

use crate::error::{ApiError, ApiResult};
use crate::services::SignedAccess;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct SignedUrlRequest {
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,
}

/// Legacy body naming the generation as `uuid`.
#[derive(Debug, Deserialize, Validate)]
pub struct LegacySignedUrlRequest {
    #[validate(length(min = 1, message = "uuid is required"))]
    pub uuid: String,
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,
}

async fn signed_urls_for(state: &AppState, id: &str, user_id: &str) -> ApiResult<Json<SignedAccess>> {
    let access = state
        .access
        .get_or_refresh(&GenerationId::from(id), user_id)
        .await?;
    Ok(Json(access))
}

/// Current signed URLs of a generation, re-issued when stale.
///
/// POST /api/generations/:generation_id/signed-urls
pub async fn get_signed_urls(
    State(state): State<AppState>,
    Path(generation_id): Path<String>,
    Json(request): Json<SignedUrlRequest>,
) -> ApiResult<Json<SignedAccess>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    signed_urls_for(&state, &generation_id, &request.user_id).await
}

/// POST /get_signed_urls
pub async fn get_signed_urls_legacy(
    State(state): State<AppState>,
    Json(request): Json<LegacySignedUrlRequest>,
) -> ApiResult<Json<SignedAccess>> {
    request
        .validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;
    signed_urls_for(&state, &request.uuid, &request.user_id).await
}
