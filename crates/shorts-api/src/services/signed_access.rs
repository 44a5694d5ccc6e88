//! Read-path access to a generation's signed URLs.
//!
//! A record's cached URL set is returned while fresh. Stale or missing sets
//! are re-issued as a unit: all three URLs are signed before anything is
//! written, so a signing failure leaves the previous set in place.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use shorts_db::{DbError, GenerationStore};
use shorts_models::{GenerationId, SignedState, SignedUrlSet};
use shorts_storage::{sign_triplet, SigningPolicy, StorageError, UrlSigner};

use crate::config::SignedUrlConfig;
use crate::metrics;

pub type AccessResult<T> = Result<T, AccessError>;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("Generation not found: {0}")]
    NotFound(GenerationId),

    #[error("Requester does not own generation {0}")]
    Unauthorized(GenerationId),

    #[error("Signing failed: {0}")]
    Signing(#[source] StorageError),

    #[error("Store error: {0}")]
    Store(#[from] DbError),
}

/// Signed URLs handed to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignedAccess {
    pub video_url: String,
    pub image_url: String,
    pub audio_url: String,
    pub signed_created_at: DateTime<Utc>,
}

impl From<&SignedUrlSet> for SignedAccess {
    fn from(set: &SignedUrlSet) -> Self {
        Self {
            video_url: set.urls.video.clone(),
            image_url: set.urls.image.clone(),
            audio_url: set.urls.audio.clone(),
            signed_created_at: set.created_at,
        }
    }
}

/// Issues, caches and refreshes signed URL sets.
pub struct SignedAccessManager {
    store: Arc<dyn GenerationStore>,
    signer: Arc<dyn UrlSigner>,
    ttl: chrono::Duration,
    policy: SigningPolicy,
}

impl SignedAccessManager {
    pub fn new(
        store: Arc<dyn GenerationStore>,
        signer: Arc<dyn UrlSigner>,
        config: &SignedUrlConfig,
    ) -> Self {
        Self {
            store,
            signer,
            ttl: config.cache_ttl_chrono(),
            policy: config.signing_policy(),
        }
    }

    /// Signing policy used for fresh issuance.
    pub fn policy(&self) -> &SigningPolicy {
        &self.policy
    }

    pub async fn get_or_refresh(
        &self,
        id: &GenerationId,
        requester: &str,
    ) -> AccessResult<SignedAccess> {
        self.get_or_refresh_at(id, requester, Utc::now()).await
    }

    /// [`get_or_refresh`](Self::get_or_refresh) evaluated at `now`.
    pub async fn get_or_refresh_at(
        &self,
        id: &GenerationId,
        requester: &str,
        now: DateTime<Utc>,
    ) -> AccessResult<SignedAccess> {
        let record = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| AccessError::NotFound(id.clone()))?;

        if !record.is_owned_by(requester) {
            warn!(generation_id = %id, requester, "Signed URL request from non-owner");
            return Err(AccessError::Unauthorized(id.clone()));
        }

        let state = record.signed_state(now, self.ttl);
        metrics::record_signed_access(state.as_str());

        if let (SignedState::Fresh, Some(cached)) = (state, record.signed.as_ref()) {
            debug!(generation_id = %id, "Serving cached signed URLs");
            return Ok(SignedAccess::from(cached));
        }

        let urls = sign_triplet(self.signer.as_ref(), &record.paths, &self.policy)
            .await
            .map_err(|e| {
                warn!(generation_id = %id, error = %e, "Signed URL refresh failed");
                AccessError::Signing(e)
            })?;

        let signed = SignedUrlSet::new(urls, now);
        self.store.store_signed_urls(id, &signed).await?;

        info!(generation_id = %id, previous = state.as_str(), "Refreshed signed URLs");
        Ok(SignedAccess::from(&signed))
    }
}
