//! Persistence seams used by the API services.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shorts_models::{GenerationId, GenerationRecord, SignedUrlSet, Template};

use crate::error::DbResult;

/// Generation records and their signed-URL cache.
#[async_trait]
pub trait GenerationStore: Send + Sync {
    /// Look up a record by id.
    async fn get(&self, id: &GenerationId) -> DbResult<Option<GenerationRecord>>;

    /// Persist a new record.
    async fn insert(&self, record: &GenerationRecord) -> DbResult<()>;

    /// Replace the cached signed URLs of a record as one write.
    ///
    /// Fails with `NotFound` when the record does not exist.
    async fn store_signed_urls(&self, id: &GenerationId, signed: &SignedUrlSet) -> DbResult<()>;

    /// Clear every signed set created strictly before `cutoff`.
    ///
    /// Returns the number of records cleared.
    async fn clear_signed_before(&self, cutoff: DateTime<Utc>) -> DbResult<u64>;

    /// Reachability probe for readiness checks.
    async fn ping(&self) -> DbResult<()>;
}

/// Read access to video templates.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn get_template(&self, template_id: &str) -> DbResult<Option<Template>>;
}
