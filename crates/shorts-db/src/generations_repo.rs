//! Generation records in the `videos` table.
//!
//! One row per generation. The three signed URLs and `signed_created_at`
//! are nullable and always written or cleared together.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use shorts_models::{AssetTriplet, GenerationId, GenerationRecord, SignedUrlSet};

use crate::client::{Filter, RestClient};
use crate::error::{DbError, DbResult};
use crate::store::GenerationStore;
use crate::timestamp;

/// Table holding generation rows.
pub const GENERATIONS_TABLE: &str = "videos";

/// Object keys written by older clients carry this prefix.
const LEGACY_KEY_PREFIX: &str = "uploads/";

/// Row shape of the `videos` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRow {
    pub uuid: String,
    pub user_id: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub template_id: Option<String>,
    pub video_path: String,
    pub image_path: String,
    pub audio_path: String,
    #[serde(default)]
    pub video_signed_url: Option<String>,
    #[serde(default)]
    pub image_signed_url: Option<String>,
    #[serde(default)]
    pub audio_signed_url: Option<String>,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub signed_created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "timestamp::required")]
    pub created_at: DateTime<Utc>,
}

impl From<&GenerationRecord> for GenerationRow {
    fn from(record: &GenerationRecord) -> Self {
        let signed = record.signed.as_ref();
        Self {
            uuid: record.generation_id.to_string(),
            user_id: record.user_id.clone(),
            text: Some(record.text.clone()),
            template_id: record.template_id.clone(),
            video_path: record.paths.video.clone(),
            image_path: record.paths.image.clone(),
            audio_path: record.paths.audio.clone(),
            video_signed_url: signed.map(|s| s.urls.video.clone()),
            image_signed_url: signed.map(|s| s.urls.image.clone()),
            audio_signed_url: signed.map(|s| s.urls.audio.clone()),
            signed_created_at: signed.map(|s| s.created_at),
            created_at: record.created_at,
        }
    }
}

impl GenerationRow {
    /// Convert to the domain record.
    ///
    /// A row with only some signed columns set is read back as unsigned so
    /// the next access re-signs the full set.
    pub fn into_record(self) -> GenerationRecord {
        let signed = match (
            self.video_signed_url,
            self.image_signed_url,
            self.audio_signed_url,
            self.signed_created_at,
        ) {
            (Some(video), Some(image), Some(audio), Some(created_at)) => {
                Some(SignedUrlSet::new(AssetTriplet::new(video, image, audio), created_at))
            }
            (None, None, None, None) => None,
            _ => {
                warn!(generation_id = %self.uuid, "Partial signed URL set in row, treating as unsigned");
                None
            }
        };

        GenerationRecord {
            generation_id: GenerationId::from(self.uuid),
            user_id: self.user_id,
            text: self.text.unwrap_or_default(),
            template_id: self.template_id,
            paths: AssetTriplet::new(self.video_path, self.image_path, self.audio_path)
                .map(|_, key| normalize_key(key)),
            signed,
            created_at: self.created_at,
        }
    }
}

fn normalize_key(key: String) -> String {
    match key.strip_prefix(LEGACY_KEY_PREFIX) {
        Some(stripped) => stripped.to_string(),
        None => key,
    }
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Rows whose signed set is older than `cutoff`, plus rows holding signed
/// URLs without a timestamp, which can never be served.
fn sweep_filter(cutoff: DateTime<Utc>) -> String {
    format!(
        "(signed_created_at.lt.\"{}\",and(signed_created_at.is.null,\
         or(video_signed_url.not.is.null,image_signed_url.not.is.null,audio_signed_url.not.is.null)))",
        format_ts(cutoff)
    )
}

/// Only the primary key, for counting affected rows.
#[derive(Debug, Deserialize)]
struct KeyOnly {
    #[allow(dead_code)]
    uuid: String,
}

/// REST-backed generation repository.
#[derive(Clone)]
pub struct GenerationRepository {
    client: RestClient,
}

impl GenerationRepository {
    /// Create a new generation repository.
    pub fn new(client: RestClient) -> Self {
        Self { client }
    }

    fn by_id(id: &GenerationId) -> Filter {
        ("uuid", format!("eq.{}", id))
    }
}

#[async_trait]
impl GenerationStore for GenerationRepository {
    async fn get(&self, id: &GenerationId) -> DbResult<Option<GenerationRecord>> {
        let rows: Vec<GenerationRow> = self
            .client
            .select(
                GENERATIONS_TABLE,
                &[Self::by_id(id), ("select", "*".to_string()), ("limit", "1".to_string())],
            )
            .await?;
        Ok(rows.into_iter().next().map(GenerationRow::into_record))
    }

    async fn insert(&self, record: &GenerationRecord) -> DbResult<()> {
        let row = GenerationRow::from(record);
        let _: Vec<KeyOnly> = self.client.insert(GENERATIONS_TABLE, &row).await?;
        info!(generation_id = %record.generation_id, user_id = %record.user_id, "Inserted generation record");
        Ok(())
    }

    async fn store_signed_urls(&self, id: &GenerationId, signed: &SignedUrlSet) -> DbResult<()> {
        let body = json!({
            "video_signed_url": signed.urls.video,
            "image_signed_url": signed.urls.image,
            "audio_signed_url": signed.urls.audio,
            "signed_created_at": format_ts(signed.created_at),
        });

        let updated: Vec<KeyOnly> = self
            .client
            .update(
                GENERATIONS_TABLE,
                &[Self::by_id(id), ("select", "uuid".to_string())],
                &body,
            )
            .await?;

        if updated.is_empty() {
            return Err(DbError::not_found(format!("generation {id}")));
        }
        Ok(())
    }

    async fn clear_signed_before(&self, cutoff: DateTime<Utc>) -> DbResult<u64> {
        let body = json!({
            "video_signed_url": null,
            "image_signed_url": null,
            "audio_signed_url": null,
            "signed_created_at": null,
        });

        let cleared: Vec<KeyOnly> = self
            .client
            .update(
                GENERATIONS_TABLE,
                &[
                    ("or", sweep_filter(cutoff)),
                    ("select", "uuid".to_string()),
                ],
                &body,
            )
            .await?;

        Ok(cleared.len() as u64)
    }

    async fn ping(&self) -> DbResult<()> {
        self.client.ping(GENERATIONS_TABLE).await
    }
}
