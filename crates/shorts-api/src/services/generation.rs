//! Short generation pipeline.
//!
//! download -> probe -> caption filter -> render -> upload -> sign -> insert.
//! A record is only inserted once all three uploads and all three signed
//! URLs succeeded; any earlier failure leaves the store untouched.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use validator::Validate;

use shorts_db::DbError;
use shorts_media::{
    download_asset, normalize_asset_url, probe_duration, render_caption_filter, render_short,
    CaptionError, MediaError, MediaResult, RenderInputs, RenderOptions,
};
use shorts_models::{
    AssetTriplet, CaptionLayout, CaptionStyle, FrameSize, GenerationId, GenerationRecord,
    SignedUrlSet, Template,
};
use shorts_storage::{sign_triplet, upload_generation_assets, SigningPolicy, StorageError};

use crate::config::RenderConfig;
use crate::metrics;
use crate::services::Backends;

/// Generation request as posted by clients.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, message = "image_url is required"))]
    pub image_url: String,
    #[validate(length(min = 1, message = "mp3_url is required"))]
    pub mp3_url: String,
    #[validate(length(min = 1, max = 2000, message = "text must be 1-2000 characters"))]
    pub text: String,
    #[validate(length(min = 1, message = "user_id is required"))]
    pub user_id: String,
    #[serde(default)]
    pub template_id: Option<String>,
}

impl GenerateRequest {
    fn template_id(&self) -> Option<&str> {
        self.template_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateResponse {
    pub generation_id: GenerationId,
    pub video_url: String,
    pub image_url: String,
    pub audio_url: String,
    pub signed_created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    #[error(transparent)]
    Caption(#[from] CaptionError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("Upload failed: {0}")]
    Upload(#[source] StorageError),

    #[error("Signing failed: {0}")]
    Signing(#[source] StorageError),

    #[error("Store error: {0}")]
    Store(#[from] DbError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenerationError {
    fn outcome(&self) -> &'static str {
        match self {
            Self::Invalid(_) | Self::TemplateNotFound(_) | Self::Caption(_) => "rejected",
            Self::Media(MediaError::Timeout(_)) => "render_timeout",
            Self::Media(_) => "media_failed",
            Self::Upload(_) => "upload_failed",
            Self::Signing(_) => "signing_failed",
            Self::Store(_) | Self::Io(_) => "internal",
        }
    }
}

/// Duration probing and rendering.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn probe_duration(&self, audio: &Path) -> MediaResult<f64>;

    /// Render `inputs` and return the output size in bytes.
    async fn render(
        &self,
        inputs: &RenderInputs,
        filter: &str,
        duration: f64,
        options: &RenderOptions,
    ) -> MediaResult<u64>;
}

/// FFmpeg/FFprobe on the host.
pub struct FfmpegRenderer;

#[async_trait]
impl Renderer for FfmpegRenderer {
    async fn probe_duration(&self, audio: &Path) -> MediaResult<f64> {
        probe_duration(audio).await
    }

    async fn render(
        &self,
        inputs: &RenderInputs,
        filter: &str,
        duration: f64,
        options: &RenderOptions,
    ) -> MediaResult<u64> {
        render_short(inputs, filter, duration, options).await
    }
}

/// Local files of one generation inside its scratch directory.
struct WorkFiles {
    background: PathBuf,
    audio: PathBuf,
    frame: PathBuf,
    output: PathBuf,
}

impl WorkFiles {
    fn new(dir: &Path) -> Self {
        Self {
            background: dir.join("bg.jpg"),
            audio: dir.join("audio.mp3"),
            frame: dir.join("frame.png"),
            output: dir.join("video.mp4"),
        }
    }
}

/// Runs the generation pipeline.
pub struct GenerationService {
    http: reqwest::Client,
    renderer: Arc<dyn Renderer>,
    backends: Backends,
    config: RenderConfig,
    policy: SigningPolicy,
}

impl GenerationService {
    pub fn new(
        http: reqwest::Client,
        renderer: Arc<dyn Renderer>,
        backends: Backends,
        config: RenderConfig,
        policy: SigningPolicy,
    ) -> Self {
        Self {
            http,
            renderer,
            backends,
            config,
            policy,
        }
    }

    pub async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, GenerationError> {
        let started = Instant::now();
        let result = self.run(&request).await;

        match &result {
            Ok(response) => {
                metrics::record_generation("success");
                info!(
                    generation_id = %response.generation_id,
                    user_id = %request.user_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Generated short"
                );
            }
            Err(e) => {
                metrics::record_generation(e.outcome());
                warn!(user_id = %request.user_id, error = %e, "Generation failed");
            }
        }
        result
    }

    async fn run(&self, request: &GenerateRequest) -> Result<GenerateResponse, GenerationError> {
        request
            .validate()
            .map_err(|e| GenerationError::Invalid(e.to_string()))?;
        if request.text.trim().is_empty() {
            return Err(CaptionError::EmptyText.into());
        }

        let image_url = normalize_asset_url(&request.image_url)?;
        let audio_url = normalize_asset_url(&request.mp3_url)?;

        let template = match request.template_id() {
            Some(id) => Some(
                self.backends
                    .templates
                    .get_template(id)
                    .await?
                    .ok_or_else(|| GenerationError::TemplateNotFound(id.to_string()))?,
            ),
            None => None,
        };

        let workdir = tempfile::tempdir()?;
        let files = WorkFiles::new(workdir.path());
        self.download_inputs(&image_url, &audio_url, template.as_ref(), &files)
            .await?;

        let duration = self
            .renderer
            .probe_duration(&files.audio)
            .await?
            .min(self.config.max_video_secs);

        let (style, layout) = self.caption_setup(template.as_ref());
        let filter = render_caption_filter(&request.text, duration, &style, &layout)?;

        let inputs = RenderInputs {
            background: files.background.clone(),
            audio: files.audio.clone(),
            frame: template.as_ref().map(|_| files.frame.clone()),
            output: files.output.clone(),
        };
        self.renderer
            .render(&inputs, &filter, duration, &self.config.render_options())
            .await?;

        let generation_id = GenerationId::new();
        let local = AssetTriplet::new(files.output, files.background, files.audio);
        let paths = upload_generation_assets(self.backends.objects.as_ref(), &generation_id, &local)
            .await
            .map_err(GenerationError::Upload)?;

        let urls = sign_triplet(self.backends.signer.as_ref(), &paths, &self.policy)
            .await
            .map_err(GenerationError::Signing)?;
        let signed = SignedUrlSet::new(urls, Utc::now());

        let record = GenerationRecord::new(
            generation_id.clone(),
            request.user_id.clone(),
            request.text.clone(),
            request.template_id().map(str::to_string),
            paths,
        )
        .with_signed(signed.clone());
        self.backends.generations.insert(&record).await?;

        Ok(GenerateResponse {
            generation_id,
            video_url: signed.urls.video,
            image_url: signed.urls.image,
            audio_url: signed.urls.audio,
            signed_created_at: signed.created_at,
        })
    }

    async fn download_inputs(
        &self,
        image_url: &str,
        audio_url: &str,
        template: Option<&Template>,
        files: &WorkFiles,
    ) -> Result<(), GenerationError> {
        let timeout = self.config.download_timeout;
        let frame_url = template
            .map(|t| normalize_asset_url(&t.frame_url))
            .transpose()?;
        let frame = async {
            match &frame_url {
                Some(url) => download_asset(&self.http, url, &files.frame, timeout).await,
                None => Ok(0),
            }
        };

        tokio::try_join!(
            download_asset(&self.http, image_url, &files.background, timeout),
            download_asset(&self.http, audio_url, &files.audio, timeout),
            frame,
        )?;
        Ok(())
    }

    fn caption_setup(&self, template: Option<&Template>) -> (CaptionStyle, CaptionLayout) {
        let base = self.config.caption_style();
        match template {
            Some(t) => (t.style(&base), t.layout(FrameSize::PORTRAIT_1080)),
            None => (base, CaptionLayout::default()),
        }
    }
}
