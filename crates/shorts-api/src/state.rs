//! Application state.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use shorts_db::{GenerationRepository, MemoryStore, RestClient, TemplateRepository};
use shorts_storage::R2Client;

use crate::config::{ApiConfig, StoreBackend};
use crate::services::{
    Backends, FfmpegRenderer, GenerationService, Renderer, SignedAccessManager, SignedUrlSweeper,
};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub backends: Backends,
    pub access: Arc<SignedAccessManager>,
    pub generator: Arc<GenerationService>,
}

impl AppState {
    /// Create application state from configuration and the environment's
    /// storage and database credentials.
    pub fn new(config: ApiConfig) -> anyhow::Result<Self> {
        let r2 = Arc::new(R2Client::from_env()?);

        let backends = match config.store_backend {
            StoreBackend::Rest => {
                let rest = RestClient::from_env()?;
                Backends {
                    generations: Arc::new(GenerationRepository::new(rest.clone())),
                    templates: Arc::new(TemplateRepository::new(rest)),
                    objects: r2.clone(),
                    signer: r2,
                }
            }
            StoreBackend::Memory => {
                warn!("Using in-memory record store; generations are lost on restart");
                let memory = Arc::new(MemoryStore::new());
                Backends {
                    generations: memory.clone(),
                    templates: memory,
                    objects: r2.clone(),
                    signer: r2,
                }
            }
        };
        info!(backend = ?config.store_backend, "Record store configured");

        Ok(Self::from_parts(config, backends, Arc::new(FfmpegRenderer)))
    }

    /// Assemble state from already-built collaborators.
    pub fn from_parts(config: ApiConfig, backends: Backends, renderer: Arc<dyn Renderer>) -> Self {
        let access = SignedAccessManager::new(
            backends.generations.clone(),
            backends.signer.clone(),
            &config.signed_urls,
        );

        // Downloads carry their own per-request timeout
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        let generator = GenerationService::new(
            http,
            renderer,
            backends.clone(),
            config.render.clone(),
            access.policy().clone(),
        );

        Self {
            config,
            backends,
            access: Arc::new(access),
            generator: Arc::new(generator),
        }
    }

    /// Background sweeper over this state's record store.
    pub fn sweeper(&self) -> SignedUrlSweeper {
        SignedUrlSweeper::new(self.backends.generations.clone(), &self.config.signed_urls)
    }
}
