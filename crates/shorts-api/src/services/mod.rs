//! Business logic services.

pub mod generation;
pub mod signed_access;
pub mod signed_url_sweeper;
#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use shorts_db::{GenerationStore, TemplateStore};
use shorts_storage::{ObjectStore, UrlSigner};

pub use generation::{
    FfmpegRenderer, GenerateRequest, GenerateResponse, GenerationError, GenerationService, Renderer,
};
pub use signed_access::{AccessError, AccessResult, SignedAccess, SignedAccessManager};
pub use signed_url_sweeper::SignedUrlSweeper;

/// External collaborators shared by the services.
#[derive(Clone)]
pub struct Backends {
    pub generations: Arc<dyn GenerationStore>,
    pub templates: Arc<dyn TemplateStore>,
    pub objects: Arc<dyn ObjectStore>,
    pub signer: Arc<dyn UrlSigner>,
}
