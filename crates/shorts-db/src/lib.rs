//! REST data API client and generation persistence.
//!
//! This crate provides:
//! - A PostgREST client with service-key auth, retry and metrics
//! - The [`GenerationStore`] and [`TemplateStore`] seams
//! - REST-backed repositories for generations and templates
//! - An in-memory store for local development

pub mod client;
pub mod error;
pub mod generations_repo;
pub mod memory;
pub mod metrics;
pub mod retry;
pub mod store;
pub mod templates_repo;
mod timestamp;

pub use client::{RestClient, RestConfig};
pub use error::{DbError, DbResult};
pub use generations_repo::{GenerationRepository, GenerationRow};
pub use memory::MemoryStore;
pub use retry::RetryConfig;
pub use store::{GenerationStore, TemplateStore};
pub use templates_repo::TemplateRepository;
