//! Axum HTTP API server.
//!
//! This crate provides:
//! - The short generation endpoint (download, caption, render, upload, sign)
//! - Signed URL access with cache refresh and a background sweeper
//! - Request id, logging, CORS and Prometheus middleware

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::{ApiConfig, RenderConfig, SignedUrlConfig, StoreBackend};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{Backends, GenerationService, SignedAccessManager, SignedUrlSweeper};
pub use state::AppState;
