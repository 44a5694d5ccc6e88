//! Shared data models for the ShortsGen backend.
//!
//! This crate provides Serde-serializable types for:
//! - Caption styling and layout (frame, regions, timed lines)
//! - Generation records and their signed-URL cache
//! - Templates loaded from the database

pub mod caption;
pub mod generation;
pub mod rect;
pub mod template;

pub use caption::{CaptionLayout, CaptionLine, CaptionStyle, TimeSpan};
pub use generation::{
    AssetKind, AssetTriplet, GenerationId, GenerationRecord, SignedState, SignedUrlSet,
};
pub use rect::{FrameSize, OverlayRegion};
pub use template::Template;
