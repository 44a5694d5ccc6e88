//! Generation records and the signed-URL cache attached to them.

use chrono::{DateTime, Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for one generated video/image/audio triplet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct GenerationId(pub String);

impl GenerationId {
    /// Generate a new random generation ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for GenerationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for GenerationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for GenerationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// The three stored artifacts of a generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Video,
    Image,
    Audio,
}

impl AssetKind {
    pub const ALL: [AssetKind; 3] = [AssetKind::Video, AssetKind::Image, AssetKind::Audio];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Video => "video",
            AssetKind::Image => "image",
            AssetKind::Audio => "audio",
        }
    }

    /// MIME type used when uploading.
    pub fn content_type(&self) -> &'static str {
        match self {
            AssetKind::Video => "video/mp4",
            AssetKind::Image => "image/jpeg",
            AssetKind::Audio => "audio/mpeg",
        }
    }

    /// Object name suffix appended to the generation id.
    pub fn file_suffix(&self) -> &'static str {
        match self {
            AssetKind::Video => "video.mp4",
            AssetKind::Image => "bg.jpg",
            AssetKind::Audio => "audio.mp3",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per asset kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AssetTriplet<T> {
    pub video: T,
    pub image: T,
    pub audio: T,
}

impl<T> AssetTriplet<T> {
    pub fn new(video: T, image: T, audio: T) -> Self {
        Self {
            video,
            image,
            audio,
        }
    }

    pub fn get(&self, kind: AssetKind) -> &T {
        match kind {
            AssetKind::Video => &self.video,
            AssetKind::Image => &self.image,
            AssetKind::Audio => &self.audio,
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(AssetKind, T) -> U) -> AssetTriplet<U> {
        AssetTriplet {
            video: f(AssetKind::Video, self.video),
            image: f(AssetKind::Image, self.image),
            audio: f(AssetKind::Audio, self.audio),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (AssetKind, &T)> {
        AssetKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }
}

impl AssetTriplet<String> {
    /// Stable storage keys for a generation (`{id}_video.mp4`, ...).
    pub fn storage_keys(id: &GenerationId) -> Self {
        AssetTriplet::new(AssetKind::Video, AssetKind::Image, AssetKind::Audio)
            .map(|_, kind| format!("{}_{}", id, kind.file_suffix()))
    }
}

/// A complete set of signed URLs issued together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SignedUrlSet {
    pub urls: AssetTriplet<String>,
    pub created_at: DateTime<Utc>,
}

impl SignedUrlSet {
    pub fn new(urls: AssetTriplet<String>, created_at: DateTime<Utc>) -> Self {
        Self { urls, created_at }
    }

    /// Stale once strictly older than the cache TTL.
    pub fn is_stale(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.created_at > ttl
    }
}

/// Cache state of a record's signed URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SignedState {
    /// No signed URLs cached
    Unsigned,
    /// Cached URLs younger than the TTL
    Fresh,
    /// Cached URLs older than the TTL
    Stale,
}

impl SignedState {
    /// Classify an optional signed set at `now`.
    pub fn evaluate(signed: Option<&SignedUrlSet>, now: DateTime<Utc>, ttl: Duration) -> Self {
        match signed {
            None => SignedState::Unsigned,
            Some(set) if set.is_stale(now, ttl) => SignedState::Stale,
            Some(_) => SignedState::Fresh,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SignedState::Unsigned => "unsigned",
            SignedState::Fresh => "fresh",
            SignedState::Stale => "stale",
        }
    }

    pub fn needs_refresh(&self) -> bool {
        !matches!(self, SignedState::Fresh)
    }
}

/// Persistent metadata for one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GenerationRecord {
    pub generation_id: GenerationId,
    /// Owner; only this identity may read signed URLs
    pub user_id: String,
    /// Caption text as submitted
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    /// Stable storage keys
    pub paths: AssetTriplet<String>,
    /// Cached signed URLs, all three or none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed: Option<SignedUrlSet>,
    pub created_at: DateTime<Utc>,
}

impl GenerationRecord {
    /// Create an unsigned record.
    pub fn new(
        generation_id: GenerationId,
        user_id: impl Into<String>,
        text: impl Into<String>,
        template_id: Option<String>,
        paths: AssetTriplet<String>,
    ) -> Self {
        Self {
            generation_id,
            user_id: user_id.into(),
            text: text.into(),
            template_id,
            paths,
            signed: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_signed(mut self, signed: SignedUrlSet) -> Self {
        self.signed = Some(signed);
        self
    }

    pub fn signed_state(&self, now: DateTime<Utc>, ttl: Duration) -> SignedState {
        SignedState::evaluate(self.signed.as_ref(), now, ttl)
    }

    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(tag: &str) -> AssetTriplet<String> {
        AssetTriplet::new(
            format!("https://cdn/{tag}/v"),
            format!("https://cdn/{tag}/i"),
            format!("https://cdn/{tag}/a"),
        )
    }

    #[test]
    fn test_storage_keys() {
        let id = GenerationId::from("abc-123");
        let keys = AssetTriplet::storage_keys(&id);
        assert_eq!(keys.video, "abc-123_video.mp4");
        assert_eq!(keys.image, "abc-123_bg.jpg");
        assert_eq!(keys.audio, "abc-123_audio.mp3");
    }

    #[test]
    fn test_triplet_iter_order() {
        let kinds: Vec<_> = urls("x").iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, AssetKind::ALL.to_vec());
    }

    #[test]
    fn test_signed_state_transitions() {
        let now = Utc::now();
        let ttl = Duration::hours(1);

        assert_eq!(SignedState::evaluate(None, now, ttl), SignedState::Unsigned);

        let fresh = SignedUrlSet::new(urls("f"), now - Duration::minutes(10));
        assert_eq!(SignedState::evaluate(Some(&fresh), now, ttl), SignedState::Fresh);

        let stale = SignedUrlSet::new(urls("s"), now - Duration::hours(2));
        assert_eq!(SignedState::evaluate(Some(&stale), now, ttl), SignedState::Stale);
        assert!(SignedState::Stale.needs_refresh());
        assert!(!SignedState::Fresh.needs_refresh());
    }

    #[test]
    fn test_exactly_ttl_is_still_fresh() {
        let now = Utc::now();
        let set = SignedUrlSet::new(urls("b"), now - Duration::hours(1));
        assert!(!set.is_stale(now, Duration::hours(1)));
    }

    #[test]
    fn test_record_ownership() {
        let record = GenerationRecord::new(
            GenerationId::from("abc-123"),
            "user-1",
            "hello",
            None,
            AssetTriplet::storage_keys(&GenerationId::from("abc-123")),
        );
        assert!(record.is_owned_by("user-1"));
        assert!(!record.is_owned_by("user-2"));
        assert_eq!(
            record.signed_state(Utc::now(), Duration::hours(1)),
            SignedState::Unsigned
        );
    }
}
