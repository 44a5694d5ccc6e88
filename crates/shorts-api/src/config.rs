//! API configuration.
//!
//! Read once from the environment at startup and injected into the
//! services; nothing below `main` looks at env vars.

use std::str::FromStr;
use std::time::Duration;

use shorts_media::RenderOptions;
use shorts_models::CaptionStyle;
use shorts_storage::{SigningPolicy, MAX_PRESIGN_EXPIRY};

/// Parse `key` or fall back to `default` when unset or malformed.
fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(default)
}

fn env_secs(key: &str, default: u64) -> Duration {
    Duration::from_secs(env_parse(key, default))
}

/// Where generation records and templates live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// PostgREST tables
    Rest,
    /// Process memory, lost on restart
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rest" => Ok(Self::Rest),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend: {other}")),
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Serve Prometheus metrics at `/metrics`
    pub metrics_enabled: bool,
    /// Record store backend
    pub store_backend: StoreBackend,
    pub signed_urls: SignedUrlConfig,
    pub render: RenderConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            // Renders alone may take up to three minutes
            request_timeout: Duration::from_secs(300),
            max_body_size: 10 * 1024 * 1024, // 10MB
            environment: "development".to_string(),
            metrics_enabled: true,
            store_backend: StoreBackend::Rest,
            signed_urls: SignedUrlConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT", defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            request_timeout: env_secs("REQUEST_TIMEOUT", defaults.request_timeout.as_secs()),
            max_body_size: env_parse("MAX_BODY_SIZE", defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            metrics_enabled: env_flag("METRICS_ENABLED", defaults.metrics_enabled),
            store_backend: env_parse("STORE_BACKEND", defaults.store_backend),
            signed_urls: SignedUrlConfig::from_env(),
            render: RenderConfig::from_env(),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

/// Signed-URL cache and signing settings.
///
/// `cache_ttl` governs when a cached set is considered stale; `url_expiry`
/// is the validity requested from storage. The two are independent.
#[derive(Debug, Clone)]
pub struct SignedUrlConfig {
    pub cache_ttl: Duration,
    pub url_expiry: Duration,
    pub sweep_interval: Duration,
    pub sweep_enabled: bool,
    pub signing_timeout: Duration,
}

impl Default for SignedUrlConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(3600),
            url_expiry: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(3600),
            sweep_enabled: true,
            signing_timeout: Duration::from_secs(10),
        }
    }
}

impl SignedUrlConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_ttl: env_secs("SIGNED_CACHE_TTL_SECS", defaults.cache_ttl.as_secs()),
            url_expiry: env_secs("SIGNED_URL_EXPIRY_SECS", defaults.url_expiry.as_secs())
                .min(MAX_PRESIGN_EXPIRY),
            sweep_interval: env_secs(
                "SIGNED_SWEEP_INTERVAL_SECS",
                defaults.sweep_interval.as_secs(),
            )
            .max(Duration::from_secs(1)),
            sweep_enabled: env_flag("ENABLE_SIGNED_SWEEP", defaults.sweep_enabled),
            signing_timeout: env_secs(
                "SIGNING_TIMEOUT_SECS",
                defaults.signing_timeout.as_secs(),
            ),
        }
    }

    /// Cache TTL as a calendar duration for timestamp math.
    pub fn cache_ttl_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.cache_ttl).unwrap_or(chrono::Duration::hours(1))
    }

    pub fn signing_policy(&self) -> SigningPolicy {
        SigningPolicy {
            expires_in: self.url_expiry,
            timeout: self.signing_timeout,
            ..SigningPolicy::default()
        }
    }
}

/// Rendering and input download settings.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub timeout_secs: u64,
    /// Longest video produced; longer audio is cut
    pub max_video_secs: f64,
    /// Caption font file; `None` renders through fontconfig by family
    pub font_file: Option<String>,
    pub font_family: String,
    pub download_timeout: Duration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let style = CaptionStyle::default();
        Self {
            timeout_secs: RenderOptions::default().timeout_secs,
            max_video_secs: 59.0,
            font_file: style.font_file,
            font_family: style.font_family,
            download_timeout: Duration::from_secs(30),
        }
    }
}

impl RenderConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            timeout_secs: env_parse("RENDER_TIMEOUT_SECS", defaults.timeout_secs),
            max_video_secs: env_parse("MAX_VIDEO_SECS", defaults.max_video_secs),
            font_file: match std::env::var("CAPTION_FONT_FILE") {
                Ok(v) if v.trim().is_empty() => None,
                Ok(v) => Some(v),
                Err(_) => defaults.font_file,
            },
            font_family: std::env::var("CAPTION_FONT_FAMILY").unwrap_or(defaults.font_family),
            download_timeout: env_secs(
                "DOWNLOAD_TIMEOUT_SECS",
                defaults.download_timeout.as_secs(),
            ),
        }
    }

    /// Base caption style for non-template renders.
    pub fn caption_style(&self) -> CaptionStyle {
        CaptionStyle {
            font_family: self.font_family.clone(),
            font_file: self.font_file.clone(),
            ..CaptionStyle::default()
        }
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            timeout_secs: self.timeout_secs,
            ..RenderOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "API_PORT",
        "CORS_ORIGINS",
        "STORE_BACKEND",
        "METRICS_ENABLED",
        "SIGNED_CACHE_TTL_SECS",
        "SIGNED_URL_EXPIRY_SECS",
        "CAPTION_FONT_FILE",
    ];

    fn clear() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear();
        let config = ApiConfig::from_env();
        assert_eq!(config.port, 8000);
        assert_eq!(config.cors_origins, vec!["*"]);
        assert_eq!(config.store_backend, StoreBackend::Rest);
        assert!(config.metrics_enabled);
        assert_eq!(config.signed_urls.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.render.timeout_secs, 180);
        assert_eq!(config.render.font_file.as_deref(), Some("NotoSansKR-VF.ttf"));
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear();
        std::env::set_var("API_PORT", "9001");
        std::env::set_var("CORS_ORIGINS", "https://a.example, https://b.example");
        std::env::set_var("STORE_BACKEND", "memory");
        std::env::set_var("METRICS_ENABLED", "false");
        std::env::set_var("CAPTION_FONT_FILE", "");

        let config = ApiConfig::from_env();
        assert_eq!(config.port, 9001);
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert!(!config.metrics_enabled);
        assert!(config.render.font_file.is_none());
        clear();
    }

    #[test]
    #[serial]
    fn test_ttl_and_expiry_are_independent() {
        clear();
        std::env::set_var("SIGNED_CACHE_TTL_SECS", "600");
        std::env::set_var("SIGNED_URL_EXPIRY_SECS", "86400");

        let signed = SignedUrlConfig::from_env();
        assert_eq!(signed.cache_ttl, Duration::from_secs(600));
        assert_eq!(signed.url_expiry, Duration::from_secs(86400));
        assert_eq!(signed.cache_ttl_chrono(), chrono::Duration::minutes(10));
        assert_eq!(signed.signing_policy().expires_in, Duration::from_secs(86400));
        clear();
    }

    #[test]
    #[serial]
    fn test_url_expiry_is_capped() {
        clear();
        std::env::set_var("SIGNED_URL_EXPIRY_SECS", "9999999");
        assert_eq!(SignedUrlConfig::from_env().url_expiry, MAX_PRESIGN_EXPIRY);
        clear();
    }

    #[test]
    #[serial]
    fn test_malformed_values_fall_back() {
        clear();
        std::env::set_var("API_PORT", "not-a-port");
        std::env::set_var("STORE_BACKEND", "sqlite");
        let config = ApiConfig::from_env();
        assert_eq!(config.port, 8000);
        assert_eq!(config.store_backend, StoreBackend::Rest);
        clear();
    }
}
