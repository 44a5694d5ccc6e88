//! Time-limited URL signing with a bounded retry.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures_util::future::try_join3;
use metrics::{counter, histogram};
use shorts_models::{AssetKind, AssetTriplet};
use tracing::{debug, warn};

use crate::client::R2Client;
use crate::error::{StorageError, StorageResult};

/// Metric name constants.
pub mod names {
    /// Signing calls by outcome.
    pub const SIGN_REQUESTS_TOTAL: &str = "shorts_sign_requests_total";
    /// Signing retries.
    pub const SIGN_RETRIES_TOTAL: &str = "shorts_sign_retries_total";
    /// Latency of one signed triplet.
    pub const SIGN_LATENCY_SECONDS: &str = "shorts_sign_latency_seconds";
}

/// Issues time-limited read URLs for stored objects.
#[async_trait]
pub trait UrlSigner: Send + Sync {
    async fn sign(&self, key: &str, expires_in: Duration) -> StorageResult<String>;
}

#[async_trait]
impl UrlSigner for R2Client {
    async fn sign(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        self.presign_get(key, expires_in).await
    }
}

/// Per-call limits for signing.
#[derive(Debug, Clone)]
pub struct SigningPolicy {
    /// Validity of issued URLs
    pub expires_in: Duration,
    /// Timeout for one signing attempt
    pub timeout: Duration,
    /// Extra attempts after the first failure
    pub max_retries: u32,
    /// Delay before a retry
    pub retry_backoff: Duration,
}

impl Default for SigningPolicy {
    fn default() -> Self {
        Self {
            expires_in: Duration::from_secs(3600),
            timeout: Duration::from_secs(10),
            max_retries: 1,
            retry_backoff: Duration::from_millis(200),
        }
    }
}

/// Sign one key, retrying transient failures per `policy`.
pub async fn sign_with_retry(
    signer: &dyn UrlSigner,
    key: &str,
    policy: &SigningPolicy,
) -> StorageResult<String> {
    let mut attempt = 0u32;
    loop {
        let result = match tokio::time::timeout(policy.timeout, signer.sign(key, policy.expires_in)).await
        {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout(policy.timeout.as_millis() as u64)),
        };

        match result {
            Ok(url) => return Ok(url),
            Err(e) if attempt < policy.max_retries && e.is_transient() => {
                attempt += 1;
                counter!(names::SIGN_RETRIES_TOTAL).increment(1);
                warn!(key, attempt, error = %e, "Signing failed, retrying");
                tokio::time::sleep(policy.retry_backoff * attempt).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Sign all three keys of a generation concurrently.
///
/// Either every URL is returned or an error is; partial sets never escape.
pub async fn sign_triplet(
    signer: &dyn UrlSigner,
    keys: &AssetTriplet<String>,
    policy: &SigningPolicy,
) -> StorageResult<AssetTriplet<String>> {
    let started = Instant::now();
    let sign = |kind: AssetKind| sign_with_retry(signer, keys.get(kind), policy);

    let result = try_join3(
        sign(AssetKind::Video),
        sign(AssetKind::Image),
        sign(AssetKind::Audio),
    )
    .await;

    let outcome = if result.is_ok() { "success" } else { "failure" };
    counter!(names::SIGN_REQUESTS_TOTAL, "outcome" => outcome).increment(1);
    histogram!(names::SIGN_LATENCY_SECONDS).record(started.elapsed().as_secs_f64());

    let (video, image, audio) = result?;
    debug!(video_key = %keys.video, "Signed asset triplet");
    Ok(AssetTriplet::new(video, image, audio))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` calls, then succeeds.
    struct FlakySigner {
        calls: AtomicU32,
        failures: u32,
        delay: Duration,
    }

    impl FlakySigner {
        fn new(failures: u32) -> Self {
            Self {
                calls: AtomicU32::new(0),
                failures,
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl UrlSigner for FlakySigner {
        async fn sign(&self, key: &str, _expires_in: Duration) -> StorageResult<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if n < self.failures {
                Err(StorageError::presign_failed("boom"))
            } else {
                Ok(format!("https://signed/{key}"))
            }
        }
    }

    fn policy() -> SigningPolicy {
        SigningPolicy {
            retry_backoff: Duration::from_millis(1),
            ..SigningPolicy::default()
        }
    }

    #[tokio::test]
    async fn test_single_retry_recovers() {
        let signer = FlakySigner::new(1);
        let url = sign_with_retry(&signer, "k", &policy()).await.unwrap();
        assert_eq!(url, "https://signed/k");
        assert_eq!(signer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_one_retry() {
        let signer = FlakySigner::new(5);
        tokio_test::assert_err!(sign_with_retry(&signer, "k", &policy()).await);
        assert_eq!(signer.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_config_errors_are_not_retried() {
        struct Misconfigured;

        #[async_trait]
        impl UrlSigner for Misconfigured {
            async fn sign(&self, _key: &str, _expires_in: Duration) -> StorageResult<String> {
                Err(StorageError::config_error("no bucket"))
            }
        }

        let err = sign_with_retry(&Misconfigured, "k", &policy()).await.unwrap_err();
        assert!(matches!(err, StorageError::ConfigError(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_signer_times_out() {
        let signer = FlakySigner {
            delay: Duration::from_secs(60),
            ..FlakySigner::new(0)
        };
        let policy = SigningPolicy {
            timeout: Duration::from_secs(1),
            max_retries: 0,
            ..policy()
        };
        let err = sign_with_retry(&signer, "k", &policy).await.unwrap_err();
        assert!(matches!(err, StorageError::Timeout(1000)));
    }

    #[tokio::test]
    async fn test_sign_triplet_all_or_nothing() {
        let keys = AssetTriplet::new("v".to_string(), "i".to_string(), "a".to_string());

        let ok = sign_triplet(&FlakySigner::new(0), &keys, &policy()).await.unwrap();
        assert_eq!(ok.image, "https://signed/i");

        let no_retry = SigningPolicy {
            max_retries: 0,
            ..policy()
        };
        assert!(sign_triplet(&FlakySigner::new(1), &keys, &no_retry).await.is_err());
    }
}
