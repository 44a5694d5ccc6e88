//! Background task that clears expired signed-URL caches.
//!
//! Each pass is a single conditional update in the store, so a pass either
//! applies in full or is retried on the next tick.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

use shorts_db::{DbResult, GenerationStore};

use crate::config::SignedUrlConfig;
use crate::metrics;

/// Periodic signed-URL cache sweeper.
pub struct SignedUrlSweeper {
    store: Arc<dyn GenerationStore>,
    ttl: chrono::Duration,
    interval: Duration,
    enabled: bool,
}

impl SignedUrlSweeper {
    pub fn new(store: Arc<dyn GenerationStore>, config: &SignedUrlConfig) -> Self {
        Self {
            store,
            ttl: config.cache_ttl_chrono(),
            interval: config.sweep_interval,
            enabled: config.sweep_enabled,
        }
    }

    /// Clear every cached set older than the TTL. Returns the number cleared.
    pub async fn sweep_expired(&self) -> DbResult<u64> {
        self.sweep_expired_at(Utc::now()).await
    }

    pub async fn sweep_expired_at(&self, now: DateTime<Utc>) -> DbResult<u64> {
        let cutoff = now - self.ttl;
        let result = self.store.clear_signed_before(cutoff).await;
        metrics::record_sweep(result.as_ref().ok().copied());

        let cleared = result?;
        if cleared > 0 {
            info!(cleared, cutoff = %cutoff, "Cleared expired signed URLs");
        } else {
            debug!(cutoff = %cutoff, "No expired signed URLs");
        }
        Ok(cleared)
    }

    /// Run until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// A sweep in progress is allowed to finish before the loop exits.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        if !self.enabled {
            info!("Signed URL sweep is disabled");
            return;
        }

        info!("Starting signed URL sweeper (interval: {:?})", self.interval);

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep_expired().await {
                        error!("Signed URL sweep failed: {}", e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Signed URL sweeper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{record, signed_set};
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use shorts_db::{DbError, MemoryStore};
    use shorts_models::{GenerationId, GenerationRecord, SignedUrlSet};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn sweeper(store: Arc<dyn GenerationStore>) -> SignedUrlSweeper {
        SignedUrlSweeper::new(store, &SignedUrlConfig::default())
    }

    #[tokio::test]
    async fn test_second_sweep_clears_nothing() {
        let now = Utc::now();
        let store = Arc::new(MemoryStore::new());
        store
            .insert(&record("old", "u").with_signed(signed_set("o", now - ChronoDuration::hours(2))))
            .await
            .unwrap();
        store
            .insert(&record("new", "u").with_signed(signed_set("n", now - ChronoDuration::minutes(5))))
            .await
            .unwrap();
        store.insert(&record("bare", "u")).await.unwrap();

        let sweeper = sweeper(store.clone());
        assert_eq!(sweeper.sweep_expired_at(now).await.unwrap(), 1);
        assert_eq!(sweeper.sweep_expired_at(now).await.unwrap(), 0);

        let old = store.get(&GenerationId::from("old")).await.unwrap().unwrap();
        assert!(old.signed.is_none());
        let new = store.get(&GenerationId::from("new")).await.unwrap().unwrap();
        assert!(new.signed.is_some());
    }

    /// Store whose sweep fails a fixed number of times.
    struct FailingSweepStore {
        attempts: AtomicU32,
    }

    #[async_trait]
    impl GenerationStore for FailingSweepStore {
        async fn get(&self, _id: &GenerationId) -> DbResult<Option<GenerationRecord>> {
            Ok(None)
        }

        async fn insert(&self, _record: &GenerationRecord) -> DbResult<()> {
            Ok(())
        }

        async fn store_signed_urls(&self, _id: &GenerationId, _signed: &SignedUrlSet) -> DbResult<()> {
            Ok(())
        }

        async fn clear_signed_before(&self, _cutoff: DateTime<Utc>) -> DbResult<u64> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(DbError::ServerError(503, "unavailable".into()))
        }

        async fn ping(&self) -> DbResult<()> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_sweeps_do_not_stop_the_loop() {
        let store = Arc::new(FailingSweepStore {
            attempts: AtomicU32::new(0),
        });
        let config = SignedUrlConfig {
            sweep_interval: Duration::from_secs(60),
            ..SignedUrlConfig::default()
        };
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(SignedUrlSweeper::new(store.clone(), &config).run(rx));

        tokio::time::sleep(Duration::from_secs(150)).await;
        assert_eq!(store.attempts.load(Ordering::SeqCst), 3);

        tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_disabled_sweeper_returns_immediately() {
        let config = SignedUrlConfig {
            sweep_enabled: false,
            ..SignedUrlConfig::default()
        };
        let (_tx, rx) = watch::channel(false);
        SignedUrlSweeper::new(Arc::new(MemoryStore::new()), &config)
            .run(rx)
            .await;
    }

    #[tokio::test]
    async fn test_dropped_sender_stops_the_loop() {
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(sweeper(Arc::new(MemoryStore::new())).run(rx));
        drop(tx);
        handle.await.unwrap();
    }
}
