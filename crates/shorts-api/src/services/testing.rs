//! Shared fakes for service tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use shorts_models::{AssetKind, AssetTriplet, GenerationId, GenerationRecord, SignedUrlSet};
use shorts_storage::{StorageError, StorageResult, UrlSigner};

/// Signer that counts calls and versions each key's URLs.
#[derive(Default)]
pub struct CountingSigner {
    issued: Mutex<HashMap<String, u32>>,
    fail_for: Option<AssetKind>,
}

impl CountingSigner {
    pub fn failing_for(kind: AssetKind) -> Self {
        Self {
            fail_for: Some(kind),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> u32 {
        self.issued.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl UrlSigner for CountingSigner {
    async fn sign(&self, key: &str, _expires_in: Duration) -> StorageResult<String> {
        let version = {
            let mut issued = self.issued.lock().unwrap();
            let n = issued.entry(key.to_string()).or_insert(0);
            *n += 1;
            *n
        };
        match self.fail_for {
            Some(kind) if key.ends_with(kind.file_suffix()) => {
                Err(StorageError::presign_failed(format!("{key} rejected")))
            }
            _ => Ok(format!("https://signed/{key}?v={version}")),
        }
    }
}

pub fn record(id: &str, user_id: &str) -> GenerationRecord {
    let id = GenerationId::from(id);
    let paths = AssetTriplet::<String>::storage_keys(&id);
    GenerationRecord::new(id, user_id, "caption", None, paths)
}

pub fn signed_set(tag: &str, created_at: DateTime<Utc>) -> SignedUrlSet {
    SignedUrlSet::new(
        AssetTriplet::new(
            format!("https://cdn/{tag}/v"),
            format!("https://cdn/{tag}/i"),
            format!("https://cdn/{tag}/a"),
        ),
        created_at,
    )
}
