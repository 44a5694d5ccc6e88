//! Object upload seam and generation-level upload helpers.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::future::try_join3;
use shorts_models::{AssetKind, AssetTriplet, GenerationId};
use tracing::info;

use crate::client::R2Client;
use crate::error::StorageResult;

/// Write access to the object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload a local file under `key`.
    async fn put_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()>;

    /// Cheap reachability probe for readiness checks.
    async fn ping(&self) -> StorageResult<()>;
}

#[async_trait]
impl ObjectStore for R2Client {
    async fn put_file(&self, path: &Path, key: &str, content_type: &str) -> StorageResult<()> {
        self.upload_file(path, key, content_type).await
    }

    async fn ping(&self) -> StorageResult<()> {
        self.check_connectivity().await
    }
}

/// Upload the rendered video, background image and audio of a generation.
///
/// Returns the storage keys. All three uploads run concurrently and the
/// first failure aborts the set.
pub async fn upload_generation_assets(
    store: &dyn ObjectStore,
    generation_id: &GenerationId,
    files: &AssetTriplet<PathBuf>,
) -> StorageResult<AssetTriplet<String>> {
    let keys = AssetTriplet::<String>::storage_keys(generation_id);

    let upload = |kind: AssetKind| {
        let path = files.get(kind);
        let key = keys.get(kind);
        async move { store.put_file(path, key, kind.content_type()).await }
    };

    try_join3(
        upload(AssetKind::Video),
        upload(AssetKind::Image),
        upload(AssetKind::Audio),
    )
    .await?;

    info!(generation_id = %generation_id, "Uploaded generation assets");
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        uploads: Mutex<Vec<(String, String)>>,
        fail_key_suffix: Option<&'static str>,
    }

    #[async_trait]
    impl ObjectStore for RecordingStore {
        async fn put_file(&self, _path: &Path, key: &str, content_type: &str) -> StorageResult<()> {
            if self.fail_key_suffix.is_some_and(|s| key.ends_with(s)) {
                return Err(StorageError::upload_failed(key));
            }
            self.uploads
                .lock()
                .unwrap()
                .push((key.to_string(), content_type.to_string()));
            Ok(())
        }

        async fn ping(&self) -> StorageResult<()> {
            Ok(())
        }
    }

    fn files() -> AssetTriplet<PathBuf> {
        AssetTriplet::new(
            PathBuf::from("/tmp/out.mp4"),
            PathBuf::from("/tmp/bg.jpg"),
            PathBuf::from("/tmp/audio.mp3"),
        )
    }

    #[tokio::test]
    async fn test_uploads_under_stable_keys() {
        let store = RecordingStore::default();
        let id = GenerationId::from("gen-1");
        let keys = upload_generation_assets(&store, &id, &files()).await.unwrap();

        assert_eq!(keys.video, "gen-1_video.mp4");
        let mut uploads = store.uploads.lock().unwrap().clone();
        uploads.sort();
        assert_eq!(
            uploads,
            vec![
                ("gen-1_audio.mp3".to_string(), "audio/mpeg".to_string()),
                ("gen-1_bg.jpg".to_string(), "image/jpeg".to_string()),
                ("gen-1_video.mp4".to_string(), "video/mp4".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_single_failure_fails_the_set() {
        let store = RecordingStore {
            fail_key_suffix: Some("_bg.jpg"),
            ..Default::default()
        };
        let result = upload_generation_assets(&store, &GenerationId::from("g"), &files()).await;
        assert!(matches!(result, Err(StorageError::UploadFailed(_))));
    }
}
