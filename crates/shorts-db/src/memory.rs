//! In-process stores for local development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use shorts_models::{GenerationId, GenerationRecord, SignedUrlSet, Template};

use crate::error::{DbError, DbResult};
use crate::store::{GenerationStore, TemplateStore};

/// Generation and template store kept in memory.
#[derive(Default)]
pub struct MemoryStore {
    generations: RwLock<HashMap<GenerationId, GenerationRecord>>,
    templates: RwLock<HashMap<String, Template>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template.
    pub async fn put_template(&self, template: Template) {
        self.templates
            .write()
            .await
            .insert(template.template_id.clone(), template);
    }

    /// Number of stored generation records.
    pub async fn len(&self) -> usize {
        self.generations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl GenerationStore for MemoryStore {
    async fn get(&self, id: &GenerationId) -> DbResult<Option<GenerationRecord>> {
        Ok(self.generations.read().await.get(id).cloned())
    }

    async fn insert(&self, record: &GenerationRecord) -> DbResult<()> {
        let mut generations = self.generations.write().await;
        if generations.contains_key(&record.generation_id) {
            return Err(DbError::AlreadyExists(record.generation_id.to_string()));
        }
        generations.insert(record.generation_id.clone(), record.clone());
        Ok(())
    }

    async fn store_signed_urls(&self, id: &GenerationId, signed: &SignedUrlSet) -> DbResult<()> {
        let mut generations = self.generations.write().await;
        let record = generations
            .get_mut(id)
            .ok_or_else(|| DbError::not_found(format!("generation {id}")))?;
        record.signed = Some(signed.clone());
        Ok(())
    }

    async fn clear_signed_before(&self, cutoff: DateTime<Utc>) -> DbResult<u64> {
        let mut cleared = 0;
        for record in self.generations.write().await.values_mut() {
            if record.signed.as_ref().is_some_and(|s| s.created_at < cutoff) {
                record.signed = None;
                cleared += 1;
            }
        }
        Ok(cleared)
    }

    async fn ping(&self) -> DbResult<()> {
        Ok(())
    }
}

#[async_trait]
impl TemplateStore for MemoryStore {
    async fn get_template(&self, template_id: &str) -> DbResult<Option<Template>> {
        Ok(self.templates.read().await.get(template_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use shorts_models::AssetTriplet;

    fn record(id: &str) -> GenerationRecord {
        let id = GenerationId::from(id);
        GenerationRecord::new(
            id.clone(),
            "user-1",
            "text",
            None,
            AssetTriplet::<String>::storage_keys(&id),
        )
    }

    fn signed_at(created_at: DateTime<Utc>) -> SignedUrlSet {
        SignedUrlSet::new(
            AssetTriplet::new("v".into(), "i".into(), "a".into()),
            created_at,
        )
    }

    #[tokio::test]
    async fn test_insert_get_and_duplicate() {
        let store = MemoryStore::new();
        store.insert(&record("a")).await.unwrap();
        assert!(store.get(&GenerationId::from("a")).await.unwrap().is_some());
        assert!(matches!(
            store.insert(&record("a")).await,
            Err(DbError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_clear_is_strictly_before_cutoff() {
        let store = MemoryStore::new();
        let cutoff = Utc::now();
        store.insert(&record("old").with_signed(signed_at(cutoff - Duration::seconds(1)))).await.unwrap();
        store.insert(&record("edge").with_signed(signed_at(cutoff))).await.unwrap();
        store.insert(&record("none")).await.unwrap();

        assert_eq!(store.clear_signed_before(cutoff).await.unwrap(), 1);
        assert!(store.get(&GenerationId::from("old")).await.unwrap().unwrap().signed.is_none());
        assert!(store.get(&GenerationId::from("edge")).await.unwrap().unwrap().signed.is_some());
    }

    #[tokio::test]
    async fn test_store_signed_on_missing_record() {
        let store = MemoryStore::new();
        let err = store
            .store_signed_urls(&GenerationId::from("x"), &signed_at(Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));
    }
}
