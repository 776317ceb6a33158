// Copyright 2025 Cowboy AI, LLC.

//! In-memory document storage

use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::repository::{Filter, Repository};
use crate::entity::{Document, EntityId};
use crate::errors::{DomainError, DomainResult};

struct Collection<T> {
    docs: IndexMap<Uuid, T>,
    unique: HashMap<(&'static str, String), Uuid>,
}

impl<T: Document> Collection<T> {
    fn check_unique(&self, doc: &T) -> DomainResult<()> {
        let owner = *doc.id().as_uuid();
        for (key, value) in doc.unique_keys() {
            if let Some(existing) = self.unique.get(&(key, value.clone())) {
                if *existing != owner {
                    return Err(DomainError::DuplicateKey {
                        collection: T::COLLECTION.to_string(),
                        key: key.to_string(),
                        value,
                    });
                }
            }
        }
        Ok(())
    }

    fn index(&mut self, doc: &T) {
        let owner = *doc.id().as_uuid();
        for entry in doc.unique_keys() {
            self.unique.insert(entry, owner);
        }
    }

    fn unindex(&mut self, doc: &T) {
        for entry in doc.unique_keys() {
            self.unique.remove(&entry);
        }
    }
}

/// Repository backed by an insertion-ordered map behind a tokio `RwLock`
///
/// Clones share the same storage.
pub struct InMemoryRepository<T> {
    inner: Arc<RwLock<Collection<T>>>,
}

impl<T> Clone for InMemoryRepository<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Document> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Document> InMemoryRepository<T> {
    /// Create an empty repository
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Collection {
                docs: IndexMap::new(),
                unique: HashMap::new(),
            })),
        }
    }

    /// Number of stored documents
    pub async fn len(&self) -> usize {
        self.inner.read().await.docs.len()
    }

    /// Whether nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.docs.is_empty()
    }
}

#[async_trait]
impl<T: Document> Repository<T> for InMemoryRepository<T> {
    async fn insert(&self, mut doc: T) -> DomainResult<T> {
        let mut collection = self.inner.write().await;
        let id = *doc.id().as_uuid();
        if collection.docs.contains_key(&id) {
            return Err(DomainError::DuplicateKey {
                collection: T::COLLECTION.to_string(),
                key: "id".to_string(),
                value: id.to_string(),
            });
        }
        collection.check_unique(&doc)?;

        doc.set_version(doc.version() + 1);
        collection.index(&doc);
        collection.docs.insert(id, doc.clone());
        debug!(collection = T::COLLECTION, %id, version = doc.version(), "inserted");
        Ok(doc)
    }

    async fn find_by_id(&self, id: EntityId<T::Marker>) -> DomainResult<Option<T>> {
        Ok(self.inner.read().await.docs.get(id.as_uuid()).cloned())
    }

    async fn find_all(&self) -> DomainResult<Vec<T>> {
        Ok(self.inner.read().await.docs.values().cloned().collect())
    }

    async fn find_where(&self, filter: Filter<'_, T>) -> DomainResult<Vec<T>> {
        Ok(self
            .inner
            .read()
            .await
            .docs
            .values()
            .filter(|doc| filter(*doc))
            .cloned()
            .collect())
    }

    async fn replace(&self, mut doc: T, expected_version: u64) -> DomainResult<T> {
        let mut collection = self.inner.write().await;
        let id = *doc.id().as_uuid();
        let stored = collection
            .docs
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(T::ENTITY_TYPE, id))?;
        if stored.version() != expected_version {
            return Err(DomainError::ConcurrencyConflict {
                expected: expected_version,
                actual: stored.version(),
            });
        }
        collection.check_unique(&doc)?;

        collection.unindex(&stored);
        doc.set_version(expected_version + 1);
        collection.index(&doc);
        collection.docs.insert(id, doc.clone());
        debug!(collection = T::COLLECTION, %id, version = doc.version(), "replaced");
        Ok(doc)
    }

    async fn delete(&self, id: EntityId<T::Marker>) -> DomainResult<Option<T>> {
        let mut collection = self.inner.write().await;
        let removed = collection.docs.shift_remove(id.as_uuid());
        if let Some(doc) = &removed {
            collection.unindex(doc);
            debug!(collection = T::COLLECTION, %id, "deleted");
        }
        Ok(removed)
    }

    async fn delete_where(&self, filter: Filter<'_, T>) -> DomainResult<Vec<T>> {
        let mut collection = self.inner.write().await;
        let doomed: Vec<Uuid> = collection
            .docs
            .iter()
            .filter(|(_, doc)| filter(*doc))
            .map(|(id, _)| *id)
            .collect();

        let mut removed = Vec::with_capacity(doomed.len());
        for id in doomed {
            if let Some(doc) = collection.docs.shift_remove(&id) {
                collection.unindex(&doc);
                removed.push(doc);
            }
        }
        debug!(collection = T::COLLECTION, count = removed.len(), "deleted matching");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Client, NewClient};
    use chrono::Utc;

    fn client(email: &str) -> Client {
        Client::new(
            NewClient {
                name: "Client".into(),
                email: email.into(),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_first_version() {
        let repo: InMemoryRepository<Client> = InMemoryRepository::new();
        let saved = repo.insert(client("a@x.example")).await.unwrap();
        assert_eq!(saved.version(), 1);
        assert!(repo.exists(saved.id()).await.unwrap());
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn test_unique_key_enforced_case_insensitively() {
        let repo: InMemoryRepository<Client> = InMemoryRepository::new();
        repo.insert(client("a@x.example")).await.unwrap();
        let err = repo.insert(client("A@X.example")).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::DuplicateKey { ref key, .. } if key == "email"
        ));
    }

    #[tokio::test]
    async fn test_replace_is_compare_and_swap() {
        let repo: InMemoryRepository<Client> = InMemoryRepository::new();
        let saved = repo.insert(client("a@x.example")).await.unwrap();

        let updated = repo.replace(saved.clone(), 1).await.unwrap();
        assert_eq!(updated.version(), 2);

        let err = repo.replace(saved, 1).await.unwrap_err();
        assert_eq!(
            err,
            DomainError::ConcurrencyConflict {
                expected: 1,
                actual: 2
            }
        );
    }

    #[tokio::test]
    async fn test_delete_frees_unique_key() {
        let repo: InMemoryRepository<Client> = InMemoryRepository::new();
        let saved = repo.insert(client("a@x.example")).await.unwrap();
        assert!(repo.delete(saved.id()).await.unwrap().is_some());
        assert!(repo.delete(saved.id()).await.unwrap().is_none());
        repo.insert(client("a@x.example")).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_where_keeps_order_of_survivors() {
        let repo: InMemoryRepository<Client> = InMemoryRepository::new();
        let a = repo.insert(client("a@x.example")).await.unwrap();
        repo.insert(client("b@x.example")).await.unwrap();
        let c = repo.insert(client("c@x.example")).await.unwrap();

        let removed = repo
            .delete_where(&|doc: &Client| doc.email().starts_with('b'))
            .await
            .unwrap();
        assert_eq!(removed.len(), 1);

        let ids: Vec<_> = repo
            .find_all()
            .await
            .unwrap()
            .iter()
            .map(|d| d.id())
            .collect();
        assert_eq!(ids, vec![a.id(), c.id()]);
    }
}
