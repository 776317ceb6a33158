// Copyright 2025 Cowboy AI, LLC.

//! Document repository contract

use async_trait::async_trait;

use crate::entity::{Document, EntityId};
use crate::errors::{DomainError, DomainResult};

/// Predicate used by filtered reads and deletes
pub type Filter<'a, T> = &'a (dyn Fn(&T) -> bool + Send + Sync);

/// Storage for one document type
///
/// Writes are versioned: `insert` and `replace` return the stored document
/// with its new version, and `replace` is a compare-and-swap that rejects a
/// stale `expected_version` with [`DomainError::ConcurrencyConflict`].
#[async_trait]
pub trait Repository<T: Document>: Send + Sync {
    /// Store a new document; fails with `DuplicateKey` on an id or unique-key clash
    async fn insert(&self, doc: T) -> DomainResult<T>;

    /// Load a document
    async fn find_by_id(&self, id: EntityId<T::Marker>) -> DomainResult<Option<T>>;

    /// All documents in insertion order
    async fn find_all(&self) -> DomainResult<Vec<T>>;

    /// Documents matching `filter`, in insertion order
    async fn find_where(&self, filter: Filter<'_, T>) -> DomainResult<Vec<T>>;

    /// Overwrite a document if its stored version is still `expected_version`
    async fn replace(&self, doc: T, expected_version: u64) -> DomainResult<T>;

    /// Remove a document, returning it if it existed
    async fn delete(&self, id: EntityId<T::Marker>) -> DomainResult<Option<T>>;

    /// Remove every document matching `filter`, returning them
    async fn delete_where(&self, filter: Filter<'_, T>) -> DomainResult<Vec<T>>;

    /// Whether a document exists
    async fn exists(&self, id: EntityId<T::Marker>) -> DomainResult<bool> {
        Ok(self.find_by_id(id).await?.is_some())
    }

    /// Load a document or fail with `EntityNotFound`
    async fn get(&self, id: EntityId<T::Marker>) -> DomainResult<T> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::not_found(T::ENTITY_TYPE, id))
    }
}
