// Copyright 2025 Cowboy AI, LLC.

//! Repository wrapper that adds metrics collection

use async_trait::async_trait;
use std::sync::Arc;

use super::metrics::{MetricsTimer, PersistenceMetrics};
use super::repository::{Filter, Repository};
use crate::entity::{Document, EntityId};
use crate::errors::DomainResult;

/// Times every call and counts hits, misses and errors per collection.
///
/// Operation names are `<collection>.<operation>`, e.g. `materials.replace`.
pub struct InstrumentedRepository<T: Document> {
    inner: Arc<dyn Repository<T>>,
    metrics: PersistenceMetrics,
}

impl<T: Document> Clone for InstrumentedRepository<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            metrics: self.metrics.clone(),
        }
    }
}

impl<T: Document> InstrumentedRepository<T> {
    /// Wrap `inner`, reporting into `metrics`
    pub fn new(inner: Arc<dyn Repository<T>>, metrics: PersistenceMetrics) -> Self {
        Self { inner, metrics }
    }

    /// Get the metrics collector
    pub fn metrics(&self) -> &PersistenceMetrics {
        &self.metrics
    }

    fn timer(&self, operation: &str) -> MetricsTimer<'_> {
        MetricsTimer::new(&self.metrics, format!("{}.{operation}", T::COLLECTION))
    }

    async fn count(&self, operation: &str, outcome: &str) {
        self.metrics
            .increment(&format!("{}.{operation}.{outcome}", T::COLLECTION))
            .await;
    }

    async fn observe<R>(
        &self,
        timer: MetricsTimer<'_>,
        operation: &str,
        result: DomainResult<R>,
    ) -> DomainResult<R> {
        match result {
            Ok(value) => {
                timer.record().await;
                Ok(value)
            }
            Err(e) => {
                timer.record_error().await;
                if e.is_concurrency_error() {
                    self.count(operation, "conflict").await;
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl<T: Document> Repository<T> for InstrumentedRepository<T> {
    async fn insert(&self, doc: T) -> DomainResult<T> {
        let timer = self.timer("insert");
        let result = self.inner.insert(doc).await;
        self.observe(timer, "insert", result).await
    }

    async fn find_by_id(&self, id: EntityId<T::Marker>) -> DomainResult<Option<T>> {
        let timer = self.timer("find_by_id");
        let result = self.inner.find_by_id(id).await;
        if let Ok(found) = &result {
            let outcome = if found.is_some() { "hit" } else { "miss" };
            self.count("find_by_id", outcome).await;
        }
        self.observe(timer, "find_by_id", result).await
    }

    async fn find_all(&self) -> DomainResult<Vec<T>> {
        let timer = self.timer("find_all");
        let result = self.inner.find_all().await;
        self.observe(timer, "find_all", result).await
    }

    async fn find_where(&self, filter: Filter<'_, T>) -> DomainResult<Vec<T>> {
        let timer = self.timer("find_where");
        let result = self.inner.find_where(filter).await;
        self.observe(timer, "find_where", result).await
    }

    async fn replace(&self, doc: T, expected_version: u64) -> DomainResult<T> {
        let timer = self.timer("replace");
        let result = self.inner.replace(doc, expected_version).await;
        self.observe(timer, "replace", result).await
    }

    async fn delete(&self, id: EntityId<T::Marker>) -> DomainResult<Option<T>> {
        let timer = self.timer("delete");
        let result = self.inner.delete(id).await;
        self.observe(timer, "delete", result).await
    }

    async fn delete_where(&self, filter: Filter<'_, T>) -> DomainResult<Vec<T>> {
        let timer = self.timer("delete_where");
        let result = self.inner.delete_where(filter).await;
        self.observe(timer, "delete_where", result).await
    }
}
