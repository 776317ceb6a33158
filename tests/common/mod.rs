// Copyright 2025 Cowboy AI, LLC.

//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use siteworks_domain::persistence::Filter;
use siteworks_domain::{
    ConstructionServices, CoreConfig, Document, DomainError, DomainResult, EntityId, EquipmentLine,
    MaterialId, MaterialLine, NewEquipment, NewMaterial, NewProject, NewUser, ProjectId,
    RecordingSink, Repository, Store, User, UserId, UserRole,
};

/// Route library logs to the test writer; safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Services over a fresh in-memory store, with a recording sink
pub struct Harness {
    pub store: Store,
    pub sink: RecordingSink,
    pub services: ConstructionServices,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Store::in_memory(), CoreConfig::default())
    }

    pub fn with_config(config: CoreConfig) -> Self {
        Self::with_store(Store::in_memory(), config)
    }

    pub fn with_store(store: Store, config: CoreConfig) -> Self {
        init_tracing();
        let sink = RecordingSink::new();
        let services = ConstructionServices::new(store.clone(), Arc::new(sink.clone()), config);
        Self {
            store,
            sink,
            services,
        }
    }

    pub async fn user(&self, name: &str) -> UserId {
        let user = User::new(
            NewUser {
                name: name.to_string(),
                email: format!("{}@siteworks.test", name.to_lowercase()),
                role: UserRole::Supervisor,
            },
            Utc::now(),
        )
        .unwrap();
        self.store.users.insert(user).await.unwrap().id()
    }

    pub async fn project(&self, name: &str) -> ProjectId {
        self.services
            .projects
            .create_project(NewProject {
                name: name.to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
            .entity
            .id()
    }

    pub async fn material(&self, name: &str, quantity: i64, min_stock_level: i64) -> MaterialId {
        self.services
            .stock
            .create_material(new_material(name, quantity, min_stock_level))
            .await
            .unwrap()
            .entity
            .id()
    }

    pub async fn equipment(&self, name: &str) -> siteworks_domain::EquipmentId {
        self.services
            .equipment
            .create_equipment(NewEquipment {
                name: name.to_string(),
                equipment_type: "plant".to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
            .entity
            .id()
    }

    pub async fn quantity(&self, material: MaterialId) -> Decimal {
        self.store.require_material(material).await.unwrap().quantity()
    }
}

pub fn new_material(name: &str, quantity: i64, min_stock_level: i64) -> NewMaterial {
    NewMaterial {
        name: name.to_string(),
        material_type: "bulk".to_string(),
        unit: "t".to_string(),
        quantity: Decimal::from(quantity),
        unit_price: Decimal::from(12),
        min_stock_level: Decimal::from(min_stock_level),
        ..Default::default()
    }
}

pub fn dec(value: i64) -> Decimal {
    Decimal::from(value)
}

pub fn line(material: MaterialId, quantity: i64) -> MaterialLine {
    MaterialLine {
        material,
        quantity: Decimal::from(quantity),
    }
}

pub fn uses(equipment: siteworks_domain::EquipmentId) -> EquipmentLine {
    EquipmentLine {
        equipment,
        hours: Some(Decimal::from(8)),
    }
}

/// Repository operation a [`FailingRepository`] can be told to break
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Insert,
    Replace,
    Delete,
    DeleteWhere,
}

/// Delegates to an inner repository and fails one kind of write with a
/// storage error once `pass` calls of that kind have gone through.
pub struct FailingRepository<T: Document> {
    inner: Arc<dyn Repository<T>>,
    op: Op,
    pass: usize,
    calls: AtomicUsize,
}

impl<T: Document> FailingRepository<T> {
    pub fn new(inner: Arc<dyn Repository<T>>, op: Op, pass: usize) -> Self {
        Self {
            inner,
            op,
            pass,
            calls: AtomicUsize::new(0),
        }
    }

    fn check(&self, op: Op) -> DomainResult<()> {
        if op != self.op {
            return Ok(());
        }
        if self.calls.fetch_add(1, Ordering::SeqCst) >= self.pass {
            return Err(DomainError::StorageError(format!(
                "injected {op:?} failure on {}",
                T::COLLECTION
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Document> Repository<T> for FailingRepository<T> {
    async fn insert(&self, doc: T) -> DomainResult<T> {
        self.check(Op::Insert)?;
        self.inner.insert(doc).await
    }

    async fn find_by_id(&self, id: EntityId<T::Marker>) -> DomainResult<Option<T>> {
        self.inner.find_by_id(id).await
    }

    async fn find_all(&self) -> DomainResult<Vec<T>> {
        self.inner.find_all().await
    }

    async fn find_where(&self, filter: Filter<'_, T>) -> DomainResult<Vec<T>> {
        self.inner.find_where(filter).await
    }

    async fn replace(&self, doc: T, expected_version: u64) -> DomainResult<T> {
        self.check(Op::Replace)?;
        self.inner.replace(doc, expected_version).await
    }

    async fn delete(&self, id: EntityId<T::Marker>) -> DomainResult<Option<T>> {
        self.check(Op::Delete)?;
        self.inner.delete(id).await
    }

    async fn delete_where(&self, filter: Filter<'_, T>) -> DomainResult<Vec<T>> {
        self.check(Op::DeleteWhere)?;
        self.inner.delete_where(filter).await
    }
}
