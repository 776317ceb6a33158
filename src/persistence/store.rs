// Copyright 2025 Cowboy AI, LLC.

//! The set of repositories the services work against

use std::sync::Arc;

use super::in_memory::InMemoryRepository;
use super::instrumented_repository::InstrumentedRepository;
use super::metrics::PersistenceMetrics;
use super::repository::Repository;
use super::sequence::{CodeAllocator, InMemoryCodeAllocator};
use crate::domain::{Client, Equipment, Material, ProgressReport, Project, Task, User};
use crate::entity::{ClientId, Document, EntityId, EquipmentId, MaterialId, ProjectId, UserId};
use crate::errors::DomainResult;

/// One repository per entity type plus the code allocator.
///
/// Also resolves references: the `require_*` lookups fail with
/// `EntityNotFound` when an id does not resolve.
#[derive(Clone)]
pub struct Store {
    /// Materials
    pub materials: Arc<dyn Repository<Material>>,
    /// Equipment
    pub equipment: Arc<dyn Repository<Equipment>>,
    /// Clients
    pub clients: Arc<dyn Repository<Client>>,
    /// Projects
    pub projects: Arc<dyn Repository<Project>>,
    /// Tasks
    pub tasks: Arc<dyn Repository<Task>>,
    /// Progress reports
    pub reports: Arc<dyn Repository<ProgressReport>>,
    /// Users
    pub users: Arc<dyn Repository<User>>,
    /// Code sequences
    pub codes: Arc<dyn CodeAllocator>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

impl Store {
    /// Fresh in-memory store
    pub fn in_memory() -> Self {
        Self {
            materials: Arc::new(InMemoryRepository::<Material>::new()),
            equipment: Arc::new(InMemoryRepository::<Equipment>::new()),
            clients: Arc::new(InMemoryRepository::<Client>::new()),
            projects: Arc::new(InMemoryRepository::<Project>::new()),
            tasks: Arc::new(InMemoryRepository::<Task>::new()),
            reports: Arc::new(InMemoryRepository::<ProgressReport>::new()),
            users: Arc::new(InMemoryRepository::<User>::new()),
            codes: Arc::new(InMemoryCodeAllocator::new()),
        }
    }

    /// Fresh in-memory store with every repository reporting into `metrics`
    pub fn instrumented(metrics: PersistenceMetrics) -> Self {
        Self::in_memory().with_metrics(metrics)
    }

    /// Wrap every repository of this store with metrics collection
    pub fn with_metrics(self, metrics: PersistenceMetrics) -> Self {
        Self {
            materials: instrument(self.materials, &metrics),
            equipment: instrument(self.equipment, &metrics),
            clients: instrument(self.clients, &metrics),
            projects: instrument(self.projects, &metrics),
            tasks: instrument(self.tasks, &metrics),
            reports: instrument(self.reports, &metrics),
            users: instrument(self.users, &metrics),
            codes: self.codes,
        }
    }

    /// Resolve a user
    pub async fn require_user(&self, id: UserId) -> DomainResult<User> {
        self.users.get(id).await
    }

    /// Resolve a project
    pub async fn require_project(&self, id: ProjectId) -> DomainResult<Project> {
        self.projects.get(id).await
    }

    /// Resolve a client
    pub async fn require_client(&self, id: ClientId) -> DomainResult<Client> {
        self.clients.get(id).await
    }

    /// Resolve a material
    pub async fn require_material(&self, id: MaterialId) -> DomainResult<Material> {
        self.materials.get(id).await
    }

    /// Resolve equipment
    pub async fn require_equipment(&self, id: EquipmentId) -> DomainResult<Equipment> {
        self.equipment.get(id).await
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::in_memory()
    }
}

fn instrument<T: Document>(
    repo: Arc<dyn Repository<T>>,
    metrics: &PersistenceMetrics,
) -> Arc<dyn Repository<T>> {
    Arc::new(InstrumentedRepository::new(repo, metrics.clone()))
}

/// Fail with `EntityNotFound` unless the id resolves in `repo`
pub async fn ensure_exists<T: Document>(
    repo: &dyn Repository<T>,
    id: EntityId<T::Marker>,
) -> DomainResult<()> {
    if repo.exists(id).await? {
        Ok(())
    } else {
        Err(crate::errors::DomainError::not_found(T::ENTITY_TYPE, id))
    }
}
