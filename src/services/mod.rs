// Copyright 2025 Cowboy AI, LLC.

//! Services that load, mutate, persist and announce entities
//!
//! Single-document mutations are compare-and-swap loops ([`update_with_retry`]);
//! multi-document operations run inside a [`crate::unit_of_work::UnitOfWork`].

pub mod client_budget;
pub mod equipment_lifecycle;
pub mod project_cascade;
pub mod projects;
pub mod stock_ledger;
pub mod task_reservation;

pub use client_budget::{BudgetSummary, ClientBudget, ClientBudgetLine};
pub use equipment_lifecycle::{EquipmentLifecycle, MaintenanceEntry, MaintenanceSchedule};
pub use project_cascade::{CascadeReport, ProjectCascadeDeleter};
pub use projects::ProjectRegistry;
pub use stock_ledger::StockLedger;
pub use task_reservation::TaskMaterialReservation;

use chrono::Utc;
use std::sync::Arc;
use tracing::debug;

use crate::config::CoreConfig;
use crate::entity::{Document, EntityId};
use crate::errors::{DomainError, DomainResult};
use crate::notifications::{NotificationSink, Notifier};
use crate::persistence::{Repository, Store};

/// Load, mutate and compare-and-swap a document, retrying on version conflicts.
///
/// `mutate` runs against a fresh copy on every attempt; if it fails nothing is
/// written. Returns the stored document and whatever `mutate` produced.
pub async fn update_with_retry<T, R, F>(
    repo: &dyn Repository<T>,
    id: EntityId<T::Marker>,
    max_retries: u32,
    mut mutate: F,
) -> DomainResult<(T, R)>
where
    T: Document,
    R: Send,
    F: FnMut(&mut T) -> DomainResult<R> + Send,
{
    let mut attempt = 0;
    loop {
        let mut doc = repo.get(id).await?;
        let expected = doc.version();
        let produced = mutate(&mut doc)?;
        doc.touch(Utc::now());

        match repo.replace(doc, expected).await {
            Ok(saved) => return Ok((saved, produced)),
            Err(DomainError::ConcurrencyConflict { expected, actual }) if attempt < max_retries => {
                attempt += 1;
                debug!(
                    collection = T::COLLECTION,
                    %id,
                    expected,
                    actual,
                    attempt,
                    "version conflict, retrying"
                );
            }
            Err(e) => return Err(e),
        }
    }
}

/// Insert a new coded document.
///
/// An explicit code is stored upper-cased as given. Generated codes already
/// held by an explicitly coded document are skipped.
async fn insert_coded<T, F>(
    store: &Store,
    repo: &dyn Repository<T>,
    prefix: &str,
    explicit: Option<&str>,
    build: F,
) -> DomainResult<T>
where
    T: Document,
    F: Fn(String) -> DomainResult<T> + Send + Sync,
{
    if let Some(code) = explicit.map(str::trim).filter(|code| !code.is_empty()) {
        return repo.insert(build(code.to_ascii_uppercase())?).await;
    }
    loop {
        let code = store.codes.next_code(prefix).await?;
        match repo.insert(build(code)?).await {
            Err(DomainError::DuplicateKey { key, value, .. }) if key == "code" => {
                debug!(
                    collection = T::COLLECTION,
                    %value,
                    "generated code taken, drawing the next"
                );
            }
            other => return other,
        }
    }
}

/// All services wired to one store, sink and configuration
#[derive(Debug, Clone)]
pub struct ConstructionServices {
    /// Material stock
    pub stock: StockLedger,
    /// Equipment lifecycle
    pub equipment: EquipmentLifecycle,
    /// Client budgets and agreements
    pub clients: ClientBudget,
    /// Project records and reports
    pub projects: ProjectRegistry,
    /// Cascading project deletion
    pub cascade: ProjectCascadeDeleter,
    /// Task creation with material reservation
    pub tasks: TaskMaterialReservation,
}

impl ConstructionServices {
    /// Wire every service
    pub fn new(store: Store, sink: Arc<dyn NotificationSink>, config: CoreConfig) -> Self {
        let notifier = Notifier::new(sink);
        let stock = StockLedger::new(store.clone(), notifier.clone(), config.clone());
        Self {
            equipment: EquipmentLifecycle::new(store.clone(), notifier.clone(), config.clone()),
            clients: ClientBudget::new(store.clone(), notifier.clone(), config.clone()),
            projects: ProjectRegistry::new(store.clone(), notifier.clone(), config.clone()),
            cascade: ProjectCascadeDeleter::new(store.clone(), notifier.clone(), config.clone()),
            tasks: TaskMaterialReservation::new(store, stock.clone(), notifier, config),
            stock,
        }
    }
}
