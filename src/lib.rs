// Copyright 2025 Cowboy AI, LLC.

//! # Siteworks Domain
//!
//! Consistency core for construction project management: material stock,
//! equipment assignment, client budgets, cascading project deletion and task
//! creation with material reservation.
//!
//! The crate provides:
//! - **Entities**: typed documents with phantom-typed ids and optimistic versions
//! - **Services**: one per consistency concern, each returning the updated
//!   entity together with the event it published
//! - **Persistence**: async repositories with compare-and-swap writes, an
//!   in-memory implementation and metrics instrumentation
//! - **Units of work**: ordered multi-document steps with optional compensation
//! - **Notifications**: fire-and-forget publication to a pluggable sink
//!
//! ## Design Principles
//!
//! 1. **Type Safety**: ids cannot be mixed across entity types
//! 2. **No lost updates**: every read-modify-write is a version-checked swap
//! 3. **Structural invariants**: equipment assignment lives inside its state
//! 4. **Explicit failure modes**: callers choose compensation or best effort
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use rust_decimal::Decimal;
//! use siteworks_domain::{
//!     ConstructionServices, CoreConfig, Document, NewMaterial, NullSink, StockAction, StockUpdate,
//!     Store,
//! };
//!
//! # tokio_test::block_on(async {
//! let services = ConstructionServices::new(
//!     Store::in_memory(),
//!     Arc::new(NullSink),
//!     CoreConfig::default(),
//! );
//! let created = services
//!     .stock
//!     .create_material(NewMaterial {
//!         name: "Cement".into(),
//!         code: None,
//!         material_type: "binder".into(),
//!         unit: "bag".into(),
//!         quantity: Decimal::from(40),
//!         unit_price: Decimal::from(9),
//!         min_stock_level: Decimal::from(10),
//!         max_stock_level: None,
//!         supplier: None,
//!     })
//!     .await
//!     .unwrap();
//! assert_eq!(created.entity.code, "MAT-00001");
//!
//! let used = services
//!     .stock
//!     .update_stock(created.entity.id(), StockUpdate::new(StockAction::Used, Decimal::from(35)))
//!     .await
//!     .unwrap();
//! assert_eq!(used.entity.quantity(), Decimal::from(5));
//! # });
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod domain;
pub mod entity;
pub mod errors;
pub mod events;
pub mod notifications;
pub mod persistence;
pub mod services;
pub mod state_machine;
pub mod unit_of_work;

// Re-export core types
pub use config::{ConsistencyMode, CoreConfig};
pub use entity::{
    AgreementId, ClientId, Document, EntityId, EquipmentId, IdMarker, MaterialId, ProjectId,
    ReportId, TaskId, UserId,
};
pub use errors::{DomainError, DomainResult, ErrorKind};
pub use events::{ConstructionEvent, DomainEvent, Outcome};
pub use notifications::{
    BroadcastSink, Notification, NotificationSink, Notifier, NullSink, RecordingSink, TracingSink,
};
pub use persistence::{
    CodeAllocator, InMemoryCodeAllocator, InMemoryRepository, InstrumentedRepository,
    PersistenceMetrics, Repository, Store,
};
pub use services::{
    update_with_retry, BudgetSummary, CascadeReport, ClientBudget, ClientBudgetLine,
    ConstructionServices, EquipmentLifecycle, MaintenanceEntry, MaintenanceSchedule,
    ProjectCascadeDeleter, ProjectRegistry, StockLedger, TaskMaterialReservation,
};
pub use state_machine::{MealyStateTransitions, State, StateTransition, TransitionInput};
pub use unit_of_work::{Aborted, UnitOfWork, UnitOfWorkState};

pub use domain::{
    AdministrativeStatus, Agreement, AgreementStatus, BudgetInfo, BudgetOperation, BudgetStatus,
    Client, ClientPatch, Equipment, EquipmentCondition, EquipmentLine, EquipmentPatch,
    EquipmentState, EquipmentStatus, MaintenanceRecord, MaintenanceRequest, Material,
    MaterialLine, MaterialPatch, MaterialStatus, NewAgreement, NewClient, NewEquipment,
    NewMaterial, NewProgressReport, NewProject, NewTask, NewUser, ProgressReport, Project,
    ProjectPatch, ProjectStatus, Signature, SignatureParty, StockAction, StockEvent, StockUpdate,
    Task, TaskPriority, TaskStatus, UsageRecord, User, UserRole,
};

// Re-export id markers
pub mod markers {
    //! Marker types for phantom type parameters
    pub use crate::entity::{
        AgreementMarker, ClientMarker, EquipmentMarker, MaterialMarker, ProjectMarker,
        ReportMarker, TaskMarker, UserMarker,
    };
}
