// Copyright 2025 Cowboy AI, LLC.

//! Construction domain entities
//!
//! Each entity guards its own invariants; the services in [`crate::services`]
//! load, mutate and persist them and span multi-document operations.

pub mod client;
pub mod equipment;
pub mod material;
pub mod project;
pub mod report;
pub mod task;
pub mod user;

pub use client::{
    Agreement, AgreementStatus, BudgetInfo, BudgetOperation, BudgetStatus, Client, ClientPatch,
    NewAgreement, NewClient, Signature, SignatureParty, Signatures,
};
pub use equipment::{
    AdministrativeStatus, Equipment, EquipmentCommand, EquipmentCondition, EquipmentPatch,
    EquipmentState, EquipmentStatus, MaintenanceRecord, MaintenanceRequest, NewEquipment,
    UsageRecord,
};
pub use material::{
    Material, MaterialPatch, MaterialStatus, NewMaterial, StockAction, StockEvent, StockUpdate,
};
pub use project::{NewProject, Project, ProjectPatch, ProjectStatus};
pub use report::{NewProgressReport, ProgressReport};
pub use task::{
    requested_per_material, validate_lines, EquipmentLine, MaterialLine, NewTask, Task,
    TaskPriority, TaskStatus,
};
pub use user::{NewUser, User, UserRole};
