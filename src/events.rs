// Copyright 2025 Cowboy AI, LLC.

//! Domain events published after successful mutations
//!
//! Every service operation returns the updated entity together with the
//! event it published, wrapped in an [`Outcome`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    AgreementStatus, BudgetOperation, BudgetStatus, EquipmentCondition, EquipmentStatus,
    MaterialStatus, SignatureParty, StockEvent,
};
use crate::entity::{
    AgreementId, ClientId, EquipmentId, MaterialId, ProjectId, TaskId, UserId,
};

/// Base trait for all domain events
///
/// # Examples
///
/// ```rust
/// use siteworks_domain::DomainEvent;
/// use uuid::Uuid;
///
/// #[derive(Debug)]
/// struct SiteOpened {
///     site: Uuid,
/// }
///
/// impl DomainEvent for SiteOpened {
///     fn aggregate_id(&self) -> Uuid {
///         self.site
///     }
///
///     fn event_type(&self) -> &'static str {
///         "SiteOpened"
///     }
///
///     fn topic(&self) -> &'static str {
///         "sites"
///     }
/// }
///
/// let event = SiteOpened { site: Uuid::new_v4() };
/// assert_eq!(event.event_type(), "SiteOpened");
/// assert_eq!(event.version(), "v1");
/// ```
pub trait DomainEvent: Send + Sync + std::fmt::Debug {
    /// Get the aggregate ID this event relates to
    fn aggregate_id(&self) -> Uuid;

    /// Get the event type name
    fn event_type(&self) -> &'static str;

    /// Notification topic the event is published on
    fn topic(&self) -> &'static str;

    /// Get the schema version
    fn version(&self) -> &'static str {
        "v1"
    }
}

/// Everything the core announces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConstructionEvent {
    /// A material was created
    MaterialCreated {
        /// Material
        material: MaterialId,
        /// Assigned code
        code: String,
    },
    /// Descriptive material fields changed
    MaterialUpdated {
        /// Material
        material: MaterialId,
        /// Status after the change
        status: MaterialStatus,
    },
    /// A material was removed
    MaterialDeleted {
        /// Material
        material: MaterialId,
    },
    /// Stock moved
    StockUpdated {
        /// Material
        material: MaterialId,
        /// Appended history entry
        entry: StockEvent,
        /// Status after the movement
        status: MaterialStatus,
    },

    /// Equipment was registered
    EquipmentCreated {
        /// Equipment
        equipment: EquipmentId,
        /// Assigned code
        code: String,
    },
    /// Descriptive equipment fields changed
    EquipmentUpdated {
        /// Equipment
        equipment: EquipmentId,
    },
    /// Equipment was removed
    EquipmentDeleted {
        /// Equipment
        equipment: EquipmentId,
    },
    /// Equipment went to a project
    EquipmentAssigned {
        /// Equipment
        equipment: EquipmentId,
        /// Project
        project: ProjectId,
        /// Responsible user
        assigned_to: UserId,
    },
    /// Equipment came back
    EquipmentReturned {
        /// Equipment
        equipment: EquipmentId,
        /// Hours reported
        hours_used: Decimal,
        /// Condition after return
        condition: EquipmentCondition,
    },
    /// Administrative status change
    EquipmentStatusOverridden {
        /// Equipment
        equipment: EquipmentId,
        /// Previous status
        from: EquipmentStatus,
        /// New status
        to: EquipmentStatus,
    },
    /// Maintenance was booked
    MaintenanceScheduled {
        /// Equipment
        equipment: EquipmentId,
        /// Due date
        scheduled_date: DateTime<Utc>,
    },

    /// A client was created
    ClientCreated {
        /// Client
        client: ClientId,
    },
    /// Client contact data or budget ceiling changed
    ClientUpdated {
        /// Client
        client: ClientId,
    },
    /// A client was removed
    ClientDeleted {
        /// Client
        client: ClientId,
    },
    /// Spend changed
    BudgetUpdated {
        /// Client
        client: ClientId,
        /// How the amount was applied
        operation: BudgetOperation,
        /// Amount supplied
        amount: Decimal,
        /// Spend afterwards
        spent_budget: Decimal,
        /// Derived status afterwards
        budget_status: BudgetStatus,
    },
    /// An agreement was drafted
    AgreementAdded {
        /// Client
        client: ClientId,
        /// New agreement
        agreement: AgreementId,
    },
    /// One party signed
    AgreementSigned {
        /// Client
        client: ClientId,
        /// Agreement
        agreement: AgreementId,
        /// Who signed
        party: SignatureParty,
        /// Status afterwards
        status: AgreementStatus,
    },

    /// A project was created
    ProjectCreated {
        /// Project
        project: ProjectId,
    },
    /// A project was updated
    ProjectUpdated {
        /// Project
        project: ProjectId,
    },
    /// A project and its dependents were removed
    ProjectDeleted {
        /// Project
        project: ProjectId,
        /// Name, for confirmation
        name: String,
        /// Deleted tasks
        tasks: usize,
        /// Deleted progress reports
        reports: usize,
        /// Users whose assignment list changed
        users_updated: usize,
    },

    /// A task was created and its materials reserved
    TaskCreated {
        /// Task
        task: TaskId,
        /// Owning project
        project: ProjectId,
        /// Number of reserved material lines
        material_lines: usize,
    },
}

impl DomainEvent for ConstructionEvent {
    fn aggregate_id(&self) -> Uuid {
        use ConstructionEvent as E;
        match self {
            E::MaterialCreated { material, .. }
            | E::MaterialUpdated { material, .. }
            | E::MaterialDeleted { material }
            | E::StockUpdated { material, .. } => *material.as_uuid(),
            E::EquipmentCreated { equipment, .. }
            | E::EquipmentUpdated { equipment }
            | E::EquipmentDeleted { equipment }
            | E::EquipmentAssigned { equipment, .. }
            | E::EquipmentReturned { equipment, .. }
            | E::EquipmentStatusOverridden { equipment, .. }
            | E::MaintenanceScheduled { equipment, .. } => *equipment.as_uuid(),
            E::ClientCreated { client }
            | E::ClientUpdated { client }
            | E::ClientDeleted { client }
            | E::BudgetUpdated { client, .. }
            | E::AgreementAdded { client, .. }
            | E::AgreementSigned { client, .. } => *client.as_uuid(),
            E::ProjectCreated { project }
            | E::ProjectUpdated { project }
            | E::ProjectDeleted { project, .. } => *project.as_uuid(),
            E::TaskCreated { task, .. } => *task.as_uuid(),
        }
    }

    fn event_type(&self) -> &'static str {
        use ConstructionEvent as E;
        match self {
            E::MaterialCreated { .. } => "MaterialCreated",
            E::MaterialUpdated { .. } => "MaterialUpdated",
            E::MaterialDeleted { .. } => "MaterialDeleted",
            E::StockUpdated { .. } => "StockUpdated",
            E::EquipmentCreated { .. } => "EquipmentCreated",
            E::EquipmentUpdated { .. } => "EquipmentUpdated",
            E::EquipmentDeleted { .. } => "EquipmentDeleted",
            E::EquipmentAssigned { .. } => "EquipmentAssigned",
            E::EquipmentReturned { .. } => "EquipmentReturned",
            E::EquipmentStatusOverridden { .. } => "EquipmentStatusOverridden",
            E::MaintenanceScheduled { .. } => "MaintenanceScheduled",
            E::ClientCreated { .. } => "ClientCreated",
            E::ClientUpdated { .. } => "ClientUpdated",
            E::ClientDeleted { .. } => "ClientDeleted",
            E::BudgetUpdated { .. } => "BudgetUpdated",
            E::AgreementAdded { .. } => "AgreementAdded",
            E::AgreementSigned { .. } => "AgreementSigned",
            E::ProjectCreated { .. } => "ProjectCreated",
            E::ProjectUpdated { .. } => "ProjectUpdated",
            E::ProjectDeleted { .. } => "ProjectDeleted",
            E::TaskCreated { .. } => "TaskCreated",
        }
    }

    fn topic(&self) -> &'static str {
        use ConstructionEvent as E;
        match self {
            E::MaterialCreated { .. }
            | E::MaterialUpdated { .. }
            | E::MaterialDeleted { .. }
            | E::StockUpdated { .. } => "materials",
            E::EquipmentCreated { .. }
            | E::EquipmentUpdated { .. }
            | E::EquipmentDeleted { .. }
            | E::EquipmentAssigned { .. }
            | E::EquipmentReturned { .. }
            | E::EquipmentStatusOverridden { .. }
            | E::MaintenanceScheduled { .. } => "equipment",
            E::ClientCreated { .. }
            | E::ClientUpdated { .. }
            | E::ClientDeleted { .. }
            | E::BudgetUpdated { .. }
            | E::AgreementAdded { .. }
            | E::AgreementSigned { .. } => "clients",
            E::ProjectCreated { .. } | E::ProjectUpdated { .. } | E::ProjectDeleted { .. } => {
                "projects"
            }
            E::TaskCreated { .. } => "tasks",
        }
    }
}

/// Result of a service operation: the persisted entity and the event published for it
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    /// Entity as persisted
    pub entity: T,
    /// Event handed to the notification sink
    pub event: ConstructionEvent,
}

impl<T> Outcome<T> {
    /// Pair an entity with its event
    pub fn new(entity: T, event: ConstructionEvent) -> Self {
        Self { entity, event }
    }

    /// Drop the event
    pub fn into_entity(self) -> T {
        self.entity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = ConstructionEvent::EquipmentAssigned {
            equipment: EquipmentId::new(),
            project: ProjectId::new(),
            assigned_to: UserId::new(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "EquipmentAssigned");
        assert_eq!(event.event_type(), "EquipmentAssigned");
        assert_eq!(event.topic(), "equipment");
    }

    #[test]
    fn test_aggregate_id_is_the_owning_entity() {
        let task = TaskId::new();
        let event = ConstructionEvent::TaskCreated {
            task,
            project: ProjectId::new(),
            material_lines: 2,
        };
        assert_eq!(event.aggregate_id(), *task.as_uuid());
        assert_eq!(event.topic(), "tasks");
    }
}
