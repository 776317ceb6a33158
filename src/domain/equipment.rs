// Copyright 2025 Cowboy AI, LLC.

//! Equipment and its assignment lifecycle
//!
//! The operational state is a tagged enum: the project and user references
//! only exist inside [`EquipmentState::InUse`], so "in use ⇔ both references
//! set" cannot be violated. State changes go through three guarded entry
//! points ([`Equipment::assign`], [`Equipment::return_from_use`] and
//! [`Equipment::override_status`]) checked by the [`EquipmentStatus`] machine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entity::{Document, EquipmentId, EquipmentMarker, ProjectId, UserId};
use crate::errors::{DomainError, DomainResult};
use crate::state_machine::{transition, MealyStateTransitions, State, TransitionInput};

/// Physical condition of a unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EquipmentCondition {
    /// Like new
    Excellent,
    /// Normal wear
    #[default]
    Good,
    /// Usable with visible wear
    Fair,
    /// Barely serviceable
    Poor,
    /// Must be repaired before use
    NeedsRepair,
}

/// Flat status name of an [`EquipmentState`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquipmentStatus {
    /// Free to assign
    Available,
    /// Assigned to a project and user
    InUse,
    /// Being serviced
    UnderMaintenance,
    /// Withdrawn from service
    OutOfService,
}

/// What is asking for a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EquipmentCommand {
    /// Assignment to a project
    Assign,
    /// Return from a project
    Return,
    /// Administrative status change
    Override,
}

impl TransitionInput for EquipmentCommand {
    fn description(&self) -> String {
        format!("{self:?}")
    }
}

impl State for EquipmentStatus {
    fn name(&self) -> &'static str {
        match self {
            EquipmentStatus::Available => "Available",
            EquipmentStatus::InUse => "InUse",
            EquipmentStatus::UnderMaintenance => "UnderMaintenance",
            EquipmentStatus::OutOfService => "OutOfService",
        }
    }
}

impl MealyStateTransitions for EquipmentStatus {
    type Input = EquipmentCommand;

    fn can_transition_to(&self, target: &Self, input: &EquipmentCommand) -> bool {
        use EquipmentCommand as C;
        use EquipmentStatus as S;
        match (self, target, input) {
            (S::InUse, _, C::Assign) => false,
            (_, S::InUse, C::Assign) => true,
            (S::InUse, S::Available, C::Return) => true,
            (_, S::InUse, C::Override) => false,
            (_, _, C::Override) => true,
            _ => false,
        }
    }

    fn valid_transitions(&self, input: &EquipmentCommand) -> Vec<Self> {
        use EquipmentStatus as S;
        [S::Available, S::InUse, S::UnderMaintenance, S::OutOfService]
            .into_iter()
            .filter(|target| self.can_transition_to(target, input))
            .collect()
    }
}

/// Operational state; assignment references live inside `InUse`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum EquipmentState {
    /// Free to assign
    Available,
    /// Assigned
    InUse {
        /// Project the unit is working on
        project: ProjectId,
        /// Responsible user
        assigned_to: UserId,
    },
    /// Being serviced
    UnderMaintenance,
    /// Withdrawn from service
    OutOfService,
}

impl EquipmentState {
    /// Flat status name
    pub fn status(&self) -> EquipmentStatus {
        match self {
            EquipmentState::Available => EquipmentStatus::Available,
            EquipmentState::InUse { .. } => EquipmentStatus::InUse,
            EquipmentState::UnderMaintenance => EquipmentStatus::UnderMaintenance,
            EquipmentState::OutOfService => EquipmentStatus::OutOfService,
        }
    }
}

/// Statuses an administrator may set directly; `InUse` is deliberately absent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdministrativeStatus {
    /// Put back into the pool
    Available,
    /// Send to the workshop
    UnderMaintenance,
    /// Retire
    OutOfService,
}

impl From<AdministrativeStatus> for EquipmentState {
    fn from(status: AdministrativeStatus) -> Self {
        match status {
            AdministrativeStatus::Available => EquipmentState::Available,
            AdministrativeStatus::UnderMaintenance => EquipmentState::UnderMaintenance,
            AdministrativeStatus::OutOfService => EquipmentState::OutOfService,
        }
    }
}

/// One assignment span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Project the unit worked on
    pub project: ProjectId,
    /// Responsible user
    pub assigned_to: UserId,
    /// Assignment time
    pub start_date: DateTime<Utc>,
    /// Return time; `None` while open
    pub end_date: Option<DateTime<Utc>>,
    /// Hours reported on return
    pub hours_used: Option<Decimal>,
    /// Condition reported on return
    pub condition: Option<EquipmentCondition>,
    /// Notes from assignment, replaced by return notes when given
    pub notes: Option<String>,
}

impl UsageRecord {
    /// Whether the span is still running
    pub fn is_open(&self) -> bool {
        self.end_date.is_none()
    }
}

/// One maintenance entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    /// When the entry was recorded
    pub date: DateTime<Utc>,
    /// Kind of maintenance (inspection, repair, service...)
    pub maintenance_type: String,
    /// What is to be done
    pub description: String,
    /// Expected or actual cost
    pub cost: Option<Decimal>,
    /// Technician or vendor
    pub performed_by: String,
    /// When the maintenance is scheduled
    pub next_maintenance_date: Option<DateTime<Utc>>,
}

/// Input for [`Equipment::schedule_maintenance`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRequest {
    /// Kind of maintenance
    pub maintenance_type: String,
    /// What is to be done
    pub description: String,
    /// When it is due
    pub scheduled_date: DateTime<Utc>,
    /// Expected cost
    pub cost: Option<Decimal>,
    /// Technician or vendor
    pub performed_by: String,
}

/// Input for creating equipment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewEquipment {
    /// Display name
    pub name: String,
    /// Explicit code; generated when absent
    pub code: Option<String>,
    /// Category (excavator, crane, mixer...)
    pub equipment_type: String,
    /// Manufacturer model
    pub model: Option<String>,
    /// Serial number
    pub serial_number: Option<String>,
    /// Initial condition
    pub condition: EquipmentCondition,
    /// Acquisition price
    pub purchase_price: Option<Decimal>,
}

/// Descriptive changes; status is not patchable
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipmentPatch {
    /// New name
    pub name: Option<String>,
    /// New category
    pub equipment_type: Option<String>,
    /// New model
    pub model: Option<String>,
    /// New serial number
    pub serial_number: Option<String>,
    /// New condition
    pub condition: Option<EquipmentCondition>,
    /// New acquisition price
    pub purchase_price: Option<Decimal>,
}

/// A piece of site equipment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    id: EquipmentId,
    /// Display name
    pub name: String,
    /// Unique code, `EQ-00001` style
    pub code: String,
    /// Category
    pub equipment_type: String,
    /// Manufacturer model
    pub model: Option<String>,
    /// Serial number
    pub serial_number: Option<String>,
    /// Acquisition price
    pub purchase_price: Option<Decimal>,
    state: EquipmentState,
    condition: EquipmentCondition,
    usage_history: Vec<UsageRecord>,
    maintenance_history: Vec<MaintenanceRecord>,
    last_maintenance_date: Option<DateTime<Utc>>,
    next_maintenance_date: Option<DateTime<Utc>>,
    version: u64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Equipment {
    /// Validate `input` and build an available unit.
    pub fn new(input: NewEquipment, code: String, now: DateTime<Utc>) -> DomainResult<Self> {
        if input.name.trim().is_empty() {
            return Err(DomainError::validation("equipment name is required"));
        }
        if input.equipment_type.trim().is_empty() {
            return Err(DomainError::validation("equipment type is required"));
        }

        Ok(Self {
            id: EquipmentId::new(),
            name: input.name,
            code,
            equipment_type: input.equipment_type,
            model: input.model,
            serial_number: input.serial_number,
            purchase_price: input.purchase_price,
            state: EquipmentState::Available,
            condition: input.condition,
            usage_history: Vec::new(),
            maintenance_history: Vec::new(),
            last_maintenance_date: None,
            next_maintenance_date: None,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Operational state
    pub fn state(&self) -> EquipmentState {
        self.state
    }

    /// Flat status
    pub fn status(&self) -> EquipmentStatus {
        self.state.status()
    }

    /// Project the unit is assigned to
    pub fn current_project(&self) -> Option<ProjectId> {
        match self.state {
            EquipmentState::InUse { project, .. } => Some(project),
            _ => None,
        }
    }

    /// User the unit is assigned to
    pub fn assigned_to(&self) -> Option<UserId> {
        match self.state {
            EquipmentState::InUse { assigned_to, .. } => Some(assigned_to),
            _ => None,
        }
    }

    /// Physical condition
    pub fn condition(&self) -> EquipmentCondition {
        self.condition
    }

    /// Assignment spans, oldest first
    pub fn usage_history(&self) -> &[UsageRecord] {
        &self.usage_history
    }

    /// Maintenance entries, oldest first
    pub fn maintenance_history(&self) -> &[MaintenanceRecord] {
        &self.maintenance_history
    }

    /// Date the latest maintenance entry was recorded
    pub fn last_maintenance_date(&self) -> Option<DateTime<Utc>> {
        self.last_maintenance_date
    }

    /// Date the next maintenance is due
    pub fn next_maintenance_date(&self) -> Option<DateTime<Utc>> {
        self.next_maintenance_date
    }

    /// Total hours reported across closed usage records
    pub fn total_hours_used(&self) -> Decimal {
        self.usage_history.iter().filter_map(|u| u.hours_used).sum()
    }

    /// Assign to a project and open a usage record.
    pub fn assign(
        &mut self,
        project: ProjectId,
        assigned_to: UserId,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        transition(&self.status(), EquipmentStatus::InUse, EquipmentCommand::Assign).map_err(
            |_| DomainError::AlreadyInUse {
                equipment: self.code.clone(),
            },
        )?;

        self.state = EquipmentState::InUse {
            project,
            assigned_to,
        };
        self.usage_history.push(UsageRecord {
            project,
            assigned_to,
            start_date: now,
            end_date: None,
            hours_used: None,
            condition: None,
            notes,
        });
        Ok(())
    }

    /// Return from use, closing the open usage record.
    pub fn return_from_use(
        &mut self,
        hours_used: Decimal,
        condition: Option<EquipmentCondition>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        transition(&self.status(), EquipmentStatus::Available, EquipmentCommand::Return)
            .map_err(|_| DomainError::NotInUse {
                equipment: self.code.clone(),
            })?;
        if hours_used.is_sign_negative() && !hours_used.is_zero() {
            return Err(DomainError::validation("hours used must not be negative"));
        }

        self.state = EquipmentState::Available;
        if let Some(condition) = condition {
            self.condition = condition;
        }
        if let Some(record) = self.open_usage_mut() {
            record.end_date = Some(now);
            record.hours_used = Some(hours_used);
            record.condition = condition;
            if notes.is_some() {
                record.notes = notes;
            }
        }
        Ok(())
    }

    /// Administrative status change. Leaving `InUse` this way closes the open
    /// usage record without hours.
    pub fn override_status(
        &mut self,
        status: AdministrativeStatus,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        let target: EquipmentState = status.into();
        transition(&self.status(), target.status(), EquipmentCommand::Override)?;

        if let Some(record) = self.open_usage_mut() {
            record.end_date = Some(now);
        }
        self.state = target;
        Ok(())
    }

    /// Append a maintenance entry and refresh the denormalized dates.
    ///
    /// `last_maintenance_date` is stamped at scheduling time, not completion.
    pub fn schedule_maintenance(
        &mut self,
        request: MaintenanceRequest,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if request.maintenance_type.trim().is_empty() {
            return Err(DomainError::validation("maintenance type is required"));
        }
        if request.performed_by.trim().is_empty() {
            return Err(DomainError::validation("maintenance performer is required"));
        }

        self.maintenance_history.push(MaintenanceRecord {
            date: now,
            maintenance_type: request.maintenance_type,
            description: request.description,
            cost: request.cost,
            performed_by: request.performed_by,
            next_maintenance_date: Some(request.scheduled_date),
        });
        self.last_maintenance_date = Some(now);
        self.next_maintenance_date = Some(request.scheduled_date);
        Ok(())
    }

    /// Apply descriptive changes.
    pub fn apply_patch(&mut self, patch: EquipmentPatch) -> DomainResult<()> {
        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("equipment name is required"));
            }
            self.name = name;
        }
        if let Some(equipment_type) = patch.equipment_type {
            self.equipment_type = equipment_type;
        }
        if let Some(model) = patch.model {
            self.model = Some(model);
        }
        if let Some(serial) = patch.serial_number {
            self.serial_number = Some(serial);
        }
        if let Some(condition) = patch.condition {
            self.condition = condition;
        }
        if let Some(price) = patch.purchase_price {
            self.purchase_price = Some(price);
        }
        Ok(())
    }

    fn open_usage_mut(&mut self) -> Option<&mut UsageRecord> {
        self.usage_history.iter_mut().rev().find(|u| u.is_open())
    }
}

impl Document for Equipment {
    type Marker = EquipmentMarker;
    const COLLECTION: &'static str = "equipment";
    const ENTITY_TYPE: &'static str = "Equipment";

    fn id(&self) -> EquipmentId {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("code", self.code.to_ascii_uppercase())]
    }
}
