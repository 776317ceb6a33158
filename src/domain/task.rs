// Copyright 2025 Cowboy AI, LLC.

//! Tasks with their material and equipment lines

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entity::{Document, EquipmentId, MaterialId, ProjectId, TaskId, TaskMarker, UserId};
use crate::errors::{DomainError, DomainResult};

/// Progress of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Not started
    #[default]
    Pending,
    /// Being worked on
    InProgress,
    /// Done
    Completed,
    /// Dropped
    Cancelled,
}

/// Urgency of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum TaskPriority {
    /// Can wait
    Low,
    /// Normal
    #[default]
    Medium,
    /// Soon
    High,
    /// Now
    Urgent,
}

/// Material consumed by a task
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialLine {
    /// Material drawn from stock
    pub material: MaterialId,
    /// Quantity reserved at creation
    pub quantity: Decimal,
}

/// Equipment needed by a task
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquipmentLine {
    /// Equipment unit
    pub equipment: EquipmentId,
    /// Planned hours
    pub hours: Option<Decimal>,
}

/// Input for creating a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    /// Owning project
    pub project: ProjectId,
    /// Title
    pub title: String,
    /// Description
    pub description: Option<String>,
    /// Assignee
    pub assigned_to: Option<UserId>,
    /// Priority
    pub priority: TaskPriority,
    /// Due date
    pub due_date: Option<DateTime<Utc>>,
}

impl NewTask {
    /// A medium-priority task with only a title
    pub fn new(project: ProjectId, title: impl Into<String>) -> Self {
        Self {
            project,
            title: title.into(),
            description: None,
            assigned_to: None,
            priority: TaskPriority::default(),
            due_date: None,
        }
    }
}

/// A unit of work within a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    project: ProjectId,
    /// Title
    pub title: String,
    /// Description
    pub description: Option<String>,
    /// Assignee
    pub assigned_to: Option<UserId>,
    /// Progress
    pub status: TaskStatus,
    /// Priority
    pub priority: TaskPriority,
    /// Due date
    pub due_date: Option<DateTime<Utc>>,
    materials: Vec<MaterialLine>,
    equipment: Vec<EquipmentLine>,
    version: u64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Validate the shape of a task. Reference existence and stock are
    /// checked by the reservation service.
    pub fn new(
        input: NewTask,
        materials: Vec<MaterialLine>,
        equipment: Vec<EquipmentLine>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if input.title.trim().is_empty() {
            return Err(DomainError::validation("task title is required"));
        }
        validate_lines(&materials, &equipment)?;

        Ok(Self {
            id: TaskId::new(),
            project: input.project,
            title: input.title,
            description: input.description,
            assigned_to: input.assigned_to,
            status: TaskStatus::Pending,
            priority: input.priority,
            due_date: input.due_date,
            materials,
            equipment,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Owning project
    pub fn project(&self) -> ProjectId {
        self.project
    }

    /// Reserved material lines
    pub fn materials(&self) -> &[MaterialLine] {
        &self.materials
    }

    /// Equipment lines
    pub fn equipment(&self) -> &[EquipmentLine] {
        &self.equipment
    }
}

/// Check line quantities and that at least one equipment line is present.
pub fn validate_lines(materials: &[MaterialLine], equipment: &[EquipmentLine]) -> DomainResult<()> {
    if equipment.is_empty() {
        return Err(DomainError::validation(
            "a task needs at least one equipment line",
        ));
    }
    for line in materials {
        if line.quantity <= Decimal::ZERO {
            return Err(DomainError::ValidationError(format!(
                "material quantity must be positive (material {}, got {})",
                line.material, line.quantity
            )));
        }
    }
    for line in equipment {
        if let Some(hours) = line.hours {
            if hours < Decimal::ZERO {
                return Err(DomainError::validation("equipment hours must not be negative"));
            }
        }
    }
    Ok(())
}

/// Total requested quantity per material, in first-seen order.
pub fn requested_per_material(lines: &[MaterialLine]) -> IndexMap<MaterialId, Decimal> {
    let mut totals = IndexMap::new();
    for line in lines {
        *totals.entry(line.material).or_insert(Decimal::ZERO) += line.quantity;
    }
    totals
}

impl Document for Task {
    type Marker = TaskMarker;
    const COLLECTION: &'static str = "tasks";
    const ENTITY_TYPE: &'static str = "Task";

    fn id(&self) -> TaskId {
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
}
