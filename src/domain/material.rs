// Copyright 2025 Cowboy AI, LLC.

//! Materials and their stock ledger
//!
//! A material's quantity only moves through [`Material::apply_stock`], which
//! appends an immutable [`StockEvent`] and re-derives the status from the new
//! quantity. The history is append-only.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::entity::{Document, MaterialId, MaterialMarker, ProjectId, UserId};
use crate::errors::{DomainError, DomainResult};

/// Stock classification of a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialStatus {
    /// Above the minimum stock level
    Available,
    /// At or below the minimum stock level but not empty
    LowStock,
    /// Nothing on hand
    OutOfStock,
    /// Manually withdrawn from use
    Discontinued,
}

impl MaterialStatus {
    /// Status implied by a quantity and minimum stock level.
    ///
    /// Never yields [`MaterialStatus::Discontinued`].
    pub fn derive(quantity: Decimal, min_stock_level: Decimal) -> Self {
        if quantity <= Decimal::ZERO {
            MaterialStatus::OutOfStock
        } else if quantity <= min_stock_level {
            MaterialStatus::LowStock
        } else {
            MaterialStatus::Available
        }
    }
}

/// Cause tag of a stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StockAction {
    /// Delivery or purchase; adds to stock
    Added,
    /// Consumption; subtracts, floored at zero
    Used,
    /// Stock count correction; sets the absolute quantity
    Adjusted,
    /// Material coming back from a site; adds to stock
    Returned,
}

impl StockAction {
    /// Apply this action to `previous` with the given `quantity`.
    pub fn apply(self, previous: Decimal, quantity: Decimal) -> DomainResult<Decimal> {
        match self {
            StockAction::Added | StockAction::Returned => previous
                .checked_add(quantity)
                .ok_or_else(|| DomainError::overflow("stock quantity")),
            StockAction::Used => Ok((previous - quantity).max(Decimal::ZERO)),
            StockAction::Adjusted => Ok(quantity),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            StockAction::Added => "Added",
            StockAction::Used => "Used",
            StockAction::Adjusted => "Adjusted",
            StockAction::Returned => "Returned",
        }
    }
}

impl fmt::Display for StockAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StockAction {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Added" => Ok(StockAction::Added),
            "Used" => Ok(StockAction::Used),
            "Adjusted" => Ok(StockAction::Adjusted),
            "Returned" => Ok(StockAction::Returned),
            other => Err(DomainError::InvalidAction {
                action: other.to_string(),
            }),
        }
    }
}

/// One immutable entry of a material's stock history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockEvent {
    /// When the movement was recorded
    pub date: DateTime<Utc>,
    /// What caused it
    pub action: StockAction,
    /// Quantity supplied with the action
    pub quantity: Decimal,
    /// Stock before the movement
    pub previous_stock: Decimal,
    /// Stock after the movement
    pub new_stock: Decimal,
    /// Project the movement was booked against
    pub project: Option<ProjectId>,
    /// Who recorded it
    pub updated_by: Option<UserId>,
    /// Free-form notes
    pub notes: Option<String>,
}

/// A requested stock movement
#[derive(Debug, Clone, PartialEq)]
pub struct StockUpdate {
    /// Movement kind
    pub action: StockAction,
    /// Movement size; must not be negative
    pub quantity: Decimal,
    /// Project to book against
    pub project: Option<ProjectId>,
    /// Who is recording it
    pub updated_by: Option<UserId>,
    /// Free-form notes
    pub notes: Option<String>,
}

impl StockUpdate {
    /// A movement with no project, user or notes attached
    pub fn new(action: StockAction, quantity: Decimal) -> Self {
        Self {
            action,
            quantity,
            project: None,
            updated_by: None,
            notes: None,
        }
    }

    /// Book against a project
    pub fn for_project(mut self, project: ProjectId) -> Self {
        self.project = Some(project);
        self
    }

    /// Record who made the movement
    pub fn by(mut self, user: UserId) -> Self {
        self.updated_by = Some(user);
        self
    }

    /// Attach notes
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Input for creating a material
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewMaterial {
    /// Display name
    pub name: String,
    /// Explicit code; generated when absent
    pub code: Option<String>,
    /// Category (cement, steel, timber...)
    pub material_type: String,
    /// Unit of measure
    pub unit: String,
    /// Opening stock
    pub quantity: Decimal,
    /// Price per unit
    pub unit_price: Decimal,
    /// Low-stock threshold
    pub min_stock_level: Decimal,
    /// Storage capacity
    pub max_stock_level: Option<Decimal>,
    /// Supplier name
    pub supplier: Option<String>,
}

/// Changes to a material's descriptive fields. Quantity is deliberately absent:
/// it only moves through the stock ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaterialPatch {
    /// New name
    pub name: Option<String>,
    /// New category
    pub material_type: Option<String>,
    /// New unit
    pub unit: Option<String>,
    /// New price
    pub unit_price: Option<Decimal>,
    /// New low-stock threshold
    pub min_stock_level: Option<Decimal>,
    /// New capacity
    pub max_stock_level: Option<Decimal>,
    /// New supplier
    pub supplier: Option<String>,
    /// Withdraw (`true`) or reinstate (`false`) the material
    pub discontinued: Option<bool>,
}

/// A stocked construction material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    id: MaterialId,
    /// Display name
    pub name: String,
    /// Unique code, `MAT-00001` style
    pub code: String,
    /// Category
    pub material_type: String,
    /// Unit of measure
    pub unit: String,
    quantity: Decimal,
    /// Price per unit
    pub unit_price: Decimal,
    /// Low-stock threshold
    pub min_stock_level: Decimal,
    /// Storage capacity
    pub max_stock_level: Option<Decimal>,
    /// Supplier name
    pub supplier: Option<String>,
    status: MaterialStatus,
    stock_history: Vec<StockEvent>,
    version: u64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Material {
    /// Validate `input` and build a material with an empty history.
    pub fn new(input: NewMaterial, code: String, now: DateTime<Utc>) -> DomainResult<Self> {
        if input.name.trim().is_empty() {
            return Err(DomainError::validation("material name is required"));
        }
        if input.unit.trim().is_empty() {
            return Err(DomainError::validation("material unit is required"));
        }
        non_negative("quantity", input.quantity)?;
        non_negative("unit price", input.unit_price)?;
        non_negative("minimum stock level", input.min_stock_level)?;
        if let Some(max) = input.max_stock_level {
            if max < input.min_stock_level {
                return Err(DomainError::validation(
                    "maximum stock level must not be below the minimum",
                ));
            }
        }

        Ok(Self {
            id: MaterialId::new(),
            name: input.name,
            code,
            material_type: input.material_type,
            unit: input.unit,
            quantity: input.quantity,
            unit_price: input.unit_price,
            min_stock_level: input.min_stock_level,
            max_stock_level: input.max_stock_level,
            supplier: input.supplier,
            status: MaterialStatus::derive(input.quantity, input.min_stock_level),
            stock_history: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Quantity on hand
    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    /// Current status
    pub fn status(&self) -> MaterialStatus {
        self.status
    }

    /// Stock movements, oldest first
    pub fn stock_history(&self) -> &[StockEvent] {
        &self.stock_history
    }

    /// Value of the stock on hand
    pub fn stock_value(&self) -> Decimal {
        self.quantity * self.unit_price
    }

    /// Fail with [`DomainError::InsufficientStock`] unless `requested` is on hand.
    pub fn ensure_available(&self, requested: Decimal) -> DomainResult<()> {
        if requested > self.quantity {
            return Err(DomainError::InsufficientStock {
                material: self.name.clone(),
                requested,
                available: self.quantity,
            });
        }
        Ok(())
    }

    /// Apply a stock movement, append it to the history and re-derive the status.
    pub fn apply_stock(
        &mut self,
        update: &StockUpdate,
        now: DateTime<Utc>,
    ) -> DomainResult<StockEvent> {
        non_negative("stock quantity", update.quantity)?;

        let previous_stock = self.quantity;
        let new_stock = update.action.apply(previous_stock, update.quantity)?;
        let event = StockEvent {
            date: now,
            action: update.action,
            quantity: update.quantity,
            previous_stock,
            new_stock,
            project: update.project,
            updated_by: update.updated_by,
            notes: update.notes.clone(),
        };

        self.quantity = new_stock;
        self.status = MaterialStatus::derive(new_stock, self.min_stock_level);
        self.stock_history.push(event.clone());
        Ok(event)
    }

    /// Apply descriptive changes.
    pub fn apply_patch(&mut self, patch: MaterialPatch) -> DomainResult<()> {
        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("material name is required"));
            }
            self.name = name;
        }
        if let Some(material_type) = patch.material_type {
            self.material_type = material_type;
        }
        if let Some(unit) = patch.unit {
            self.unit = unit;
        }
        if let Some(price) = patch.unit_price {
            non_negative("unit price", price)?;
            self.unit_price = price;
        }
        if let Some(min) = patch.min_stock_level {
            non_negative("minimum stock level", min)?;
            self.min_stock_level = min;
        }
        if let Some(max) = patch.max_stock_level {
            self.max_stock_level = Some(max);
        }
        if let Some(max) = self.max_stock_level {
            if max < self.min_stock_level {
                return Err(DomainError::validation(
                    "maximum stock level must not be below the minimum",
                ));
            }
        }
        if let Some(supplier) = patch.supplier {
            self.supplier = Some(supplier);
        }

        self.status = match patch.discontinued {
            Some(true) => MaterialStatus::Discontinued,
            Some(false) => MaterialStatus::derive(self.quantity, self.min_stock_level),
            None if self.status == MaterialStatus::Discontinued => MaterialStatus::Discontinued,
            None => MaterialStatus::derive(self.quantity, self.min_stock_level),
        };
        Ok(())
    }
}

impl Document for Material {
    type Marker = MaterialMarker;
    const COLLECTION: &'static str = "materials";
    const ENTITY_TYPE: &'static str = "Material";

    fn id(&self) -> MaterialId {
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

fn non_negative(field: &str, value: Decimal) -> DomainResult<()> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(DomainError::ValidationError(format!(
            "{field} must not be negative (got {value})"
        )));
    }
    Ok(())
}
