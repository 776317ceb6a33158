// Copyright 2025 Cowboy AI, LLC.

//! Equipment assignment, return, administrative status and maintenance

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::{insert_coded, update_with_retry};
use crate::config::CoreConfig;
use crate::domain::{
    AdministrativeStatus, Equipment, EquipmentCondition, EquipmentPatch, EquipmentStatus,
    MaintenanceRequest, NewEquipment,
};
use crate::entity::{Document, EquipmentId, ProjectId, UserId};
use crate::errors::{DomainError, DomainResult};
use crate::events::{ConstructionEvent, Outcome};
use crate::notifications::Notifier;
use crate::persistence::{Repository, Store};

const MILLIS_PER_DAY: i64 = 86_400_000;

/// One unit in the maintenance schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceEntry {
    /// Equipment
    pub equipment: EquipmentId,
    /// Name
    pub name: String,
    /// Code
    pub code: String,
    /// Current status
    pub status: EquipmentStatus,
    /// Due date
    pub next_maintenance_date: DateTime<Utc>,
    /// Whole days until due, rounded up; negative when overdue
    pub days_until_due: i64,
}

/// Equipment with a due date, bucketed by urgency
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceSchedule {
    /// Past due
    pub overdue: Vec<MaintenanceEntry>,
    /// Due within the configured window
    pub due_soon: Vec<MaintenanceEntry>,
    /// Due later
    pub scheduled: Vec<MaintenanceEntry>,
}

/// Days from `now` until `due`, rounded up
pub fn days_until(due: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (due - now).num_milliseconds();
    let days = millis.div_euclid(MILLIS_PER_DAY);
    if millis.rem_euclid(MILLIS_PER_DAY) == 0 {
        days
    } else {
        days + 1
    }
}

/// Owns the equipment status machine and its histories
#[derive(Debug, Clone)]
pub struct EquipmentLifecycle {
    store: Store,
    notifier: Notifier,
    config: CoreConfig,
}

impl EquipmentLifecycle {
    /// Create the service over `store`
    pub fn new(store: Store, notifier: Notifier, config: CoreConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Register a unit, generating a code when none is given.
    #[instrument(skip_all, fields(name = %input.name))]
    pub async fn create_equipment(&self, input: NewEquipment) -> DomainResult<Outcome<Equipment>> {
        let saved = insert_coded(
            &self.store,
            self.store.equipment.as_ref(),
            &self.config.equipment_code_prefix,
            input.code.as_deref(),
            |code| Equipment::new(input.clone(), code, Utc::now()),
        )
        .await?;

        info!(equipment = %saved.id(), code = %saved.code, "equipment created");
        let event = ConstructionEvent::EquipmentCreated {
            equipment: saved.id(),
            code: saved.code.clone(),
        };
        self.notifier.emit(&event, &saved);
        Ok(Outcome::new(saved, event))
    }

    /// Load a unit
    pub async fn get_equipment(&self, id: EquipmentId) -> DomainResult<Equipment> {
        self.store.require_equipment(id).await
    }

    /// Units free to assign
    pub async fn available_equipment(&self) -> DomainResult<Vec<Equipment>> {
        self.store
            .equipment
            .find_where(&|e: &Equipment| e.status() == EquipmentStatus::Available)
            .await
    }

    /// Change descriptive fields; status is not reachable from here.
    #[instrument(skip_all, fields(equipment = %id))]
    pub async fn update_equipment(
        &self,
        id: EquipmentId,
        patch: EquipmentPatch,
    ) -> DomainResult<Outcome<Equipment>> {
        let (saved, ()) = self
            .mutate(id, |equipment| equipment.apply_patch(patch.clone()))
            .await?;
        let event = ConstructionEvent::EquipmentUpdated { equipment: id };
        self.notifier.emit(&event, &saved);
        Ok(Outcome::new(saved, event))
    }

    /// Remove a unit.
    #[instrument(skip_all, fields(equipment = %id))]
    pub async fn delete_equipment(&self, id: EquipmentId) -> DomainResult<Outcome<Equipment>> {
        let removed = self
            .store
            .equipment
            .delete(id)
            .await?
            .ok_or_else(|| DomainError::not_found(Equipment::ENTITY_TYPE, id))?;

        info!(code = %removed.code, "equipment deleted");
        let event = ConstructionEvent::EquipmentDeleted { equipment: id };
        self.notifier.emit(&event, &removed);
        Ok(Outcome::new(removed, event))
    }

    /// Assign a unit to a project and user.
    ///
    /// Fails with `AlreadyInUse` when the unit is assigned, and with
    /// `EntityNotFound` when the project or user does not exist.
    #[instrument(skip_all, fields(equipment = %id, project = %project, user = %user))]
    pub async fn assign(
        &self,
        id: EquipmentId,
        project: ProjectId,
        user: UserId,
        notes: Option<String>,
    ) -> DomainResult<Outcome<Equipment>> {
        self.store.require_project(project).await?;
        self.store.require_user(user).await?;

        let (saved, ()) = self
            .mutate(id, |equipment| {
                equipment.assign(project, user, notes.clone(), Utc::now())
            })
            .await?;

        info!(code = %saved.code, "equipment assigned");
        let event = ConstructionEvent::EquipmentAssigned {
            equipment: id,
            project,
            assigned_to: user,
        };
        self.notifier.emit(&event, &saved);
        Ok(Outcome::new(saved, event))
    }

    /// Return a unit from its project, closing the open usage record.
    #[instrument(skip_all, fields(equipment = %id, hours = %hours_used))]
    pub async fn return_equipment(
        &self,
        id: EquipmentId,
        hours_used: Decimal,
        condition: Option<EquipmentCondition>,
        notes: Option<String>,
    ) -> DomainResult<Outcome<Equipment>> {
        let (saved, ()) = self
            .mutate(id, |equipment| {
                equipment.return_from_use(hours_used, condition, notes.clone(), Utc::now())
            })
            .await?;

        info!(code = %saved.code, condition = ?saved.condition(), "equipment returned");
        let event = ConstructionEvent::EquipmentReturned {
            equipment: id,
            hours_used,
            condition: saved.condition(),
        };
        self.notifier.emit(&event, &saved);
        Ok(Outcome::new(saved, event))
    }

    /// Administrative status change (workshop, retirement, back to the pool).
    #[instrument(skip_all, fields(equipment = %id, status = ?status))]
    pub async fn override_status(
        &self,
        id: EquipmentId,
        status: AdministrativeStatus,
    ) -> DomainResult<Outcome<Equipment>> {
        let (saved, from) = self
            .mutate(id, |equipment| {
                let from = equipment.status();
                equipment.override_status(status, Utc::now())?;
                Ok(from)
            })
            .await?;

        info!(code = %saved.code, ?from, to = ?saved.status(), "equipment status overridden");
        let event = ConstructionEvent::EquipmentStatusOverridden {
            equipment: id,
            from,
            to: saved.status(),
        };
        self.notifier.emit(&event, &saved);
        Ok(Outcome::new(saved, event))
    }

    /// Book maintenance.
    #[instrument(skip_all, fields(equipment = %id, due = %request.scheduled_date))]
    pub async fn schedule_maintenance(
        &self,
        id: EquipmentId,
        request: MaintenanceRequest,
    ) -> DomainResult<Outcome<Equipment>> {
        let scheduled_date = request.scheduled_date;
        let (saved, ()) = self
            .mutate(id, |equipment| {
                equipment.schedule_maintenance(request.clone(), Utc::now())
            })
            .await?;

        info!(code = %saved.code, "maintenance scheduled");
        let event = ConstructionEvent::MaintenanceScheduled {
            equipment: id,
            scheduled_date,
        };
        self.notifier.emit(&event, &saved);
        Ok(Outcome::new(saved, event))
    }

    /// Maintenance schedule as of now
    pub async fn maintenance_schedule(&self) -> DomainResult<MaintenanceSchedule> {
        self.maintenance_schedule_at(Utc::now()).await
    }

    /// Maintenance schedule as of `now`.
    ///
    /// Units without a due date are left out; each bucket is ordered by due date.
    pub async fn maintenance_schedule_at(
        &self,
        now: DateTime<Utc>,
    ) -> DomainResult<MaintenanceSchedule> {
        let mut entries: Vec<MaintenanceEntry> = self
            .store
            .equipment
            .find_all()
            .await?
            .into_iter()
            .filter_map(|e| {
                let due = e.next_maintenance_date()?;
                Some(MaintenanceEntry {
                    equipment: e.id(),
                    status: e.status(),
                    days_until_due: days_until(due, now),
                    next_maintenance_date: due,
                    name: e.name,
                    code: e.code,
                })
            })
            .collect();
        entries.sort_by_key(|entry| entry.next_maintenance_date);

        let window = self.config.maintenance_due_soon_days;
        let mut schedule = MaintenanceSchedule::default();
        for entry in entries {
            match entry.days_until_due {
                d if d < 0 => schedule.overdue.push(entry),
                d if d <= window => schedule.due_soon.push(entry),
                _ => schedule.scheduled.push(entry),
            }
        }
        Ok(schedule)
    }

    async fn mutate<R, F>(&self, id: EquipmentId, mutate: F) -> DomainResult<(Equipment, R)>
    where
        R: Send,
        F: FnMut(&mut Equipment) -> DomainResult<R> + Send,
    {
        update_with_retry(
            self.store.equipment.as_ref(),
            id,
            self.config.max_conflict_retries,
            mutate,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use test_case::test_case;

    #[test_case(Duration::days(3) => 3; "whole days")]
    #[test_case(Duration::hours(1) => 1; "part day rounds up")]
    #[test_case(Duration::zero() => 0; "today")]
    #[test_case(-Duration::hours(12) => 0; "half a day late still rounds to zero")]
    #[test_case(-Duration::hours(36) => -1; "a day and a half late")]
    #[test_case(-Duration::days(2) => -2; "two days late")]
    fn test_days_until(offset: Duration) -> i64 {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        days_until(now + offset, now)
    }
}
