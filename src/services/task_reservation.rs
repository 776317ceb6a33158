// Copyright 2025 Cowboy AI, LLC.

//! Task creation with material reservation
//!
//! Every reference and every stock level is checked before the first write;
//! stock is then drawn line by line and the task is stored last.

use chrono::Utc;
use tracing::{info, instrument};

use super::stock_ledger::StockLedger;
use crate::config::CoreConfig;
use crate::domain::{
    requested_per_material, EquipmentLine, MaterialLine, NewTask, StockAction, StockUpdate, Task,
};
use crate::entity::{Document, UserId};
use crate::errors::{DomainError, DomainResult};
use crate::events::{ConstructionEvent, Outcome};
use crate::notifications::Notifier;
use crate::persistence::{ensure_exists, Repository, Store};
use crate::unit_of_work::UnitOfWork;

/// Creates tasks and draws their materials from stock
#[derive(Debug, Clone)]
pub struct TaskMaterialReservation {
    store: Store,
    stock: StockLedger,
    notifier: Notifier,
    config: CoreConfig,
}

impl TaskMaterialReservation {
    /// Create the service; stock is drawn through `stock`
    pub fn new(store: Store, stock: StockLedger, notifier: Notifier, config: CoreConfig) -> Self {
        Self {
            store,
            stock,
            notifier,
            config,
        }
    }

    /// Validate and create a task, reserving each material line.
    ///
    /// Fails without touching any stock when the project, assignee, a piece
    /// of equipment or a material does not exist, when a line is malformed,
    /// or when the summed request for a material exceeds what is on hand.
    #[instrument(
        skip_all,
        fields(project = %input.project, title = %input.title, lines = materials.len())
    )]
    pub async fn create_task_with_materials(
        &self,
        input: NewTask,
        materials: Vec<MaterialLine>,
        equipment: Vec<EquipmentLine>,
    ) -> DomainResult<Outcome<Task>> {
        let project = input.project;
        self.store.require_project(project).await?;
        if let Some(user) = input.assigned_to {
            self.store.require_user(user).await?;
        }
        let assignee = input.assigned_to;
        let task = Task::new(input, materials, equipment, Utc::now())?;

        for line in task.equipment() {
            ensure_exists(self.store.equipment.as_ref(), line.equipment).await?;
        }
        for (material, requested) in requested_per_material(task.materials()) {
            self.store
                .require_material(material)
                .await?
                .ensure_available(requested)?;
        }

        let mut uow = UnitOfWork::begin("create_task_with_materials", self.config.consistency);
        let result = self.reserve_and_store(&mut uow, task, assignee).await;
        let saved = match result {
            Ok(saved) => {
                uow.commit()?;
                saved
            }
            Err(e) => return Err(uow.abort(e).await.error),
        };

        info!(task = %saved.id(), "task created with reserved materials");
        let event = ConstructionEvent::TaskCreated {
            task: saved.id(),
            project,
            material_lines: saved.materials().len(),
        };
        self.notifier.emit(&event, &saved);
        Ok(Outcome::new(saved, event))
    }

    async fn reserve_and_store(
        &self,
        uow: &mut UnitOfWork,
        task: Task,
        assignee: Option<UserId>,
    ) -> DomainResult<Task> {
        let project = task.project();
        for line in task.materials() {
            uow.step(
                format!("reserve {} of {}", line.quantity, line.material),
                self.stock
                    .reserve_for_task(line.material, line.quantity, Some(project), assignee),
            )
            .await?;

            let stock = self.stock.clone();
            let MaterialLine { material, quantity } = *line;
            uow.compensate_with(format!("return {quantity} of {material}"), move || async move {
                let update = StockUpdate::new(StockAction::Returned, quantity)
                    .for_project(project)
                    .with_notes("Reservation rolled back");
                stock.update_stock(material, update).await?;
                Ok::<(), DomainError>(())
            });
        }

        let tasks = self.store.tasks.clone();
        uow.step("store task", tasks.insert(task)).await
    }
}
