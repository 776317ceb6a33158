// Copyright 2025 Cowboy AI, LLC.

//! Material stock levels and history

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, instrument, warn};

use super::{insert_coded, update_with_retry};
use crate::config::CoreConfig;
use crate::domain::{
    Material, MaterialPatch, MaterialStatus, NewMaterial, StockAction, StockEvent, StockUpdate,
};
use crate::entity::{Document, MaterialId, ProjectId, UserId};
use crate::errors::{DomainError, DomainResult};
use crate::events::{ConstructionEvent, Outcome};
use crate::notifications::Notifier;
use crate::persistence::{Repository, Store};

/// Owns material quantities, status derivation and the stock history
#[derive(Debug, Clone)]
pub struct StockLedger {
    store: Store,
    notifier: Notifier,
    config: CoreConfig,
}

impl StockLedger {
    /// Create a ledger over `store`
    pub fn new(store: Store, notifier: Notifier, config: CoreConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Register a material, generating a code when none is given.
    #[instrument(skip_all, fields(name = %input.name))]
    pub async fn create_material(&self, input: NewMaterial) -> DomainResult<Outcome<Material>> {
        let saved = insert_coded(
            &self.store,
            self.store.materials.as_ref(),
            &self.config.material_code_prefix,
            input.code.as_deref(),
            |code| Material::new(input.clone(), code, Utc::now()),
        )
        .await?;

        info!(material = %saved.id(), code = %saved.code, "material created");
        let event = ConstructionEvent::MaterialCreated {
            material: saved.id(),
            code: saved.code.clone(),
        };
        self.notifier.emit(&event, &saved);
        Ok(Outcome::new(saved, event))
    }

    /// Load a material
    pub async fn get_material(&self, id: MaterialId) -> DomainResult<Material> {
        self.store.require_material(id).await
    }

    /// Change descriptive fields; quantity only moves through stock updates.
    #[instrument(skip_all, fields(material = %id))]
    pub async fn update_material(
        &self,
        id: MaterialId,
        patch: MaterialPatch,
    ) -> DomainResult<Outcome<Material>> {
        let (saved, ()) = update_with_retry(
            self.store.materials.as_ref(),
            id,
            self.config.max_conflict_retries,
            |material| material.apply_patch(patch.clone()),
        )
        .await?;

        let event = ConstructionEvent::MaterialUpdated {
            material: id,
            status: saved.status(),
        };
        self.notifier.emit(&event, &saved);
        Ok(Outcome::new(saved, event))
    }

    /// Remove a material. Tasks keep their lines; nothing is reversed.
    #[instrument(skip_all, fields(material = %id))]
    pub async fn delete_material(&self, id: MaterialId) -> DomainResult<Outcome<Material>> {
        let removed = self
            .store
            .materials
            .delete(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Material", id))?;

        info!(code = %removed.code, "material deleted");
        let event = ConstructionEvent::MaterialDeleted { material: id };
        self.notifier.emit(&event, &removed);
        Ok(Outcome::new(removed, event))
    }

    /// Apply a stock movement.
    ///
    /// `Used` clamps at zero instead of failing; use
    /// [`StockLedger::reserve_for_task`] when the stock must cover the request.
    #[instrument(
        skip_all,
        fields(material = %id, action = %update.action, quantity = %update.quantity)
    )]
    pub async fn update_stock(
        &self,
        id: MaterialId,
        update: StockUpdate,
    ) -> DomainResult<Outcome<Material>> {
        let (saved, entry) = update_with_retry(
            self.store.materials.as_ref(),
            id,
            self.config.max_conflict_retries,
            |material| material.apply_stock(&update, Utc::now()),
        )
        .await?;

        if update.action == StockAction::Used && entry.new_stock.is_zero() {
            let shortfall = update.quantity - entry.previous_stock;
            if shortfall > Decimal::ZERO {
                warn!(%shortfall, "usage exceeded stock; clamped to zero");
            }
        }
        Ok(self.announce(saved, entry))
    }

    /// Consume stock for a task, failing with `InsufficientStock` before any
    /// change when the stock does not cover `quantity`.
    #[instrument(skip_all, fields(material = %id, quantity = %quantity))]
    pub async fn reserve_for_task(
        &self,
        id: MaterialId,
        quantity: Decimal,
        project: Option<ProjectId>,
        updated_by: Option<UserId>,
    ) -> DomainResult<Outcome<Material>> {
        let mut update = StockUpdate::new(StockAction::Used, quantity);
        update.project = project;
        update.updated_by = updated_by;
        update.notes = Some("Reserved for task".to_string());

        let (saved, entry) = update_with_retry(
            self.store.materials.as_ref(),
            id,
            self.config.max_conflict_retries,
            |material| {
                material.ensure_available(quantity)?;
                material.apply_stock(&update, Utc::now())
            },
        )
        .await?;
        Ok(self.announce(saved, entry))
    }

    /// Materials at or below their minimum, emptiest first
    pub async fn low_stock_materials(&self) -> DomainResult<Vec<Material>> {
        let mut low = self
            .store
            .materials
            .find_where(&|m: &Material| {
                matches!(
                    m.status(),
                    MaterialStatus::LowStock | MaterialStatus::OutOfStock
                )
            })
            .await?;
        low.sort_by(|a, b| a.quantity().cmp(&b.quantity()));
        Ok(low)
    }

    /// Stock history of a material, oldest first
    pub async fn stock_history(&self, id: MaterialId) -> DomainResult<Vec<StockEvent>> {
        Ok(self.get_material(id).await?.stock_history().to_vec())
    }

    fn announce(&self, saved: Material, entry: StockEvent) -> Outcome<Material> {
        info!(
            material = %saved.id(),
            action = %entry.action,
            previous = %entry.previous_stock,
            new = %entry.new_stock,
            status = ?saved.status(),
            "stock updated"
        );
        let event = ConstructionEvent::StockUpdated {
            material: saved.id(),
            entry,
            status: saved.status(),
        };
        self.notifier.emit(&event, &saved);
        Outcome::new(saved, event)
    }
}
