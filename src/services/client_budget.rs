// Copyright 2025 Cowboy AI, LLC.

//! Client budget accounting and the agreement signing workflow

use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::update_with_retry;
use crate::config::CoreConfig;
use crate::domain::{
    BudgetOperation, BudgetStatus, Client, ClientPatch, NewAgreement, NewClient, SignatureParty,
};
use crate::entity::{AgreementId, ClientId, Document, UserId};
use crate::errors::{DomainError, DomainResult};
use crate::events::{ConstructionEvent, Outcome};
use crate::notifications::Notifier;
use crate::persistence::{Repository, Store};

/// Budget figures of one client in the summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientBudgetLine {
    /// Client
    pub client: ClientId,
    /// Client name
    pub name: String,
    /// Agreed total
    pub total_budget: Decimal,
    /// Allocated to projects
    pub allocated_budget: Decimal,
    /// Spent
    pub spent_budget: Decimal,
    /// Total minus spent
    pub remaining_budget: Decimal,
    /// Spent as a percentage of total, two decimals
    pub utilization: Decimal,
    /// Derived status
    pub budget_status: BudgetStatus,
}

/// Budget overview across clients that have a budget
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    /// One line per client with a positive total
    pub clients: Vec<ClientBudgetLine>,
    /// Sum of totals
    pub total_budget: Decimal,
    /// Sum of spend
    pub total_spent: Decimal,
    /// Sum of remaining
    pub total_remaining: Decimal,
    /// Mean utilization, two decimals; zero with no clients
    pub average_utilization: Decimal,
    /// Clients over budget
    pub exceeded: usize,
}

/// Owns client budgets and agreements
#[derive(Debug, Clone)]
pub struct ClientBudget {
    store: Store,
    notifier: Notifier,
    config: CoreConfig,
}

impl ClientBudget {
    /// Create the service over `store`
    pub fn new(store: Store, notifier: Notifier, config: CoreConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Register a client; emails are unique regardless of case.
    #[instrument(skip_all, fields(name = %input.name))]
    pub async fn create_client(&self, input: NewClient) -> DomainResult<Outcome<Client>> {
        let client = Client::new(input, Utc::now())?;
        let saved = self.store.clients.insert(client).await?;

        info!(client = %saved.id(), "client created");
        let event = ConstructionEvent::ClientCreated { client: saved.id() };
        self.notifier.emit(&event, &saved);
        Ok(Outcome::new(saved, event))
    }

    /// Load a client
    pub async fn get_client(&self, id: ClientId) -> DomainResult<Client> {
        self.store.require_client(id).await
    }

    /// Change contact data or the budget ceiling
    #[instrument(skip_all, fields(client = %id))]
    pub async fn update_client(
        &self,
        id: ClientId,
        patch: ClientPatch,
    ) -> DomainResult<Outcome<Client>> {
        let (saved, ()) = self
            .mutate(id, |client| client.apply_patch(patch.clone()))
            .await?;
        let event = ConstructionEvent::ClientUpdated { client: id };
        self.notifier.emit(&event, &saved);
        Ok(Outcome::new(saved, event))
    }

    /// Remove a client
    #[instrument(skip_all, fields(client = %id))]
    pub async fn delete_client(&self, id: ClientId) -> DomainResult<Outcome<Client>> {
        let removed = self
            .store
            .clients
            .delete(id)
            .await?
            .ok_or_else(|| DomainError::not_found(Client::ENTITY_TYPE, id))?;

        info!("client deleted");
        let event = ConstructionEvent::ClientDeleted { client: id };
        self.notifier.emit(&event, &removed);
        Ok(Outcome::new(removed, event))
    }

    /// Apply a spend change and re-derive the budget status.
    #[instrument(skip_all, fields(client = %id, amount = %amount, operation = ?operation))]
    pub async fn update_budget(
        &self,
        id: ClientId,
        amount: Decimal,
        operation: BudgetOperation,
    ) -> DomainResult<Outcome<Client>> {
        let (saved, ()) = self
            .mutate(id, |client| client.update_budget(amount, operation))
            .await?;

        let budget = saved.budget_info();
        info!(
            spent = %budget.spent_budget(),
            total = %budget.total_budget(),
            status = ?budget.budget_status(),
            "budget updated"
        );
        let event = ConstructionEvent::BudgetUpdated {
            client: id,
            operation,
            amount,
            spent_budget: budget.spent_budget(),
            budget_status: budget.budget_status(),
        };
        self.notifier.emit(&event, &saved);
        Ok(Outcome::new(saved, event))
    }

    /// Draft an agreement for a client.
    #[instrument(skip_all, fields(client = %id, title = %input.title))]
    pub async fn add_agreement(
        &self,
        id: ClientId,
        input: NewAgreement,
    ) -> DomainResult<Outcome<Client>> {
        let (saved, agreement) = self
            .mutate(id, |client| client.add_agreement(input.clone(), Utc::now()))
            .await?;

        info!(%agreement, "agreement added");
        let event = ConstructionEvent::AgreementAdded {
            client: id,
            agreement,
        };
        self.notifier.emit(&event, &saved);
        Ok(Outcome::new(saved, event))
    }

    /// Record one party's signature. `signed_by` must name an existing user.
    #[instrument(skip_all, fields(client = %client_id, agreement = %agreement_id, party = ?party))]
    pub async fn sign_agreement(
        &self,
        client_id: ClientId,
        agreement_id: AgreementId,
        party: SignatureParty,
        signature_data: String,
        signer_name: String,
        signed_by: Option<UserId>,
    ) -> DomainResult<Outcome<Client>> {
        if let Some(user) = signed_by {
            self.store.require_user(user).await?;
        }

        let (saved, status) = self
            .mutate(client_id, |client| {
                let agreement = client.sign_agreement(
                    agreement_id,
                    party,
                    signature_data.clone(),
                    signer_name.clone(),
                    signed_by,
                    Utc::now(),
                )?;
                Ok(agreement.status())
            })
            .await?;

        info!(?status, "agreement signed");
        let event = ConstructionEvent::AgreementSigned {
            client: client_id,
            agreement: agreement_id,
            party,
            status,
        };
        self.notifier.emit(&event, &saved);
        Ok(Outcome::new(saved, event))
    }

    /// Budget overview over clients with a positive total.
    pub async fn budget_summary(&self) -> DomainResult<BudgetSummary> {
        let clients = self
            .store
            .clients
            .find_where(&|c: &Client| c.budget_info().total_budget() > Decimal::ZERO)
            .await?;

        let mut summary = BudgetSummary::default();
        let mut utilization_sum = Decimal::ZERO;
        for client in clients {
            let budget = client.budget_info();
            let utilization = percent(budget.utilization()?.unwrap_or_default());
            summary.total_budget = sum(summary.total_budget, budget.total_budget())?;
            summary.total_spent = sum(summary.total_spent, budget.spent_budget())?;
            summary.total_remaining = sum(summary.total_remaining, budget.remaining_budget())?;
            if budget.budget_status() == BudgetStatus::Exceeded {
                summary.exceeded += 1;
            }
            utilization_sum = sum(utilization_sum, utilization)?;
            summary.clients.push(ClientBudgetLine {
                client: client.id(),
                name: client.name.clone(),
                total_budget: budget.total_budget(),
                allocated_budget: budget.allocated_budget(),
                spent_budget: budget.spent_budget(),
                remaining_budget: budget.remaining_budget(),
                utilization,
                budget_status: budget.budget_status(),
            });
        }
        if !summary.clients.is_empty() {
            summary.average_utilization =
                percent(utilization_sum / Decimal::from(summary.clients.len()));
        }
        Ok(summary)
    }

    async fn mutate<R, F>(&self, id: ClientId, mutate: F) -> DomainResult<(Client, R)>
    where
        R: Send,
        F: FnMut(&mut Client) -> DomainResult<R> + Send,
    {
        update_with_retry(
            self.store.clients.as_ref(),
            id,
            self.config.max_conflict_retries,
            mutate,
        )
        .await
    }
}

fn sum(total: Decimal, value: Decimal) -> DomainResult<Decimal> {
    total
        .checked_add(value)
        .ok_or_else(|| DomainError::overflow("budget total"))
}

fn percent(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
