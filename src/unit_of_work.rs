// Copyright 2025 Cowboy AI, LLC.

//! Unit of work for operations that span several documents
//!
//! A unit of work runs ordered steps and keeps a list of compensations. Its
//! lifecycle is a Mealy machine: `Open` moves to `Committed` on success; on
//! failure it moves to `RolledBack` when every compensation ran, or to
//! `Failed` when the work is left partially applied (best-effort mode, or a
//! compensation itself failed).

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{debug, error, info, warn};

use crate::config::ConsistencyMode;
use crate::errors::{DomainError, DomainResult};
use crate::state_machine::{transition, MealyStateTransitions, State, TransitionInput};

/// Lifecycle of a unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitOfWorkState {
    /// Steps are running
    Open,
    /// All steps succeeded (terminal)
    Committed,
    /// A step failed and every compensation ran (terminal)
    RolledBack,
    /// A step failed and completed steps remain applied (terminal)
    Failed,
}

impl State for UnitOfWorkState {
    fn name(&self) -> &'static str {
        match self {
            UnitOfWorkState::Open => "Open",
            UnitOfWorkState::Committed => "Committed",
            UnitOfWorkState::RolledBack => "RolledBack",
            UnitOfWorkState::Failed => "Failed",
        }
    }

    fn is_terminal(&self) -> bool {
        !matches!(self, UnitOfWorkState::Open)
    }
}

/// Inputs that close a unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitOfWorkInput {
    /// Every step succeeded
    Commit,
    /// Compensations ran to completion
    RollBack,
    /// Partial work is left in place
    Abandon,
}

impl TransitionInput for UnitOfWorkInput {
    fn description(&self) -> String {
        format!("{self:?}")
    }
}

impl MealyStateTransitions for UnitOfWorkState {
    type Input = UnitOfWorkInput;

    fn can_transition_to(&self, target: &Self, input: &Self::Input) -> bool {
        use UnitOfWorkInput as I;
        use UnitOfWorkState as S;
        matches!(
            (*self, target, input),
            (S::Open, S::Committed, I::Commit)
                | (S::Open, S::RolledBack, I::RollBack)
                | (S::Open, S::Failed, I::Abandon)
        )
    }

    fn valid_transitions(&self, input: &Self::Input) -> Vec<Self> {
        use UnitOfWorkInput as I;
        use UnitOfWorkState as S;
        match (*self, input) {
            (S::Open, I::Commit) => vec![S::Committed],
            (S::Open, I::RollBack) => vec![S::RolledBack],
            (S::Open, I::Abandon) => vec![S::Failed],
            _ => Vec::new(),
        }
    }
}

type Compensation = Box<dyn FnOnce() -> BoxFuture<'static, DomainResult<()>> + Send>;

/// How a failed unit of work ended
#[derive(Debug, Clone, PartialEq)]
pub struct Aborted {
    /// Error of the failing step
    pub error: DomainError,
    /// Terminal state reached
    pub state: UnitOfWorkState,
    /// Steps that had completed before the failure
    pub completed_steps: Vec<String>,
}

/// Ordered steps with optional compensations
pub struct UnitOfWork {
    name: &'static str,
    mode: ConsistencyMode,
    state: UnitOfWorkState,
    completed: Vec<String>,
    compensations: Vec<(String, Compensation)>,
}

impl std::fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("state", &self.state)
            .field("completed", &self.completed)
            .field("compensations", &self.compensations.len())
            .finish()
    }
}

impl UnitOfWork {
    /// Open a unit of work
    pub fn begin(name: &'static str, mode: ConsistencyMode) -> Self {
        debug!(unit_of_work = name, ?mode, "unit of work opened");
        Self {
            name,
            mode,
            state: UnitOfWorkState::Open,
            completed: Vec::new(),
            compensations: Vec::new(),
        }
    }

    /// Current state
    pub fn state(&self) -> UnitOfWorkState {
        self.state
    }

    /// Consistency mode this unit runs under
    pub fn mode(&self) -> ConsistencyMode {
        self.mode
    }

    /// Labels of the steps completed so far
    pub fn completed_steps(&self) -> &[String] {
        &self.completed
    }

    /// Run one step; its label is recorded only if it succeeds.
    pub async fn step<T, F>(&mut self, label: impl Into<String>, work: F) -> DomainResult<T>
    where
        F: Future<Output = DomainResult<T>>,
    {
        let label = label.into();
        let value = work.await?;
        debug!(unit_of_work = self.name, step = %label, "step completed");
        self.completed.push(label);
        Ok(value)
    }

    /// Register the undo action for the step that just completed.
    ///
    /// Only executed in [`ConsistencyMode::Compensating`]; in best-effort mode
    /// nothing is kept.
    pub fn compensate_with<F, Fut>(&mut self, label: impl Into<String>, undo: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = DomainResult<()>> + Send + 'static,
    {
        if self.mode != ConsistencyMode::Compensating {
            return;
        }
        let compensation: Compensation = Box::new(move || Box::pin(undo()));
        self.compensations.push((label.into(), compensation));
    }

    /// Close successfully.
    pub fn commit(mut self) -> DomainResult<Vec<String>> {
        transition(&self.state, UnitOfWorkState::Committed, UnitOfWorkInput::Commit)?;
        self.state = UnitOfWorkState::Committed;
        info!(
            unit_of_work = self.name,
            steps = self.completed.len(),
            "unit of work committed"
        );
        Ok(std::mem::take(&mut self.completed))
    }

    /// Close after `error`: compensate in reverse order, or log what stays applied.
    pub async fn abort(mut self, error: DomainError) -> Aborted {
        let target = match self.mode {
            ConsistencyMode::BestEffort => {
                warn!(
                    unit_of_work = self.name,
                    error = %error,
                    completed_steps = ?self.completed,
                    "unit of work failed; completed steps were not rolled back"
                );
                UnitOfWorkState::Failed
            }
            ConsistencyMode::Compensating => self.run_compensations(&error).await,
        };

        let input = match target {
            UnitOfWorkState::RolledBack => UnitOfWorkInput::RollBack,
            _ => UnitOfWorkInput::Abandon,
        };
        if let Ok(t) = transition(&self.state, target, input) {
            self.state = t.to;
        }

        Aborted {
            error,
            state: self.state,
            completed_steps: self.completed,
        }
    }

    async fn run_compensations(&mut self, error: &DomainError) -> UnitOfWorkState {
        warn!(
            unit_of_work = self.name,
            error = %error,
            compensations = self.compensations.len(),
            "unit of work failed; compensating"
        );
        let mut clean = true;
        while let Some((label, undo)) = self.compensations.pop() {
            match undo().await {
                Ok(()) => debug!(unit_of_work = self.name, step = %label, "compensated"),
                Err(e) => {
                    clean = false;
                    error!(
                        unit_of_work = self.name,
                        step = %label,
                        error = %e,
                        "compensation failed"
                    );
                }
            }
        }
        if clean {
            UnitOfWorkState::RolledBack
        } else {
            UnitOfWorkState::Failed
        }
    }
}
