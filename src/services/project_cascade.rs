// Copyright 2025 Cowboy AI, LLC.

//! Cascading project deletion

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::update_with_retry;
use crate::config::CoreConfig;
use crate::domain::{ProgressReport, Task, User};
use crate::entity::{Document, ProjectId, UserId};
use crate::errors::{DomainError, DomainResult};
use crate::events::{ConstructionEvent, Outcome};
use crate::notifications::Notifier;
use crate::persistence::{Repository, Store};
use crate::unit_of_work::UnitOfWork;

/// What a cascade deletion removed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeReport {
    /// Project id
    pub project: ProjectId,
    /// Project name, for confirmation
    pub project_name: String,
    /// Progress reports deleted
    pub reports: usize,
    /// Tasks deleted
    pub tasks: usize,
    /// Users whose assignment list lost the project
    pub users_updated: usize,
}

/// Deletes a project with its reports and tasks and unlinks it from users
#[derive(Debug, Clone)]
pub struct ProjectCascadeDeleter {
    store: Store,
    notifier: Notifier,
    config: CoreConfig,
}

impl ProjectCascadeDeleter {
    /// Create the service over `store`
    pub fn new(store: Store, notifier: Notifier, config: CoreConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Delete `id` and everything it owns, in this order: progress reports,
    /// tasks, user assignments, the project itself.
    ///
    /// Material consumed by the deleted tasks is not returned to stock. On
    /// failure the configured consistency mode decides whether the completed
    /// steps are compensated or left in place.
    #[instrument(skip_all, fields(project = %id, mode = ?self.config.consistency))]
    pub async fn delete_project_cascade(
        &self,
        id: ProjectId,
    ) -> DomainResult<Outcome<CascadeReport>> {
        let project = self.store.require_project(id).await?;

        let mut uow = UnitOfWork::begin("delete_project_cascade", self.config.consistency);
        let result = self.run(&mut uow, id, project.name.clone()).await;
        let report = match result {
            Ok(report) => {
                uow.commit()?;
                report
            }
            Err(e) => return Err(uow.abort(e).await.error),
        };

        info!(
            name = %report.project_name,
            reports = report.reports,
            tasks = report.tasks,
            users_updated = report.users_updated,
            "project deleted with dependents"
        );
        let event = ConstructionEvent::ProjectDeleted {
            project: id,
            name: report.project_name.clone(),
            tasks: report.tasks,
            reports: report.reports,
            users_updated: report.users_updated,
        };
        self.notifier.emit(&event, &report);
        Ok(Outcome::new(report, event))
    }

    async fn run(
        &self,
        uow: &mut UnitOfWork,
        id: ProjectId,
        project_name: String,
    ) -> DomainResult<CascadeReport> {
        let reports_repo = self.store.reports.clone();
        let reports = uow
            .step(
                "delete progress reports",
                reports_repo.delete_where(&|r: &ProgressReport| r.project() == id),
            )
            .await?;
        let report_count = reports.len();
        uow.compensate_with("restore progress reports", move || async move {
            for report in reports {
                reports_repo.insert(report).await?;
            }
            Ok::<(), DomainError>(())
        });

        let tasks_repo = self.store.tasks.clone();
        let tasks = uow
            .step(
                "delete tasks",
                tasks_repo.delete_where(&|t: &Task| t.project() == id),
            )
            .await?;
        let task_count = tasks.len();
        uow.compensate_with("restore tasks", move || async move {
            for task in tasks {
                tasks_repo.insert(task).await?;
            }
            Ok::<(), DomainError>(())
        });

        let unlinked = uow.step("unassign users", self.unassign_users(id)).await?;
        let users_updated = unlinked.len();
        let users_repo = self.store.users.clone();
        let retries = self.config.max_conflict_retries;
        uow.compensate_with("reassign users", move || async move {
            for user in unlinked {
                update_with_retry(users_repo.as_ref(), user, retries, |u: &mut User| {
                    Ok(u.assign_project(id))
                })
                .await?;
            }
            Ok::<(), DomainError>(())
        });

        let projects_repo = self.store.projects.clone();
        uow.step("delete project", async {
            projects_repo.delete(id).await.and_then(|removed| {
                removed
                    .map(|_| ())
                    .ok_or_else(|| DomainError::not_found("Project", id))
            })
        })
        .await?;

        Ok(CascadeReport {
            project: id,
            project_name,
            reports: report_count,
            tasks: task_count,
            users_updated,
        })
    }

    async fn unassign_users(&self, project: ProjectId) -> DomainResult<Vec<UserId>> {
        let members = self
            .store
            .users
            .find_where(&|u: &User| u.is_assigned_to(project))
            .await?;

        let mut unlinked = Vec::with_capacity(members.len());
        for member in members {
            let (_, removed) = update_with_retry(
                self.store.users.as_ref(),
                member.id(),
                self.config.max_conflict_retries,
                |u| Ok(u.unassign_project(project)),
            )
            .await?;
            if removed {
                unlinked.push(member.id());
            }
        }
        Ok(unlinked)
    }
}
