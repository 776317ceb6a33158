// Copyright 2025 Cowboy AI, LLC.

//! Project records, progress reports and team assignment

use chrono::Utc;
use tracing::{info, instrument};

use super::update_with_retry;
use crate::config::CoreConfig;
use crate::domain::{
    NewProgressReport, NewProject, ProgressReport, Project, ProjectPatch, Task, User,
};
use crate::entity::{Document, ProjectId, UserId};
use crate::errors::DomainResult;
use crate::events::{ConstructionEvent, Outcome};
use crate::notifications::Notifier;
use crate::persistence::{Repository, Store};

/// Creates and updates projects; enforces the certificate lock
#[derive(Debug, Clone)]
pub struct ProjectRegistry {
    store: Store,
    notifier: Notifier,
    config: CoreConfig,
}

impl ProjectRegistry {
    /// Create the service over `store`
    pub fn new(store: Store, notifier: Notifier, config: CoreConfig) -> Self {
        Self {
            store,
            notifier,
            config,
        }
    }

    /// Create a project; the client and manager, when given, must exist.
    #[instrument(skip_all, fields(name = %input.name))]
    pub async fn create_project(&self, input: NewProject) -> DomainResult<Outcome<Project>> {
        if let Some(client) = input.client {
            self.store.require_client(client).await?;
        }
        if let Some(manager) = input.manager {
            self.store.require_user(manager).await?;
        }
        let saved = self
            .store
            .projects
            .insert(Project::new(input, Utc::now())?)
            .await?;

        info!(project = %saved.id(), "project created");
        let event = ConstructionEvent::ProjectCreated { project: saved.id() };
        self.notifier.emit(&event, &saved);
        Ok(Outcome::new(saved, event))
    }

    /// Load a project
    pub async fn get_project(&self, id: ProjectId) -> DomainResult<Project> {
        self.store.require_project(id).await
    }

    /// Update a project. A locked project rejects patches that do not carry
    /// its certificate code with `CertificateRequired`.
    #[instrument(skip_all, fields(project = %id))]
    pub async fn update_project(
        &self,
        id: ProjectId,
        patch: ProjectPatch,
    ) -> DomainResult<Outcome<Project>> {
        if let Some(client) = patch.client {
            self.store.require_client(client).await?;
        }
        if let Some(manager) = patch.manager {
            self.store.require_user(manager).await?;
        }
        let (saved, ()) = update_with_retry(
            self.store.projects.as_ref(),
            id,
            self.config.max_conflict_retries,
            |project| project.apply_patch(patch.clone()),
        )
        .await?;

        info!(status = ?saved.status(), progress = saved.progress(), "project updated");
        let event = ConstructionEvent::ProjectUpdated { project: id };
        self.notifier.emit(&event, &saved);
        Ok(Outcome::new(saved, event))
    }

    /// File a progress report against an existing project
    #[instrument(skip_all, fields(project = %input.project))]
    pub async fn file_progress_report(
        &self,
        input: NewProgressReport,
    ) -> DomainResult<ProgressReport> {
        self.store.require_project(input.project).await?;
        if let Some(author) = input.submitted_by {
            self.store.require_user(author).await?;
        }
        let saved = self
            .store
            .reports
            .insert(ProgressReport::new(input, Utc::now())?)
            .await?;
        info!(report = %saved.id(), "progress report filed");
        Ok(saved)
    }

    /// Put a user on a project's team
    #[instrument(skip_all, fields(project = %project, user = %user))]
    pub async fn assign_user(&self, project: ProjectId, user: UserId) -> DomainResult<User> {
        self.store.require_project(project).await?;
        let (saved, added) = update_with_retry(
            self.store.users.as_ref(),
            user,
            self.config.max_conflict_retries,
            |u| Ok(u.assign_project(project)),
        )
        .await?;
        if added {
            info!("user assigned to project");
        }
        Ok(saved)
    }

    /// Progress reports of a project, in filing order
    pub async fn progress_reports(
        &self,
        project: ProjectId,
    ) -> DomainResult<Vec<ProgressReport>> {
        let mut reports = self
            .store
            .reports
            .find_where(&|r: &ProgressReport| r.project() == project)
            .await?;
        reports.sort_by_key(|r| r.date);
        Ok(reports)
    }

    /// Tasks of a project, in creation order
    pub async fn project_tasks(&self, project: ProjectId) -> DomainResult<Vec<Task>> {
        let mut tasks = self
            .store
            .tasks
            .find_where(&|t: &Task| t.project() == project)
            .await?;
        tasks.sort_by_key(|t| t.created_at);
        Ok(tasks)
    }
}
