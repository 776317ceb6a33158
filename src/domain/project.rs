// Copyright 2025 Cowboy AI, LLC.

//! Projects and the certificate lock

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entity::{ClientId, Document, ProjectId, ProjectMarker, UserId};
use crate::errors::{DomainError, DomainResult};

/// Lifecycle of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectStatus {
    /// Being planned
    #[default]
    Planning,
    /// Approved
    Active,
    /// Works under way
    InProgress,
    /// Handed over
    Completed,
    /// Abandoned
    Cancelled,
}

/// Input for creating a project
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewProject {
    /// Display name
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Commissioning client
    pub client: Option<ClientId>,
    /// Responsible manager
    pub manager: Option<UserId>,
    /// Budget
    pub budget: Option<Decimal>,
    /// Planned start
    pub start_date: Option<DateTime<Utc>>,
    /// Planned end
    pub end_date: Option<DateTime<Utc>>,
    /// Lock code; once set every update must present it
    pub certificate_code: Option<String>,
}

/// Changes to a project.
///
/// When the project carries a certificate code, `certificate_code` must hold
/// the same value or the whole patch is rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectPatch {
    /// New name
    pub name: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New client
    pub client: Option<ClientId>,
    /// New manager
    pub manager: Option<UserId>,
    /// New status
    pub status: Option<ProjectStatus>,
    /// New progress, 0 to 100
    pub progress: Option<u8>,
    /// New budget
    pub budget: Option<Decimal>,
    /// New start
    pub start_date: Option<DateTime<Utc>>,
    /// New end
    pub end_date: Option<DateTime<Utc>>,
    /// Current lock code, or the code to set on an unlocked project
    pub certificate_code: Option<String>,
}

/// A construction project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    id: ProjectId,
    /// Display name
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// Commissioning client
    pub client: Option<ClientId>,
    /// Responsible manager
    pub manager: Option<UserId>,
    status: ProjectStatus,
    progress: u8,
    /// Budget
    pub budget: Option<Decimal>,
    /// Planned start
    pub start_date: Option<DateTime<Utc>>,
    /// Planned end
    pub end_date: Option<DateTime<Utc>>,
    certificate_code: Option<String>,
    version: u64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Validate and build a project in `Planning`.
    pub fn new(input: NewProject, now: DateTime<Utc>) -> DomainResult<Self> {
        if input.name.trim().is_empty() {
            return Err(DomainError::validation("project name is required"));
        }
        check_dates(input.start_date, input.end_date)?;
        if let Some(budget) = input.budget {
            if budget < Decimal::ZERO {
                return Err(DomainError::validation("project budget must not be negative"));
            }
        }

        Ok(Self {
            id: ProjectId::new(),
            name: input.name,
            description: input.description,
            client: input.client,
            manager: input.manager,
            status: ProjectStatus::Planning,
            progress: 0,
            budget: input.budget,
            start_date: input.start_date,
            end_date: input.end_date,
            certificate_code: input.certificate_code.filter(|c| !c.is_empty()),
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Current status
    pub fn status(&self) -> ProjectStatus {
        self.status
    }

    /// Completion percentage
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Whether edits require the certificate code
    pub fn is_locked(&self) -> bool {
        self.certificate_code.as_deref().is_some_and(|c| !c.is_empty())
    }

    /// Fail with [`DomainError::CertificateRequired`] unless `presented`
    /// opens the lock.
    pub fn check_certificate(&self, presented: Option<&str>) -> DomainResult<()> {
        match self.certificate_code.as_deref() {
            Some(code) if !code.is_empty() && presented != Some(code) => {
                Err(DomainError::CertificateRequired {
                    project: self.name.clone(),
                })
            }
            _ => Ok(()),
        }
    }

    /// Apply a patch after the certificate check; nothing changes on failure.
    pub fn apply_patch(&mut self, patch: ProjectPatch) -> DomainResult<()> {
        self.check_certificate(patch.certificate_code.as_deref())?;

        if let Some(progress) = patch.progress {
            if progress > 100 {
                return Err(DomainError::ValidationError(format!(
                    "progress must be between 0 and 100 (got {progress})"
                )));
            }
        }
        if let Some(name) = &patch.name {
            if name.trim().is_empty() {
                return Err(DomainError::validation("project name is required"));
            }
        }
        if let Some(budget) = patch.budget {
            if budget < Decimal::ZERO {
                return Err(DomainError::validation("project budget must not be negative"));
            }
        }
        check_dates(
            patch.start_date.or(self.start_date),
            patch.end_date.or(self.end_date),
        )?;

        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(client) = patch.client {
            self.client = Some(client);
        }
        if let Some(manager) = patch.manager {
            self.manager = Some(manager);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(progress) = patch.progress {
            self.progress = progress;
        }
        if let Some(budget) = patch.budget {
            self.budget = Some(budget);
        }
        if let Some(start) = patch.start_date {
            self.start_date = Some(start);
        }
        if let Some(end) = patch.end_date {
            self.end_date = Some(end);
        }
        if !self.is_locked() {
            self.certificate_code = patch.certificate_code.filter(|c| !c.is_empty());
        }
        Ok(())
    }
}

impl Document for Project {
    type Marker = ProjectMarker;
    const COLLECTION: &'static str = "projects";
    const ENTITY_TYPE: &'static str = "Project";

    fn id(&self) -> ProjectId {
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

fn check_dates(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> DomainResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        if end < start {
            return Err(DomainError::validation("project ends before it starts"));
        }
    }
    Ok(())
}
