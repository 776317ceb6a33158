// Copyright 2025 Cowboy AI, LLC.

//! Progress reports filed against a project

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Document, ProjectId, ReportId, ReportMarker, UserId};
use crate::errors::{DomainError, DomainResult};

/// Input for filing a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProgressReport {
    /// Project reported on
    pub project: ProjectId,
    /// Title
    pub title: String,
    /// Narrative
    pub summary: String,
    /// Reported completion, 0 to 100
    pub progress: u8,
    /// Author
    pub submitted_by: Option<UserId>,
}

/// A dated progress report; owned by its project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    id: ReportId,
    project: ProjectId,
    /// Title
    pub title: String,
    /// Narrative
    pub summary: String,
    /// Reported completion
    pub progress: u8,
    /// Author
    pub submitted_by: Option<UserId>,
    /// Report date
    pub date: DateTime<Utc>,
    version: u64,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl ProgressReport {
    /// Validate and file a report dated `now`.
    pub fn new(input: NewProgressReport, now: DateTime<Utc>) -> DomainResult<Self> {
        if input.title.trim().is_empty() {
            return Err(DomainError::validation("report title is required"));
        }
        if input.progress > 100 {
            return Err(DomainError::ValidationError(format!(
                "progress must be between 0 and 100 (got {})",
                input.progress
            )));
        }
        Ok(Self {
            id: ReportId::new(),
            project: input.project,
            title: input.title,
            summary: input.summary,
            progress: input.progress,
            submitted_by: input.submitted_by,
            date: now,
            version: 0,
            updated_at: now,
        })
    }

    /// Project reported on
    pub fn project(&self) -> ProjectId {
        self.project
    }
}

impl Document for ProgressReport {
    type Marker = ReportMarker;
    const COLLECTION: &'static str = "progress_reports";
    const ENTITY_TYPE: &'static str = "ProgressReport";

    fn id(&self) -> ReportId {
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
