// Copyright 2025 Cowboy AI, LLC.

//! The slice of a user the core needs: identity and project assignments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{Document, ProjectId, UserId, UserMarker};
use crate::errors::{DomainError, DomainResult};

/// Role of a user within the company
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UserRole {
    /// Full access
    Admin,
    /// Runs projects
    Manager,
    /// Supervises a site
    Supervisor,
    /// Works on site
    #[default]
    Worker,
}

/// Input for registering a user
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    /// Display name
    pub name: String,
    /// Unique email
    pub email: String,
    /// Role
    pub role: UserRole,
}

/// A company user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    /// Display name
    pub name: String,
    email: String,
    /// Role
    pub role: UserRole,
    assigned_projects: Vec<ProjectId>,
    version: u64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Validate and build a user with no assignments.
    pub fn new(input: NewUser, now: DateTime<Utc>) -> DomainResult<Self> {
        if input.name.trim().is_empty() {
            return Err(DomainError::validation("user name is required"));
        }
        let email = input.email.trim().to_lowercase();
        if !email.contains('@') {
            return Err(DomainError::ValidationError(format!(
                "invalid email: {}",
                input.email
            )));
        }
        Ok(Self {
            id: UserId::new(),
            name: input.name,
            email,
            role: input.role,
            assigned_projects: Vec::new(),
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Normalized email
    pub fn email(&self) -> &str {
        &self.email
    }

    /// Projects the user works on
    pub fn assigned_projects(&self) -> &[ProjectId] {
        &self.assigned_projects
    }

    /// Whether the user is on `project`
    pub fn is_assigned_to(&self, project: ProjectId) -> bool {
        self.assigned_projects.contains(&project)
    }

    /// Add a project; returns false if it was already there.
    pub fn assign_project(&mut self, project: ProjectId) -> bool {
        if self.is_assigned_to(project) {
            return false;
        }
        self.assigned_projects.push(project);
        true
    }

    /// Remove a project; returns whether anything changed.
    pub fn unassign_project(&mut self, project: ProjectId) -> bool {
        let before = self.assigned_projects.len();
        self.assigned_projects.retain(|p| *p != project);
        self.assigned_projects.len() != before
    }
}

impl Document for User {
    type Marker = UserMarker;
    const COLLECTION: &'static str = "users";
    const ENTITY_TYPE: &'static str = "User";

    fn id(&self) -> UserId {
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
        vec![("email", self.email.clone())]
    }
}
