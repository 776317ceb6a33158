// Copyright 2025 Cowboy AI, LLC.

//! Runtime configuration for the consistency core
//!
//! Loaded from environment variables with sensible defaults, or built in code
//! with the `with_*` setters.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

use crate::errors::{DomainError, DomainResult};

/// How multi-document operations behave when a step fails partway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyMode {
    /// Run steps in order; on failure log what completed and leave it in place
    #[default]
    BestEffort,
    /// Run registered compensations in reverse order when a step fails
    Compensating,
}

impl FromStr for ConsistencyMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best_effort" | "best-effort" | "besteffort" => Ok(ConsistencyMode::BestEffort),
            "compensating" | "transactional" => Ok(ConsistencyMode::Compensating),
            other => Err(DomainError::ValidationError(format!(
                "unknown consistency mode: {other}"
            ))),
        }
    }
}

/// Configuration for the services in [`crate::services`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Behavior of cascade deletion and task reservation on partial failure
    pub consistency: ConsistencyMode,
    /// How many times a compare-and-swap write is retried after a version conflict
    pub max_conflict_retries: u32,
    /// Upper bound (inclusive, in days) of the "due soon" maintenance bucket
    pub maintenance_due_soon_days: i64,
    /// Prefix of generated material codes
    pub material_code_prefix: String,
    /// Prefix of generated equipment codes
    pub equipment_code_prefix: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            consistency: ConsistencyMode::BestEffort,
            max_conflict_retries: 3,
            maintenance_due_soon_days: 7,
            material_code_prefix: "MAT".to_string(),
            equipment_code_prefix: "EQ".to_string(),
        }
    }
}

impl CoreConfig {
    /// Load configuration from `SITEWORKS_*` environment variables.
    ///
    /// Unset variables fall back to the defaults; set but unparseable values
    /// are rejected.
    pub fn from_env() -> DomainResult<Self> {
        let defaults = Self::default();
        Ok(Self {
            consistency: parse_var("SITEWORKS_CONSISTENCY_MODE", defaults.consistency)?,
            max_conflict_retries: parse_var(
                "SITEWORKS_MAX_CONFLICT_RETRIES",
                defaults.max_conflict_retries,
            )?,
            maintenance_due_soon_days: parse_var(
                "SITEWORKS_MAINTENANCE_DUE_SOON_DAYS",
                defaults.maintenance_due_soon_days,
            )?,
            material_code_prefix: env::var("SITEWORKS_MATERIAL_CODE_PREFIX")
                .unwrap_or(defaults.material_code_prefix),
            equipment_code_prefix: env::var("SITEWORKS_EQUIPMENT_CODE_PREFIX")
                .unwrap_or(defaults.equipment_code_prefix),
        })
    }

    /// Set the consistency mode
    pub fn with_consistency(mut self, mode: ConsistencyMode) -> Self {
        self.consistency = mode;
        self
    }

    /// Set the number of conflict retries
    pub fn with_max_conflict_retries(mut self, retries: u32) -> Self {
        self.max_conflict_retries = retries;
        self
    }

    /// Set the "due soon" window in days
    pub fn with_maintenance_due_soon_days(mut self, days: i64) -> Self {
        self.maintenance_due_soon_days = days;
        self
    }

    /// Set the material code prefix
    pub fn with_material_code_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.material_code_prefix = prefix.into();
        self
    }

    /// Set the equipment code prefix
    pub fn with_equipment_code_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.equipment_code_prefix = prefix.into();
        self
    }
}

fn parse_var<T>(name: &str, default: T) -> DomainResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| DomainError::ValidationError(format!("{name}={raw:?}: {e}"))),
        Err(_) => Ok(default),
    }
}
