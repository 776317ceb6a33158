// Copyright 2025 Cowboy AI, LLC.

//! Error types for domain operations

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// Entity not found
    #[error("Entity not found: {entity_type} with id {id}")]
    EntityNotFound {
        /// Type of entity that wasn't found
        entity_type: String,
        /// ID that was searched for
        id: String,
    },

    /// Missing or malformed input, including enum membership violations
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Requested stock exceeds what is on hand
    #[error("Insufficient stock for {material}: requested {requested}, available {available}")]
    InsufficientStock {
        /// Material name or code
        material: String,
        /// Quantity requested
        requested: Decimal,
        /// Quantity on hand
        available: Decimal,
    },

    /// Equipment is already assigned
    #[error("Equipment {equipment} is already in use")]
    AlreadyInUse {
        /// Equipment code
        equipment: String,
    },

    /// Equipment is not assigned, so it cannot be returned
    #[error("Equipment {equipment} is not in use")]
    NotInUse {
        /// Equipment code
        equipment: String,
    },

    /// Unrecognised stock action
    #[error("Invalid stock action: {action} (expected Added, Used, Adjusted or Returned)")]
    InvalidAction {
        /// The rejected action
        action: String,
    },

    /// Unique constraint violation
    #[error("Duplicate key in {collection}: {key} = {value}")]
    DuplicateKey {
        /// Collection holding the unique index
        collection: String,
        /// Field name of the unique index
        key: String,
        /// Conflicting value
        value: String,
    },

    /// Project is locked by a certificate code the update did not carry
    #[error("Certificate code required to update project {project}")]
    CertificateRequired {
        /// Project id
        project: String,
    },

    /// Agreement id does not resolve within the client
    #[error("Agreement {agreement} not found for client {client}")]
    AgreementNotFound {
        /// Client id
        client: String,
        /// Agreement id
        agreement: String,
    },

    /// Invalid state transition
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// Current state
        from: String,
        /// Attempted target state
        to: String,
    },

    /// Concurrency conflict
    #[error("Concurrency conflict: expected version {expected}, but found {actual}")]
    ConcurrencyConflict {
        /// Expected version
        expected: u64,
        /// Actual version
        actual: u64,
    },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Persistence layer failure
    #[error("Storage error: {0}")]
    StorageError(String),
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Machine-distinguishable error classification for the request boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Entity id does not resolve
    NotFound,
    /// Input rejected
    Validation,
    /// Not enough stock
    InsufficientStock,
    /// Equipment already assigned
    AlreadyInUse,
    /// Equipment not assigned
    NotInUse,
    /// Unknown stock action
    InvalidAction,
    /// Unique constraint
    DuplicateKey,
    /// Certificate lock
    CertificateRequired,
    /// Agreement missing
    AgreementNotFound,
    /// State machine guard
    InvalidTransition,
    /// Optimistic concurrency
    Conflict,
    /// Infrastructure
    Infrastructure,
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl DomainError {
    /// Shorthand for an [`DomainError::EntityNotFound`]
    pub fn not_found(entity_type: impl Into<String>, id: impl ToString) -> Self {
        DomainError::EntityNotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Shorthand for a [`DomainError::ValidationError`]
    pub fn validation(msg: impl Into<String>) -> Self {
        DomainError::ValidationError(msg.into())
    }

    /// Validation error for an amount that does not fit in a `Decimal`
    pub fn overflow(what: &str) -> Self {
        DomainError::ValidationError(format!("{what} is out of range"))
    }

    /// Classify the error for callers that translate it into a response
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::EntityNotFound { .. } => ErrorKind::NotFound,
            DomainError::ValidationError(_) => ErrorKind::Validation,
            DomainError::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            DomainError::AlreadyInUse { .. } => ErrorKind::AlreadyInUse,
            DomainError::NotInUse { .. } => ErrorKind::NotInUse,
            DomainError::InvalidAction { .. } => ErrorKind::InvalidAction,
            DomainError::DuplicateKey { .. } => ErrorKind::DuplicateKey,
            DomainError::CertificateRequired { .. } => ErrorKind::CertificateRequired,
            DomainError::AgreementNotFound { .. } => ErrorKind::AgreementNotFound,
            DomainError::InvalidStateTransition { .. } => ErrorKind::InvalidTransition,
            DomainError::ConcurrencyConflict { .. } => ErrorKind::Conflict,
            DomainError::SerializationError(_) | DomainError::StorageError(_) => {
                ErrorKind::Infrastructure
            }
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::EntityNotFound { .. } | DomainError::AgreementNotFound { .. }
        )
    }

    /// Check if this is a validation error
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            DomainError::ValidationError(_) | DomainError::InvalidAction { .. }
        )
    }

    /// Check if this is a concurrency error
    pub fn is_concurrency_error(&self) -> bool {
        matches!(self, DomainError::ConcurrencyConflict { .. })
    }

    /// Only infrastructure and version conflicts are worth retrying; everything
    /// else is a caller input problem or a business rule.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DomainError::StorageError(_) | DomainError::ConcurrencyConflict { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = DomainError::not_found("Material", "123");
        assert_eq!(err.to_string(), "Entity not found: Material with id 123");

        let err = DomainError::InsufficientStock {
            material: "Cement".to_string(),
            requested: Decimal::from(100),
            available: Decimal::from(35),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Cement: requested 100, available 35"
        );

        let err = DomainError::InvalidAction {
            action: "Borrowed".to_string(),
        };
        assert!(err.to_string().contains("Borrowed"));

        let err = DomainError::DuplicateKey {
            collection: "clients".to_string(),
            key: "email".to_string(),
            value: "a@b.c".to_string(),
        };
        assert_eq!(err.to_string(), "Duplicate key in clients: email = a@b.c");

        let err = DomainError::ConcurrencyConflict {
            expected: 5,
            actual: 3,
        };
        assert_eq!(
            err.to_string(),
            "Concurrency conflict: expected version 5, but found 3"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(DomainError::not_found("Client", "x").is_not_found());
        assert!(DomainError::AgreementNotFound {
            client: "c".into(),
            agreement: "a".into()
        }
        .is_not_found());
        assert!(DomainError::validation("bad").is_validation_error());
        assert!(DomainError::ConcurrencyConflict {
            expected: 1,
            actual: 2
        }
        .is_concurrency_error());

        assert!(DomainError::StorageError("down".into()).is_retryable());
        assert!(!DomainError::NotInUse {
            equipment: "EQ-00001".into()
        }
        .is_retryable());
    }

    #[test]
    fn test_error_kind_mapping() {
        assert_eq!(
            DomainError::AlreadyInUse {
                equipment: "EQ-00001".into()
            }
            .kind(),
            ErrorKind::AlreadyInUse
        );
        assert_eq!(
            DomainError::CertificateRequired {
                project: "p".into()
            }
            .kind(),
            ErrorKind::CertificateRequired
        );
        assert_eq!(
            DomainError::SerializationError("x".into()).kind(),
            ErrorKind::Infrastructure
        );
        assert_eq!(
            serde_json::to_string(&ErrorKind::InsufficientStock).unwrap(),
            "\"insufficient_stock\""
        );
    }
}
