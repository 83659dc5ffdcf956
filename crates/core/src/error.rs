//! Domain error model.

use thiserror::Error;

use crate::entity::EntityKind;
use crate::id::RecordId;
use crate::validation::{FieldError, ValidationErrors};

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Each variant is a distinct failure kind so callers branch on the variant,
/// never on message text. Only `Storage` carries infrastructure failures, and
/// it is opaque.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Client input was malformed (one or more field-level violations).
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    /// A cross-entity invariant would be violated.
    #[error(transparent)]
    Referential(#[from] ReferentialError),

    /// A well-formed identifier matched no record.
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: RecordId },

    /// A uniqueness constraint was violated at write time.
    #[error("{entity} with {field} '{value}' already exists")]
    Conflict {
        entity: EntityKind,
        field: String,
        value: String,
    },

    /// The persistence layer failed; the mutation did not happen.
    #[error("storage failure: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn not_found(entity: EntityKind, id: RecordId) -> Self {
        Self::NotFound { entity, id }
    }

    pub fn conflict(entity: EntityKind, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Conflict {
            entity,
            field: field.into(),
            value: value.into(),
        }
    }

    /// A single field-level validation failure.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(ValidationErrors::from(vec![FieldError::new(field, message)]))
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

/// Referential-integrity failure between items and suppliers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReferentialError {
    /// An item names a supplier that does not exist.
    #[error("supplier not found: {supplier_id}")]
    SupplierNotFound { supplier_id: RecordId },

    /// Deleting the supplier would orphan `count` items.
    #[error("supplier {supplier_id} has {count} dependent item(s)")]
    HasDependents { supplier_id: RecordId, count: u64 },
}
