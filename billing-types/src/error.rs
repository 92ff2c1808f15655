//! Error types for the billing payments layer.

use crate::domain::PublicId;
use crate::validation::ValidationErrors;

/// Domain-level errors (business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("Amount cannot be negative")]
    NegativeAmount,

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Unknown bulk action: {0}")]
    UnknownAction(String),

    #[error("Invalid public id: {0}")]
    InvalidPublicId(String),
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Entity not found")]
    NotFound,

    #[error("Unknown {entity}: {public_id}")]
    UnresolvedReference {
        entity: &'static str,
        public_id: String,
    },
}

impl RepoError {
    pub fn unresolved(entity: &'static str, public_id: impl ToString) -> Self {
        RepoError::UnresolvedReference {
            entity,
            public_id: public_id.to_string(),
        }
    }
}

/// Application-level errors returned by the payment service.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn payment_not_found(public_id: PublicId) -> Self {
        AppError::NotFound(format!("Payment {}", public_id))
    }
}

impl From<RepoError> for AppError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::Domain(e) => AppError::BadRequest(e.to_string()),
            RepoError::NotFound => AppError::NotFound("Resource not found".into()),
            e @ RepoError::UnresolvedReference { .. } => AppError::BadRequest(e.to_string()),
            RepoError::Database(e) => AppError::Internal(e),
        }
    }
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}
