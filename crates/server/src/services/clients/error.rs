//! Client service error types.

use thiserror::Error;

use client_registry_core::ValidationErrors;

use crate::db::RepositoryError;

/// Errors that can occur during client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The payload broke one or more field rules, uniqueness included.
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    /// The id in the path differs from the id in the body.
    #[error("client id in the path does not match the body")]
    IdMismatch,

    /// Client not found.
    #[error("client not found")]
    NotFound,

    /// Another request updated the client after it was loaded.
    #[error("client was modified by another request")]
    Conflict,

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ClientError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::Conflict(_) => Self::Conflict,
            RepositoryError::UniqueViolation(field) => Self::Validation(field.into()),
            other => Self::Repository(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use client_registry_core::UniqueField;

    use super::*;

    #[test]
    fn test_repository_error_mapping() {
        assert!(matches!(
            ClientError::from(RepositoryError::NotFound),
            ClientError::NotFound
        ));
        assert!(matches!(
            ClientError::from(RepositoryError::Conflict("stale".to_string())),
            ClientError::Conflict
        ));
        assert!(matches!(
            ClientError::from(RepositoryError::DataCorruption("bad".to_string())),
            ClientError::Repository(_)
        ));

        match ClientError::from(RepositoryError::UniqueViolation(UniqueField::TaxDocument)) {
            ClientError::Validation(errors) => assert!(errors.has_field("taxDocument")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
