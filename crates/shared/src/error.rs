//! Application-wide error types.

use thiserror::Error;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
///
/// Repository errors convert into this taxonomy via `From` so the
/// surrounding application layer sees one stable set of failure kinds.
#[derive(Debug, Error)]
pub enum AppError {
    /// No caller identity was supplied.
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Caller lacks the required role or relationship.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// Resource does not exist or is soft-deleted.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input (bad amount, month count out of range, mismatched batch).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Conflict (already-deleted resource, duplicate settlement, stale agreement).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the error code for the application layer.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns true if the failure is the caller's fault rather than the system's.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Database(_) | Self::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            AppError::Unauthenticated(String::new()).error_code(),
            "UNAUTHENTICATED"
        );
        assert_eq!(AppError::Forbidden(String::new()).error_code(), "FORBIDDEN");
        assert_eq!(AppError::NotFound(String::new()).error_code(), "NOT_FOUND");
        assert_eq!(
            AppError::InvalidInput(String::new()).error_code(),
            "INVALID_INPUT"
        );
        assert_eq!(AppError::Conflict(String::new()).error_code(), "CONFLICT");
        assert_eq!(
            AppError::Database(String::new()).error_code(),
            "DATABASE_ERROR"
        );
        assert_eq!(
            AppError::Internal(String::new()).error_code(),
            "INTERNAL_ERROR"
        );
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::Forbidden("not the creditor".into()).to_string(),
            "Access denied: not the creditor"
        );
        assert_eq!(
            AppError::NotFound("expense".into()).to_string(),
            "Not found: expense"
        );
        assert_eq!(
            AppError::Conflict("already deleted".into()).to_string(),
            "Conflict: already deleted"
        );
    }

    #[test]
    fn test_client_error_classification() {
        assert!(AppError::InvalidInput(String::new()).is_client_error());
        assert!(AppError::Forbidden(String::new()).is_client_error());
        assert!(!AppError::Database(String::new()).is_client_error());
        assert!(!AppError::Internal(String::new()).is_client_error());
    }
}
