//! Unified error type for the data access layer.

use std::fmt::Debug;
use thiserror::Error;

/// SQLSTATE for unique constraint violations.
const PG_UNIQUE_VIOLATION: &str = "23505";
/// SQLSTATE for foreign key violations.
const PG_FOREIGN_KEY_VIOLATION: &str = "23503";
/// SQLSTATE raised when `lock_timeout` expires.
const PG_LOCK_NOT_AVAILABLE: &str = "55P03";
/// SQLSTATE raised when a statement is cancelled (e.g. `statement_timeout`).
const PG_QUERY_CANCELED: &str = "57014";

/// Error type returned by every DAO call.
///
/// `NotFound` is the sentinel callers match on when a row does not exist
/// (or exists only as a soft-deleted row).
#[derive(Error, Debug)]
pub enum BmmError {
    /// Row does not exist
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    /// Caller supplied a combination of parameters that cannot be honoured
    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    /// Input failed field validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflict error (e.g., duplicate key)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Order-by field is not sortable for the entity
    #[error("Invalid order by field: {field}")]
    InvalidOrderBy { field: String },

    /// Batch insert exceeded the permitted item count
    #[error("Batch of {size} items exceeds the maximum of {max}")]
    BatchTooLarge { size: usize, max: usize },

    /// Non-blocking transaction advisory lock was held by someone else
    #[error("Failed to acquire transaction advisory lock {lock_id}")]
    AdvisoryLockFailed { lock_id: i64 },

    /// Lock wait or statement timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Generic error wrapper
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BmmError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::InvalidParams(_) => "INVALID_PARAMS",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::InvalidOrderBy { .. } => "INVALID_ORDER_BY",
            Self::BatchTooLarge { .. } => "BATCH_TOO_LARGE",
            Self::AdvisoryLockFailed { .. } => "ADVISORY_LOCK_FAILED",
            Self::Timeout(_) => "TIMEOUT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) | Self::Other(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates a not found error for a resource.
    #[must_use]
    pub fn not_found<T: ToString>(resource_type: &'static str, id: T) -> Self {
        Self::NotFound {
            resource_type,
            id: id.to_string(),
        }
    }

    /// Creates an invalid parameters error.
    #[must_use]
    pub fn invalid_params<T: Into<String>>(message: T) -> Self {
        Self::InvalidParams(message.into())
    }

    /// Creates a validation error.
    #[must_use]
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a conflict error.
    #[must_use]
    pub fn conflict<T: Into<String>>(message: T) -> Self {
        Self::Conflict(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true for the not-found sentinel.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Replaces the generic `database_row` resource of a not-found error
    /// with the concrete resource and id.
    #[must_use]
    pub fn or_not_found<T: ToString>(self, resource_type: &'static str, id: T) -> Self {
        match self {
            Self::NotFound { .. } => Self::not_found(resource_type, id),
            other => other,
        }
    }

    /// Checks if this error is retriable.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Timeout(_) | Self::AdvisoryLockFailed { .. }
        )
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for BmmError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => Self::NotFound {
                resource_type: "database_row",
                id: "unknown".to_string(),
            },
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some(PG_UNIQUE_VIOLATION) => Self::Conflict(db_err.message().to_string()),
                Some(PG_FOREIGN_KEY_VIOLATION) => {
                    Self::InvalidParams(db_err.message().to_string())
                }
                Some(PG_LOCK_NOT_AVAILABLE | PG_QUERY_CANCELED) => {
                    Self::Timeout(db_err.message().to_string())
                }
                _ => Self::Database(err.to_string()),
            },
            sqlx::Error::PoolTimedOut => Self::Timeout(err.to_string()),
            _ => Self::Database(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for BmmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON serialization error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(BmmError::not_found("IPBlock", 1).error_code(), "NOT_FOUND");
        assert_eq!(BmmError::invalid_params("bad").error_code(), "INVALID_PARAMS");
        assert_eq!(BmmError::validation("bad input").error_code(), "VALIDATION_ERROR");
        assert_eq!(BmmError::conflict("duplicate").error_code(), "CONFLICT");
        assert_eq!(
            BmmError::InvalidOrderBy { field: "x".to_string() }.error_code(),
            "INVALID_ORDER_BY"
        );
        assert_eq!(
            BmmError::BatchTooLarge { size: 101, max: 100 }.error_code(),
            "BATCH_TOO_LARGE"
        );
        assert_eq!(
            BmmError::AdvisoryLockFailed { lock_id: 7 }.error_code(),
            "ADVISORY_LOCK_FAILED"
        );
        assert_eq!(BmmError::Database("db".to_string()).error_code(), "DATABASE_ERROR");
        assert_eq!(BmmError::internal("err").error_code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_retriable_errors() {
        assert!(BmmError::Database("connection lost".to_string()).is_retriable());
        assert!(BmmError::Timeout("lock timeout".to_string()).is_retriable());
        assert!(BmmError::AdvisoryLockFailed { lock_id: 1 }.is_retriable());
        assert!(!BmmError::not_found("Site", 1).is_retriable());
        assert!(!BmmError::validation("bad input").is_retriable());
        assert!(!BmmError::conflict("dup").is_retriable());
    }

    #[test]
    fn test_not_found_sentinel() {
        assert!(BmmError::not_found("Fabric", "fab-1").is_not_found());
        assert!(!BmmError::internal("boom").is_not_found());
    }

    #[cfg(feature = "sqlx")]
    #[test]
    fn test_or_not_found_rewrites_generic_row_error() {
        let err = BmmError::from(sqlx::Error::RowNotFound).or_not_found("Sku", "sku-1");
        match err {
            BmmError::NotFound { resource_type, id } => {
                assert_eq!(resource_type, "Sku");
                assert_eq!(id, "sku-1");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let untouched = BmmError::conflict("dup").or_not_found("Sku", "sku-1");
        assert!(matches!(untouched, BmmError::Conflict(_)));
    }

    #[cfg(feature = "sqlx")]
    #[test]
    fn test_pool_timeout_maps_to_timeout() {
        let err = BmmError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, BmmError::Timeout(_)));
    }

    #[test]
    fn test_error_display() {
        let err = BmmError::not_found("TenantAccount", "abc");
        assert!(err.to_string().contains("TenantAccount"));
        assert!(err.to_string().contains("abc"));

        let err = BmmError::BatchTooLarge { size: 150, max: 100 };
        assert!(err.to_string().contains("150"));
    }
}
