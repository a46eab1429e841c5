//! Unified error handling for the ledger.
//!
//! Callers only ever see the closed set of kinds below. Store and driver
//! errors are classified at the boundary and their details are logged,
//! never surfaced.

use domain::DomainError;
use thiserror::Error;

/// Application error kinds.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    // Resource errors
    #[error("Resource not found")]
    NotFound,

    #[error("{0} already exists")]
    Conflict(String),

    // Validation
    #[error("{0}")]
    Validation(String),

    // Store errors
    #[error("Transaction failed: {0}")]
    TransactionFailure(String),

    // Internal
    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::TransactionFailure(_) => "TRANSACTION_FAILURE",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Conflict(msg) => {
                if msg.ends_with("already exists") {
                    msg.clone()
                } else {
                    format!("{} already exists", msg)
                }
            }
            AppError::TransactionFailure(msg) => {
                tracing::error!("Transaction failure: {}", msg);
                "The operation could not be completed".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Whether the failure happened inside the store and was rolled back
    pub fn is_transaction_failure(&self) -> bool {
        matches!(self, AppError::TransactionFailure(_))
    }
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => AppError::Validation(msg),
        }
    }
}

// =============================================================================
// Database Error Conversion
// =============================================================================

#[cfg(feature = "database")]
impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        use sea_orm::{DbErr, SqlErr};

        if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            tracing::debug!("Unique constraint violation: {}", detail);
            return AppError::Conflict(conflicting_entity(&detail).to_string());
        }

        match err {
            // An update whose row vanished after it was read
            DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => AppError::NotFound,
            other => AppError::TransactionFailure(other.to_string()),
        }
    }
}

/// Best-effort mapping from a constraint message to the entity name
#[cfg(feature = "database")]
fn conflicting_entity(detail: &str) -> &'static str {
    if detail.contains("email") {
        "Email"
    } else if detail.contains("account_id") {
        "Account"
    } else {
        "Record"
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> AppResult<T> {
        self.ok_or(AppError::NotFound)
    }
}

/// Convenience constructors
impl AppError {
    pub fn conflict(entity: impl Into<String>) -> Self {
        AppError::Conflict(entity.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn transaction(msg: impl Into<String>) -> Self {
        AppError::TransactionFailure(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_closed_set() {
        let err = AppError::from(DomainError::validation("bad"));
        assert_eq!(err, AppError::Validation("bad".to_string()));
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[cfg(feature = "database")]
    #[test]
    fn vanished_rows_map_to_not_found() {
        use sea_orm::DbErr;

        assert_eq!(AppError::from(DbErr::RecordNotUpdated), AppError::NotFound);
        assert_eq!(
            AppError::from(DbErr::RecordNotFound("users".to_string())),
            AppError::NotFound
        );
        assert!(AppError::from(DbErr::Custom("boom".to_string())).is_transaction_failure());
    }

    #[test]
    fn transaction_failure_hides_details() {
        let err = AppError::transaction("deadlock detected on relation accounts");
        assert_eq!(err.user_message(), "The operation could not be completed");
        assert!(err.is_transaction_failure());
    }

    #[test]
    fn conflict_message_is_not_duplicated() {
        assert_eq!(AppError::conflict("Email").user_message(), "Email already exists");
        assert_eq!(
            AppError::conflict("Email already exists").user_message(),
            "Email already exists"
        );
    }
}
