//! Unified application error types for Bonekit.
//!
//! Persistence-provider failures are mapped into [`AppError`] so that
//! callers can tell an identity conflict from a missing transaction or a
//! malformed argument through [`ErrorKind`].

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested record was not found.
    NotFound,
    /// A record with a conflicting identity already exists.
    AlreadyExists,
    /// The persistence context or entity is not in a usable state.
    InvalidState,
    /// An argument (key, field name, parameter) was malformed or unknown.
    InvalidArgument,
    /// A mutating operation was invoked outside a transaction.
    TransactionRequired,
    /// A single-result query produced no row.
    NoResult,
    /// A single-result query produced more than one row.
    NonUniqueResult,
    /// Any other failure reported by the persistence provider.
    Persistence,
    /// A configuration error occurred.
    Configuration,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::AlreadyExists => write!(f, "ALREADY_EXISTS"),
            Self::InvalidState => write!(f, "INVALID_STATE"),
            Self::InvalidArgument => write!(f, "INVALID_ARGUMENT"),
            Self::TransactionRequired => write!(f, "TRANSACTION_REQUIRED"),
            Self::NoResult => write!(f, "NO_RESULT"),
            Self::NonUniqueResult => write!(f, "NON_UNIQUE_RESULT"),
            Self::Persistence => write!(f, "PERSISTENCE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
        }
    }
}

/// The unified application error used throughout Bonekit.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create an identity-conflict error.
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::AlreadyExists, message)
    }

    /// Create an invalid-state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidState, message)
    }

    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }

    /// Create a transaction-required error.
    pub fn transaction_required(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::TransactionRequired, message)
    }

    /// Create a no-result error.
    pub fn no_result(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NoResult, message)
    }

    /// Create a non-unique-result error.
    pub fn non_unique_result(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NonUniqueResult, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Check whether this error has the given kind.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}

#[cfg(feature = "sqlx")]
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        let kind = match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                ErrorKind::AlreadyExists
            }
            sqlx::Error::RowNotFound => ErrorKind::NoResult,
            sqlx::Error::ColumnNotFound(_) | sqlx::Error::ColumnIndexOutOfBounds { .. } => {
                ErrorKind::InvalidArgument
            }
            sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut | sqlx::Error::WorkerCrashed => {
                ErrorKind::InvalidState
            }
            _ => ErrorKind::Persistence,
        };
        Self::with_source(kind, format!("Database error: {err}"), err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_kind_and_message() {
        let err = AppError::transaction_required("persist needs a transaction");
        assert_eq!(
            err.to_string(),
            "TRANSACTION_REQUIRED: persist needs a transaction"
        );
    }

    #[test]
    fn test_clone_drops_source() {
        let io = std::io::Error::other("disk gone");
        let err = AppError::with_source(ErrorKind::Persistence, "write failed", io);
        assert!(err.source.is_some());
        let cloned = err.clone();
        assert_eq!(cloned.kind, ErrorKind::Persistence);
        assert!(cloned.source.is_none());
    }

    #[test]
    fn test_is_kind() {
        assert!(AppError::no_result("empty").is(ErrorKind::NoResult));
        assert!(!AppError::no_result("empty").is(ErrorKind::NonUniqueResult));
    }
}
