//! Convenience result type alias for Bonekit.

use crate::error::AppError;

/// A specialized `Result` type for Bonekit operations.
pub type AppResult<T> = Result<T, AppError>;
