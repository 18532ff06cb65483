//! Outcome of a single-result named query.

use bonekit_core::error::{AppError, ErrorKind};

/// What a single-result lookup produced.
#[derive(Debug)]
pub enum SingleResult<T> {
    /// Exactly one row matched.
    Found(T),
    /// No row matched.
    Empty,
    /// More than one row matched.
    NonUnique,
    /// The query could not be run.
    Failed(AppError),
}

impl<T> SingleResult<T> {
    /// Classify the outcome of a single-result query.
    pub fn from_result(result: Result<T, AppError>) -> Self {
        match result {
            Ok(value) => Self::Found(value),
            Err(e) if e.is(ErrorKind::NoResult) => Self::Empty,
            Err(e) if e.is(ErrorKind::NonUniqueResult) => Self::NonUnique,
            Err(e) => Self::Failed(e),
        }
    }

    /// The found value, discarding why there is none.
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            _ => None,
        }
    }

    /// Whether a value was found.
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }
}
