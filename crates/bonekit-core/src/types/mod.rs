//! Core type definitions used across the Bonekit workspace.

pub mod criteria;
pub mod pagination;
pub mod value;

pub use criteria::{Comparison, EntityQuery, Predicate, SearchCriteria, SearchOperation};
pub use pagination::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PageRequest, PageResponse};
pub use value::{Field, FieldKind, Value};
