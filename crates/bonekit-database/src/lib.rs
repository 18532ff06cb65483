//! # bonekit-database
//!
//! SQLite connection management and the persistence context that generic
//! services delegate to: entity lifecycle (persist, find, merge, remove,
//! flush), criteria queries, named queries, and schema helpers.

pub mod connection;
pub mod context;
pub mod migration;
pub mod named;
pub mod query;
pub mod schema;
pub mod sql_context;

#[cfg(test)]
pub(crate) mod fixtures;

pub use connection::DatabasePool;
pub use context::PersistenceContext;
pub use named::NamedQueryRegistry;
pub use sql_context::SqlContext;
