//! The persistence-context capability consumed by generic services.

use std::collections::HashMap;

use async_trait::async_trait;

use bonekit_core::error::AppError;
use bonekit_core::result::AppResult;
use bonekit_core::types::{EntityQuery, Predicate, Value};
use bonekit_entity::Entity;

/// Transaction-scoped unit of work over a backing store.
///
/// A context tracks which entity instances are managed, queues merges and
/// removals until [`flush`](PersistenceContext::flush), and runs criteria and
/// named queries. Mutating operations require an active transaction.
///
/// One context serves one logical caller at a time; it is not meant to be
/// shared by concurrent requests.
#[async_trait]
pub trait PersistenceContext: Send + Sync + 'static {
    /// Start a transaction.
    async fn begin(&self) -> AppResult<()>;

    /// Flush pending writes and commit the active transaction.
    ///
    /// Managed entities become detached.
    async fn commit(&self) -> AppResult<()>;

    /// Discard pending writes and roll back the active transaction.
    async fn rollback(&self) -> AppResult<()>;

    /// Whether a transaction is active.
    async fn is_transaction_active(&self) -> bool;

    /// Insert a new entity and assign its generated key.
    async fn persist<T: Entity>(&self, entity: &mut T) -> AppResult<()>;

    /// Look up an entity by key. Absence is `Ok(None)`.
    async fn find<T: Entity>(&self, id: i32) -> AppResult<Option<T>>;

    /// Attach an entity's state to the context, queueing an update.
    async fn merge<T: Entity>(&self, entity: &T) -> AppResult<()>;

    /// Queue removal of a managed entity.
    async fn remove<T: Entity>(&self, entity: &T) -> AppResult<()>;

    /// Whether the entity is currently managed by this context.
    async fn contains<T: Entity>(&self, entity: &T) -> bool;

    /// Execute every queued write, in order.
    async fn flush(&self) -> AppResult<()>;

    /// Run a criteria select over entity type `T`.
    async fn list<T: Entity>(&self, query: &EntityQuery) -> AppResult<Vec<T>>;

    /// Count rows of entity type `T` matching a predicate.
    async fn count<T: Entity>(&self, predicate: &Predicate) -> AppResult<i64>;

    /// Run a named query with parameters bound by name.
    async fn named_query<T: Entity>(
        &self,
        name: &str,
        params: &HashMap<String, Value>,
    ) -> AppResult<Vec<T>>;

    /// Run a named query that must yield exactly one row.
    ///
    /// Zero rows is [`ErrorKind::NoResult`](bonekit_core::ErrorKind::NoResult),
    /// more than one is
    /// [`ErrorKind::NonUniqueResult`](bonekit_core::ErrorKind::NonUniqueResult).
    async fn single_result<T: Entity>(
        &self,
        name: &str,
        params: &HashMap<String, Value>,
    ) -> AppResult<T> {
        let mut rows = self.named_query::<T>(name, params).await?;
        match rows.len() {
            0 => Err(AppError::no_result(format!(
                "Named query '{name}' returned no result"
            ))),
            1 => Ok(rows.remove(0)),
            n => Err(AppError::non_unique_result(format!(
                "Named query '{name}' returned {n} results, expected one"
            ))),
        }
    }
}
