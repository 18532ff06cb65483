//! SQLite-backed persistence context.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use sqlx::sqlite::SqliteQueryResult;
use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool, Transaction};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use bonekit_core::error::{AppError, ErrorKind};
use bonekit_core::result::AppResult;
use bonekit_core::types::{EntityQuery, Predicate, Value};
use bonekit_entity::{Entity, EntityKey};

use crate::context::PersistenceContext;
use crate::named::{self, NamedQueryRegistry};
use crate::query::{self, push_value};

/// A write queued by `merge` or `remove`, executed at flush.
#[derive(Debug)]
enum PendingWrite {
    Update {
        key: EntityKey,
        table: &'static str,
        id_column: &'static str,
        columns: Vec<&'static str>,
        values: Vec<Value>,
    },
    Delete {
        key: EntityKey,
        table: &'static str,
        id_column: &'static str,
    },
}

impl PendingWrite {
    fn key(&self) -> EntityKey {
        match self {
            Self::Update { key, .. } | Self::Delete { key, .. } => *key,
        }
    }

    fn statement(&self) -> QueryBuilder<'static, Sqlite> {
        match self {
            Self::Update {
                key,
                table,
                id_column,
                columns,
                values,
            } => {
                let mut qb = QueryBuilder::new("UPDATE ");
                qb.push(*table).push(" SET ");
                if columns.is_empty() {
                    qb.push(*id_column).push(" = ").push(*id_column);
                }
                for (i, (column, value)) in columns.iter().zip(values).enumerate() {
                    if i > 0 {
                        qb.push(", ");
                    }
                    qb.push(*column).push(" = ");
                    push_value(&mut qb, value);
                }
                qb.push(" WHERE ").push(*id_column).push(" = ");
                qb.push_bind(key.id());
                qb
            }
            Self::Delete {
                key,
                table,
                id_column,
            } => {
                let mut qb = QueryBuilder::new("DELETE FROM ");
                qb.push(*table)
                    .push(" WHERE ")
                    .push(*id_column)
                    .push(" = ");
                qb.push_bind(key.id());
                qb
            }
        }
    }
}

/// Transaction-scoped persistence context over a SQLite pool.
///
/// Reads outside a transaction run directly on the pool and return
/// detached entities. Inside a transaction every statement runs on the
/// transaction's connection and loaded or written entities are managed
/// until commit or rollback.
pub struct SqlContext {
    pool: SqlitePool,
    tx: Mutex<Option<Transaction<'static, Sqlite>>>,
    managed: Mutex<HashSet<EntityKey>>,
    pending: Mutex<Vec<PendingWrite>>,
    named_queries: NamedQueryRegistry,
}

impl SqlContext {
    /// Create a context over a pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            tx: Mutex::new(None),
            managed: Mutex::new(HashSet::new()),
            pending: Mutex::new(Vec::new()),
            named_queries: NamedQueryRegistry::new(),
        }
    }

    /// Use the given named-query registry.
    pub fn with_named_queries(mut self, registry: impl Into<NamedQueryRegistry>) -> Self {
        self.named_queries = registry.into();
        self
    }

    /// Register one named query.
    pub fn register_named_query(&mut self, name: impl Into<String>, sql: impl Into<String>) {
        self.named_queries.register(name, sql);
    }

    /// The underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Compile every registered named query against the database.
    ///
    /// Returns the number of queries checked, or the first one that refers
    /// to a missing table or column or is not valid SQL.
    pub async fn verify_named_queries(&self) -> AppResult<usize> {
        for (name, sql) in self.named_queries.iter() {
            let statement = named::positional(sql);
            self.pool.prepare(statement.as_str()).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::InvalidArgument,
                    format!("Named query '{name}' does not compile: {e}"),
                    e,
                )
            })?;
            debug!(query = name, "Verified named query");
        }
        Ok(self.named_queries.len())
    }

    /// Number of writes waiting for the next flush.
    pub async fn pending_writes(&self) -> usize {
        self.pending.lock().await.len()
    }

    async fn require_transaction(&self, operation: &str) -> AppResult<()> {
        if self.tx.lock().await.is_some() {
            Ok(())
        } else {
            Err(AppError::transaction_required(format!(
                "{operation} requires an active transaction"
            )))
        }
    }

    async fn manage(&self, key: EntityKey) {
        if self.tx.lock().await.is_some() {
            self.managed.lock().await.insert(key);
        }
    }

    /// Put writes back at the front of the queue, ahead of anything queued
    /// since they were taken.
    async fn requeue(&self, mut writes: Vec<PendingWrite>) {
        let mut pending = self.pending.lock().await;
        writes.append(&mut *pending);
        *pending = writes;
    }

    async fn detach_all(&self) {
        self.managed.lock().await.clear();
        self.pending.lock().await.clear();
    }

    async fn execute(&self, mut qb: QueryBuilder<'_, Sqlite>) -> AppResult<SqliteQueryResult> {
        let mut tx = self.tx.lock().await;
        let result = match tx.as_mut() {
            Some(tx) => qb.build().execute(&mut **tx).await?,
            None => qb.build().execute(&self.pool).await?,
        };
        Ok(result)
    }

    async fn fetch_all<T: Entity>(&self, mut qb: QueryBuilder<'_, Sqlite>) -> AppResult<Vec<T>> {
        let mut tx = self.tx.lock().await;
        let rows = match tx.as_mut() {
            Some(tx) => qb.build_query_as::<T>().fetch_all(&mut **tx).await?,
            None => qb.build_query_as::<T>().fetch_all(&self.pool).await?,
        };
        Ok(rows)
    }

    async fn fetch_optional<T: Entity>(
        &self,
        mut qb: QueryBuilder<'_, Sqlite>,
    ) -> AppResult<Option<T>> {
        let mut tx = self.tx.lock().await;
        let row = match tx.as_mut() {
            Some(tx) => qb.build_query_as::<T>().fetch_optional(&mut **tx).await?,
            None => qb.build_query_as::<T>().fetch_optional(&self.pool).await?,
        };
        Ok(row)
    }

    async fn fetch_scalar(&self, mut qb: QueryBuilder<'_, Sqlite>) -> AppResult<i64> {
        let mut tx = self.tx.lock().await;
        let value = match tx.as_mut() {
            Some(tx) => qb.build_query_scalar::<i64>().fetch_one(&mut **tx).await?,
            None => qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?,
        };
        Ok(value)
    }

    fn insert_statement<'a, T: Entity>(entity: &T) -> QueryBuilder<'a, Sqlite> {
        let fields = T::fields();
        let values = entity.values();
        let mut qb = QueryBuilder::new("INSERT INTO ");
        qb.push(T::TABLE);

        if fields.is_empty() && entity.id().is_none() {
            qb.push(" DEFAULT VALUES");
            return qb;
        }

        let mut columns: Vec<&str> = Vec::with_capacity(fields.len() + 1);
        if entity.id().is_some() {
            columns.push(T::ID_COLUMN);
        }
        columns.extend(fields.iter().map(|f| f.name));
        qb.push(" (").push(columns.join(", ")).push(") VALUES (");

        let mut separated = false;
        if let Some(id) = entity.id() {
            qb.push_bind(id);
            separated = true;
        }
        for value in &values {
            if separated {
                qb.push(", ");
            }
            push_value(&mut qb, value);
            separated = true;
        }
        qb.push(")");
        qb
    }
}

#[async_trait]
impl PersistenceContext for SqlContext {
    async fn begin(&self) -> AppResult<()> {
        let mut tx = self.tx.lock().await;
        if tx.is_some() {
            return Err(AppError::invalid_state("A transaction is already active"));
        }
        *tx = Some(self.pool.begin().await?);
        debug!("Transaction started");
        Ok(())
    }

    async fn commit(&self) -> AppResult<()> {
        self.flush().await?;
        let tx = self
            .tx
            .lock()
            .await
            .take()
            .ok_or_else(|| AppError::invalid_state("No active transaction to commit"))?;
        tx.commit().await?;
        self.detach_all().await;
        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(&self) -> AppResult<()> {
        let tx = self
            .tx
            .lock()
            .await
            .take()
            .ok_or_else(|| AppError::invalid_state("No active transaction to roll back"))?;
        self.detach_all().await;
        tx.rollback().await?;
        debug!("Transaction rolled back");
        Ok(())
    }

    async fn is_transaction_active(&self) -> bool {
        self.tx.lock().await.is_some()
    }

    async fn persist<T: Entity>(&self, entity: &mut T) -> AppResult<()> {
        self.require_transaction("persist").await?;

        if let Some(key) = entity.key() {
            if self.managed.lock().await.contains(&key) {
                return Err(AppError::already_exists(format!(
                    "Entity {key} is already managed"
                )));
            }
        }

        let result = self.execute(Self::insert_statement(entity)).await?;
        if entity.id().is_none() {
            let id = i32::try_from(result.last_insert_rowid()).map_err(|_| {
                AppError::invalid_state(format!(
                    "Generated key {} does not fit an integer id",
                    result.last_insert_rowid()
                ))
            })?;
            entity.bone_mut().set_id(id);
        }

        if let Some(key) = entity.key() {
            debug!(table = T::TABLE, id = key.id(), "Persisted entity");
            self.manage(key).await;
        }
        Ok(())
    }

    async fn find<T: Entity>(&self, id: i32) -> AppResult<Option<T>> {
        let query = EntityQuery::all().filter(Predicate::equal(T::ID_COLUMN, id));
        let found = self.fetch_optional::<T>(query::select::<T>(&query)?).await?;
        debug!(table = T::TABLE, id, found = found.is_some(), "Find by key");
        if let Some(key) = found.as_ref().and_then(Entity::key) {
            self.manage(key).await;
        }
        Ok(found)
    }

    async fn merge<T: Entity>(&self, entity: &T) -> AppResult<()> {
        self.require_transaction("merge").await?;
        let key = entity
            .key()
            .ok_or_else(|| AppError::invalid_argument("Cannot merge an entity without an id"))?;

        self.pending.lock().await.push(PendingWrite::Update {
            key,
            table: T::TABLE,
            id_column: T::ID_COLUMN,
            columns: T::fields().iter().map(|f| f.name).collect(),
            values: entity.values(),
        });
        self.managed.lock().await.insert(key);
        debug!(table = T::TABLE, id = key.id(), "Merged entity");
        Ok(())
    }

    async fn remove<T: Entity>(&self, entity: &T) -> AppResult<()> {
        self.require_transaction("remove").await?;
        let key = entity
            .key()
            .ok_or_else(|| AppError::invalid_argument("Cannot remove an entity without an id"))?;

        if !self.managed.lock().await.remove(&key) {
            return Err(AppError::invalid_argument(format!(
                "Entity {key} is detached; merge it before removing"
            )));
        }
        self.pending.lock().await.push(PendingWrite::Delete {
            key,
            table: T::TABLE,
            id_column: T::ID_COLUMN,
        });
        debug!(table = T::TABLE, id = key.id(), "Removed entity");
        Ok(())
    }

    async fn contains<T: Entity>(&self, entity: &T) -> bool {
        match entity.key() {
            Some(key) => self.managed.lock().await.contains(&key),
            None => false,
        }
    }

    async fn flush(&self) -> AppResult<()> {
        let mut writes = std::mem::take(&mut *self.pending.lock().await);
        if writes.is_empty() {
            return Ok(());
        }
        if let Err(e) = self.require_transaction("flush").await {
            self.requeue(writes).await;
            return Err(e);
        }

        let mut failure = None;
        for (index, write) in writes.iter().enumerate() {
            match self.execute(write.statement()).await {
                Ok(result) if result.rows_affected() == 0 => {
                    let e = AppError::not_found(format!("Entity {} no longer exists", write.key()));
                    failure = Some((index, e));
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    failure = Some((index, e));
                    break;
                }
            }
        }

        let Some((index, e)) = failure else {
            debug!(writes = writes.len(), "Flushed pending writes");
            return Ok(());
        };
        let remaining = writes.split_off(index + 1);
        let failed = writes[index].key();
        self.managed.lock().await.remove(&failed);
        warn!(
            entity = %failed,
            executed = index,
            requeued = remaining.len(),
            "Flush stopped at a failing write"
        );
        self.requeue(remaining).await;
        Err(e)
    }

    async fn list<T: Entity>(&self, query: &EntityQuery) -> AppResult<Vec<T>> {
        let rows = self.fetch_all::<T>(query::select::<T>(query)?).await?;
        debug!(
            table = T::TABLE,
            first_result = query.first_result,
            max_results = query.max_results,
            rows = rows.len(),
            "Listed entities"
        );
        for key in rows.iter().filter_map(Entity::key) {
            self.manage(key).await;
        }
        Ok(rows)
    }

    async fn count<T: Entity>(&self, predicate: &Predicate) -> AppResult<i64> {
        self.fetch_scalar(query::count::<T>(predicate)?).await
    }

    async fn named_query<T: Entity>(
        &self,
        name: &str,
        params: &HashMap<String, Value>,
    ) -> AppResult<Vec<T>> {
        let sql = self.named_queries.resolve::<T>(name)?;
        let rows = self.fetch_all::<T>(named::bind(&sql, params)?).await?;
        debug!(query = name, rows = rows.len(), "Executed named query");
        for key in rows.iter().filter_map(Entity::key) {
            self.manage(key).await;
        }
        Ok(rows)
    }
}

impl std::fmt::Debug for SqlContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlContext")
            .field("pool", &self.pool)
            .field("named_queries", &self.named_queries.len())
            .finish_non_exhaustive()
    }
}
