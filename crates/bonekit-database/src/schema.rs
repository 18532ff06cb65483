//! Table definitions derived from an entity's field registry.

use sqlx::SqlitePool;
use tracing::debug;

use bonekit_core::result::AppResult;
use bonekit_entity::Entity;

/// Render `CREATE TABLE IF NOT EXISTS` for entity type `T`.
///
/// The key column is an auto-generated integer primary key; every other
/// registered field becomes a nullable column of its declared kind.
pub fn create_table_sql<T: Entity>() -> String {
    let mut columns = vec![format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", T::ID_COLUMN)];
    columns.extend(
        T::fields()
            .iter()
            .map(|f| format!("{} {}", f.name, f.kind.as_sql())),
    );
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        T::TABLE,
        columns.join(", ")
    )
}

/// Create the backing table for entity type `T` if it is missing.
pub async fn create_table<T: Entity>(pool: &SqlitePool) -> AppResult<()> {
    let sql = create_table_sql::<T>();
    debug!(table = T::TABLE, "Ensuring entity table");
    sqlx::query(&sql).execute(pool).await?;
    Ok(())
}
