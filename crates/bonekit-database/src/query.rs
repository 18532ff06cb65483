//! SQL rendering of entity queries and criteria predicates.
//!
//! Field names are resolved against the entity's field registry before
//! they reach the SQL text; values are always bound parameters.

use sqlx::{QueryBuilder, Sqlite};

use bonekit_core::error::AppError;
use bonekit_core::result::AppResult;
use bonekit_core::types::{EntityQuery, Predicate, Value};
use bonekit_entity::Entity;

/// Build `SELECT * FROM <table> WHERE <predicate> ORDER BY <id>` plus the
/// optional window.
///
/// SQLite treats a negative `OFFSET` as zero and a negative `LIMIT` as no
/// limit; the window values are passed through unchanged.
pub fn select<'a, T: Entity>(query: &EntityQuery) -> AppResult<QueryBuilder<'a, Sqlite>> {
    let mut qb = QueryBuilder::new("SELECT * FROM ");
    qb.push(T::TABLE).push(" WHERE ");
    push_predicate::<T>(&mut qb, &query.predicate)?;
    qb.push(" ORDER BY ").push(T::ID_COLUMN).push(" ASC");

    match (query.max_results, query.first_result) {
        (Some(limit), offset) => {
            qb.push(" LIMIT ").push_bind(limit);
            if let Some(offset) = offset {
                qb.push(" OFFSET ").push_bind(offset);
            }
        }
        (None, Some(offset)) => {
            qb.push(" LIMIT -1 OFFSET ").push_bind(offset);
        }
        (None, None) => {}
    }
    Ok(qb)
}

/// Build `SELECT COUNT(*) FROM <table> WHERE <predicate>`.
pub fn count<'a, T: Entity>(predicate: &Predicate) -> AppResult<QueryBuilder<'a, Sqlite>> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM ");
    qb.push(T::TABLE).push(" WHERE ");
    push_predicate::<T>(&mut qb, predicate)?;
    Ok(qb)
}

/// Append a predicate to the builder.
pub fn push_predicate<T: Entity>(
    qb: &mut QueryBuilder<'_, Sqlite>,
    predicate: &Predicate,
) -> AppResult<()> {
    match predicate {
        Predicate::And(children) if children.is_empty() => {
            qb.push("1 = 1");
        }
        Predicate::And(children) => {
            qb.push("(");
            for (i, child) in children.iter().enumerate() {
                if i > 0 {
                    qb.push(" AND ");
                }
                push_predicate::<T>(qb, child)?;
            }
            qb.push(")");
        }
        Predicate::Compare { field, op, value } => {
            qb.push(column::<T>(field)?)
                .push(" ")
                .push(op.as_sql())
                .push(" ");
            push_value(qb, value);
        }
        Predicate::Like { field, pattern } => {
            qb.push(column::<T>(field)?).push(" LIKE ");
            qb.push_bind(pattern.clone());
        }
    }
    Ok(())
}

/// Bind a dynamic value as the next parameter.
pub fn push_value(qb: &mut QueryBuilder<'_, Sqlite>, value: &Value) {
    match value {
        Value::Bool(b) => qb.push_bind(*b),
        Value::Integer(i) => qb.push_bind(*i),
        Value::Real(r) => qb.push_bind(*r),
        Value::Text(s) => qb.push_bind(s.clone()),
        Value::Null => qb.push_bind(None::<String>),
    };
}

/// Resolve a field name to its registered column name.
fn column<T: Entity>(name: &str) -> AppResult<&'static str> {
    T::field(name).map(|f| f.name).ok_or_else(|| {
        AppError::invalid_argument(format!(
            "Unknown attribute '{name}' on entity table '{}'",
            T::TABLE
        ))
    })
}

#[cfg(test)]
mod tests {
    use bonekit_core::ErrorKind;

    use super::*;
    use crate::fixtures::Person;

    #[test]
    fn test_select_all() {
        let qb = select::<Person>(&EntityQuery::all()).unwrap();
        assert_eq!(qb.sql(), "SELECT * FROM persons WHERE 1 = 1 ORDER BY id ASC");
    }

    #[test]
    fn test_select_with_filter_and_window() {
        let query = EntityQuery::all()
            .filter(
                Predicate::conjunction()
                    .and(Predicate::greater_or_equal("age", "18"))
                    .and(Predicate::like("name", "%ann%")),
            )
            .first_result(20)
            .max_results(10);
        let qb = select::<Person>(&query).unwrap();
        assert_eq!(
            qb.sql(),
            "SELECT * FROM persons WHERE (age >= ? AND name LIKE ?) ORDER BY id ASC LIMIT ? OFFSET ?"
        );
    }

    #[test]
    fn test_offset_without_limit() {
        let qb = select::<Person>(&EntityQuery::all().first_result(5)).unwrap();
        assert!(qb.sql().ends_with("LIMIT -1 OFFSET ?"));
    }

    #[test]
    fn test_count() {
        let qb = count::<Person>(&Predicate::equal("id", 3)).unwrap();
        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM persons WHERE id = ?");
    }

    #[test]
    fn test_unknown_field_is_invalid_argument() {
        let query = EntityQuery::all().filter(Predicate::equal("salary; --", 1));
        let Err(err) = select::<Person>(&query) else {
            panic!("unknown field was rendered");
        };
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }
}
