//! Translation of search criteria into a criteria predicate.

use tracing::trace;

use bonekit_core::error::AppError;
use bonekit_core::result::AppResult;
use bonekit_core::types::{Predicate, SearchCriteria, SearchOperation, Value};
use bonekit_entity::Entity;

/// Build the conjunction of every recognized criterion.
///
/// Starts from the trivially-true conjunction and ANDs in, per criterion:
/// - `">"`: field `>=` the textual form of the value;
/// - `"<"`: field `<=` the textual form of the value;
/// - `":"`: `LIKE '%value%'` on textual fields, equality otherwise.
///
/// Criteria with any other operation token are skipped.
pub fn build_predicate<T: Entity>(criteria: &[SearchCriteria]) -> AppResult<Predicate> {
    let mut predicate = Predicate::conjunction();

    for criterion in criteria {
        let Some(operation) = criterion.parsed_operation() else {
            trace!(
                key = %criterion.key,
                operation = %criterion.operation,
                "Skipping criterion with unrecognized operation"
            );
            continue;
        };

        let next = match operation {
            SearchOperation::AtLeast => {
                Predicate::greater_or_equal(&criterion.key, textual_bound(criterion)?)
            }
            SearchOperation::AtMost => {
                Predicate::less_or_equal(&criterion.key, textual_bound(criterion)?)
            }
            SearchOperation::Matches => {
                let field = T::field(&criterion.key).ok_or_else(|| {
                    AppError::invalid_argument(format!(
                        "Unknown attribute '{}' on entity table '{}'",
                        criterion.key,
                        T::TABLE
                    ))
                })?;
                if field.kind.is_textual() {
                    Predicate::like(&criterion.key, format!("%{}%", criterion.value))
                } else {
                    Predicate::equal(&criterion.key, criterion.value.clone())
                }
            }
        };
        predicate = predicate.and(next);
    }

    Ok(predicate)
}

/// Range bounds are compared as text.
fn textual_bound(criterion: &SearchCriteria) -> AppResult<Value> {
    if criterion.value.is_null() {
        return Err(AppError::invalid_argument(format!(
            "Criterion on '{}' has no bound value",
            criterion.key
        )));
    }
    Ok(Value::Text(criterion.value.to_string()))
}

#[cfg(test)]
mod tests {
    use bonekit_core::ErrorKind;
    use bonekit_core::types::{Field, Value};
    use bonekit_entity::EntityBone;
    use sqlx::FromRow;

    use super::*;

    #[derive(Debug, FromRow)]
    struct Member {
        #[sqlx(flatten)]
        bone: EntityBone,
        name: String,
        age: i64,
    }

    impl Entity for Member {
        const TABLE: &'static str = "members";

        fn fields() -> &'static [Field] {
            const FIELDS: &[Field] = &[Field::text("name"), Field::integer("age")];
            FIELDS
        }

        fn bone(&self) -> &EntityBone {
            &self.bone
        }

        fn bone_mut(&mut self) -> &mut EntityBone {
            &mut self.bone
        }

        fn values(&self) -> Vec<Value> {
            vec![Value::from(self.name.as_str()), Value::from(self.age)]
        }
    }

    #[test]
    fn test_empty_criteria_is_trivial() {
        assert!(build_predicate::<Member>(&[]).unwrap().is_trivial());
    }

    #[test]
    fn test_range_bounds_are_textual() {
        let p = build_predicate::<Member>(&[
            SearchCriteria::new("age", ">", 18),
            SearchCriteria::new("age", "<", 65),
        ])
        .unwrap();
        assert_eq!(
            p,
            Predicate::And(vec![
                Predicate::greater_or_equal("age", "18"),
                Predicate::less_or_equal("age", "65"),
            ])
        );
    }

    #[test]
    fn test_match_depends_on_field_kind() {
        let p = build_predicate::<Member>(&[
            SearchCriteria::new("name", ":", "ann"),
            SearchCriteria::new("age", ":", 30),
        ])
        .unwrap();
        assert_eq!(
            p,
            Predicate::And(vec![
                Predicate::like("name", "%ann%"),
                Predicate::equal("age", 30),
            ])
        );
    }

    #[test]
    fn test_unrecognized_operation_is_ignored() {
        let p = build_predicate::<Member>(&[
            SearchCriteria::new("x", "~", 1),
            SearchCriteria::new("age", ">=", 1),
        ])
        .unwrap();
        assert!(p.is_trivial());
    }

    #[test]
    fn test_match_on_unknown_field_is_invalid_argument() {
        let err = build_predicate::<Member>(&[SearchCriteria::new("salary", ":", 1)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_null_range_bound_is_invalid_argument() {
        let err =
            build_predicate::<Member>(&[SearchCriteria::new("age", ">", Value::Null)]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }
}
