//! Search criteria and predicate types for dynamic query building.

use serde::{Deserialize, Serialize};

use super::value::Value;

/// A single caller-supplied filter condition: `key operation value`.
///
/// The operation is kept as the raw token so that unrecognized operations
/// can reach the search builder, which ignores them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// The field name to filter on.
    pub key: String,
    /// The operation token (`">"`, `"<"` or `":"`).
    pub operation: String,
    /// The value to compare against.
    pub value: Value,
}

impl SearchCriteria {
    /// Create a new search criterion.
    pub fn new(key: impl Into<String>, operation: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            operation: operation.into(),
            value: value.into(),
        }
    }

    /// Parse the operation token, if it is one of the recognized ones.
    pub fn parsed_operation(&self) -> Option<SearchOperation> {
        SearchOperation::parse(&self.operation)
    }
}

/// The recognized search operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchOperation {
    /// `">"`: greater than or equal, against the textual form of the value.
    AtLeast,
    /// `"<"`: less than or equal, against the textual form of the value.
    AtMost,
    /// `":"`: substring match on textual fields, equality otherwise.
    Matches,
}

impl SearchOperation {
    /// Parse an operation token (case-insensitive).
    pub fn parse(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case(">") {
            Some(Self::AtLeast)
        } else if token.eq_ignore_ascii_case("<") {
            Some(Self::AtMost)
        } else if token.eq_ignore_ascii_case(":") {
            Some(Self::Matches)
        } else {
            None
        }
    }

    /// Return the operation token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AtLeast => ">",
            Self::AtMost => "<",
            Self::Matches => ":",
        }
    }
}

/// Comparison operators supported by [`Predicate::Compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// Exact equality.
    Eq,
    /// Greater than or equal.
    Ge,
    /// Less than or equal.
    Le,
}

impl Comparison {
    /// Return the SQL operator.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ge => ">=",
            Self::Le => "<=",
        }
    }
}

/// A composable filter expression evaluated by the persistence provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Conjunction of all children. Empty means trivially true.
    And(Vec<Predicate>),
    /// Compare a field to a value.
    Compare {
        /// Field name.
        field: String,
        /// Operator.
        op: Comparison,
        /// Bound value.
        value: Value,
    },
    /// SQL `LIKE` pattern match on a field.
    Like {
        /// Field name.
        field: String,
        /// Pattern including wildcards.
        pattern: String,
    },
}

impl Predicate {
    /// The trivially-true conjunction.
    pub fn conjunction() -> Self {
        Self::And(Vec::new())
    }

    /// Combine with another predicate, flattening nested conjunctions.
    pub fn and(self, other: Predicate) -> Self {
        match self {
            Self::And(mut children) => {
                match other {
                    Self::And(more) => children.extend(more),
                    other => children.push(other),
                }
                Self::And(children)
            }
            this => Self::And(vec![this, other]),
        }
    }

    /// Equality on a field.
    pub fn equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::Eq, value)
    }

    /// Greater-than-or-equal on a field.
    pub fn greater_or_equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::Ge, value)
    }

    /// Less-than-or-equal on a field.
    pub fn less_or_equal(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, Comparison::Le, value)
    }

    /// `LIKE` match on a field.
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Like {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    fn compare(field: impl Into<String>, op: Comparison, value: impl Into<Value>) -> Self {
        Self::Compare {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Whether this predicate matches every row.
    pub fn is_trivial(&self) -> bool {
        match self {
            Self::And(children) => children.iter().all(Predicate::is_trivial),
            _ => false,
        }
    }

    /// Field names referenced anywhere in this predicate.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::And(children) => children.iter().flat_map(Predicate::fields).collect(),
            Self::Compare { field, .. } | Self::Like { field, .. } => vec![field.as_str()],
        }
    }
}

impl Default for Predicate {
    fn default() -> Self {
        Self::conjunction()
    }
}

/// A select over one entity type: filter plus optional window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityQuery {
    /// Filter applied to the rows.
    pub predicate: Predicate,
    /// Number of rows to skip.
    pub first_result: Option<i64>,
    /// Maximum number of rows to return.
    pub max_results: Option<i64>,
}

impl EntityQuery {
    /// Select every row.
    pub fn all() -> Self {
        Self::default()
    }

    /// Set the filter.
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.predicate = predicate;
        self
    }

    /// Set the first-result offset.
    pub fn first_result(mut self, offset: i64) -> Self {
        self.first_result = Some(offset);
        self
    }

    /// Set the maximum number of results.
    pub fn max_results(mut self, limit: i64) -> Self {
        self.max_results = Some(limit);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_operations() {
        assert_eq!(SearchOperation::parse(">"), Some(SearchOperation::AtLeast));
        assert_eq!(SearchOperation::parse("<"), Some(SearchOperation::AtMost));
        assert_eq!(SearchOperation::parse(":"), Some(SearchOperation::Matches));
        assert_eq!(SearchOperation::parse("~"), None);
        assert_eq!(SearchOperation::parse(">="), None);
        assert_eq!(SearchOperation::parse(""), None);
    }

    #[test]
    fn test_conjunction_is_trivial() {
        assert!(Predicate::conjunction().is_trivial());
        assert!(!Predicate::conjunction()
            .and(Predicate::equal("age", 3))
            .is_trivial());
    }

    #[test]
    fn test_and_flattens() {
        let p = Predicate::conjunction()
            .and(Predicate::greater_or_equal("age", "18"))
            .and(Predicate::like("name", "%ann%"));
        match &p {
            Predicate::And(children) => assert_eq!(children.len(), 2),
            other => panic!("expected conjunction, got {other:?}"),
        }
        assert_eq!(p.fields(), vec!["age", "name"]);
    }

    #[test]
    fn test_entity_query_builder() {
        let q = EntityQuery::all().first_result(20).max_results(10);
        assert_eq!(q.first_result, Some(20));
        assert_eq!(q.max_results, Some(10));
        assert!(q.predicate.is_trivial());
    }
}
