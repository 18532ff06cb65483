//! Named queries: registry and `:name` parameter binding.

use std::collections::{BTreeSet, HashMap};

use sqlx::{QueryBuilder, Sqlite};

use bonekit_core::error::AppError;
use bonekit_core::result::AppResult;
use bonekit_core::types::Value;
use bonekit_entity::Entity;

use crate::query::push_value;

/// Query text registered by name.
///
/// Lookups consult explicitly registered queries first and then the
/// queries declared by the entity type being queried.
#[derive(Debug, Clone, Default)]
pub struct NamedQueryRegistry {
    queries: HashMap<String, String>,
}

impl NamedQueryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) a query.
    pub fn register(&mut self, name: impl Into<String>, sql: impl Into<String>) {
        self.queries.insert(name.into(), sql.into());
    }

    /// Number of explicitly registered queries.
    pub fn len(&self) -> usize {
        self.queries.len()
    }

    /// Whether no query has been registered explicitly.
    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Explicitly registered queries as `(name, sql)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.queries
            .iter()
            .map(|(name, sql)| (name.as_str(), sql.as_str()))
    }

    /// Resolve a query name for entity type `T`.
    pub fn resolve<T: Entity>(&self, name: &str) -> AppResult<String> {
        if let Some(sql) = self.queries.get(name) {
            return Ok(sql.clone());
        }
        T::named_queries()
            .iter()
            .find(|q| q.name == name)
            .map(|q| q.sql.to_string())
            .ok_or_else(|| AppError::invalid_argument(format!("No named query '{name}' found")))
    }
}

impl From<HashMap<String, String>> for NamedQueryRegistry {
    fn from(queries: HashMap<String, String>) -> Self {
        Self { queries }
    }
}

/// A piece of named-query text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Literal SQL.
    Sql(String),
    /// A `:name` placeholder.
    Param(String),
}

/// Split query text into literal SQL and `:name` placeholders.
///
/// Colons inside single-quoted literals and `::` sequences are left alone.
pub fn parse(sql: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut in_quote = false;
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\'' {
            in_quote = !in_quote;
            literal.push(c);
            continue;
        }
        if c == ':' && !in_quote {
            if chars.peek() == Some(&':') {
                literal.push(c);
                if let Some(next) = chars.next() {
                    literal.push(next);
                }
                continue;
            }
            if chars.peek().is_some_and(|n| n.is_ascii_alphabetic() || *n == '_') {
                let mut name = String::new();
                while let Some(&n) = chars.peek() {
                    if n.is_ascii_alphanumeric() || n == '_' {
                        name.push(n);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if !literal.is_empty() {
                    segments.push(Segment::Sql(std::mem::take(&mut literal)));
                }
                segments.push(Segment::Param(name));
                continue;
            }
        }
        literal.push(c);
    }
    if !literal.is_empty() {
        segments.push(Segment::Sql(literal));
    }
    segments
}

/// Rewrite every `:name` placeholder as a positional `?`.
pub fn positional(sql: &str) -> String {
    parse(sql)
        .into_iter()
        .map(|segment| match segment {
            Segment::Sql(text) => text,
            Segment::Param(_) => "?".to_string(),
        })
        .collect()
}

/// Build an executable query, binding every placeholder by name.
///
/// Every placeholder must have a value and every supplied value must match a
/// placeholder.
pub fn bind<'a>(sql: &str, params: &HashMap<String, Value>) -> AppResult<QueryBuilder<'a, Sqlite>> {
    let segments = parse(sql);
    let placeholders: BTreeSet<&str> = segments
        .iter()
        .filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_str()),
            Segment::Sql(_) => None,
        })
        .collect();

    if let Some(unknown) = params
        .keys()
        .find(|k| !placeholders.contains(k.as_str()))
    {
        return Err(AppError::invalid_argument(format!(
            "Query has no parameter named '{unknown}'"
        )));
    }

    let mut qb = QueryBuilder::new("");
    for segment in &segments {
        match segment {
            Segment::Sql(text) => {
                qb.push(text);
            }
            Segment::Param(name) => {
                let value = params.get(name).ok_or_else(|| {
                    AppError::invalid_argument(format!("No value bound for parameter '{name}'"))
                })?;
                push_value(&mut qb, value);
            }
        }
    }
    Ok(qb)
}
