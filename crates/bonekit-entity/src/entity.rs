//! The contract every persistent type implements.

use std::any::TypeId;

use bonekit_core::types::{Field, Value};
use sqlx::FromRow;
use sqlx::sqlite::SqliteRow;

use crate::bone::EntityBone;
use crate::key::EntityKey;

/// A predefined query registered under a name.
///
/// Parameters are written as `:name` and bound by name at execution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamedQuery {
    /// Identifier the query is looked up by.
    pub name: &'static str,
    /// SQL text with `:name` placeholders.
    pub sql: &'static str,
}

impl NamedQuery {
    /// Create a named query.
    pub const fn new(name: &'static str, sql: &'static str) -> Self {
        Self { name, sql }
    }
}

/// A persistent record type with a generated surrogate key.
///
/// Implementors embed an [`EntityBone`] (flattened into the row) and list
/// their queryable columns in [`Entity::fields`]. The field registry is the
/// closed set of names that criteria and search may refer to; the key
/// column is always queryable as `id`.
pub trait Entity: for<'r> FromRow<'r, SqliteRow> + Send + Sync + Unpin + 'static {
    /// Backing table name.
    const TABLE: &'static str;

    /// Primary-key column name.
    const ID_COLUMN: &'static str = "id";

    /// Queryable columns other than the key, in [`Entity::values`] order.
    fn fields() -> &'static [Field];

    /// The identity part of this entity.
    fn bone(&self) -> &EntityBone;

    /// Mutable access to the identity part.
    fn bone_mut(&mut self) -> &mut EntityBone;

    /// Column values, in [`Entity::fields`] order.
    fn values(&self) -> Vec<Value>;

    /// Named queries declared by this entity type.
    fn named_queries() -> &'static [NamedQuery] {
        &[]
    }

    /// Return the surrogate key, if assigned.
    fn id(&self) -> Option<i32> {
        self.bone().id()
    }

    /// Type-qualified key, if assigned.
    fn key(&self) -> Option<EntityKey> {
        self.id().map(EntityKey::of::<Self>)
    }

    /// Look up a field by column name.
    fn field(name: &str) -> Option<Field> {
        if name == Self::ID_COLUMN {
            return Some(Field::integer(Self::ID_COLUMN));
        }
        Self::fields().iter().copied().find(|f| f.name == name)
    }

    /// Identity comparison that also works across entity types.
    ///
    /// Entities of different concrete types are never the same entity,
    /// whatever their keys.
    fn same_entity<O: Entity>(&self, other: &O) -> bool {
        if TypeId::of::<Self>() != TypeId::of::<O>() {
            return false;
        }
        if std::ptr::addr_eq(self as *const Self, other as *const O) {
            return true;
        }
        match (self.id(), other.id()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}
