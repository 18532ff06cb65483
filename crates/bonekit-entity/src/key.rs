//! Type-qualified entity keys.

use std::any::{TypeId, type_name};
use std::fmt;

use crate::entity::Entity;

/// An entity key qualified by its concrete type.
///
/// Keys of different entity types never compare equal, so one set can
/// track managed instances of every type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityKey {
    type_id: TypeId,
    type_name: &'static str,
    id: i32,
}

impl EntityKey {
    /// Build the key of an entity of type `T`.
    pub fn of<T: Entity>(id: i32) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            id,
        }
    }

    /// The surrogate key.
    pub fn id(&self) -> i32 {
        self.id
    }

    /// The fully qualified entity type name.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether this key belongs to entity type `T`.
    pub fn is<T: Entity>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.type_name, self.id)
    }
}
