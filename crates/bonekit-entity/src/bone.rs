//! Surrogate-key identity base.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Multiplier folded into the identity hash.
const HASH_PRIME: i32 = 31;

/// The identity part of every persistent entity.
///
/// Holds the generated integer key. The key is unset until the first
/// successful persist and is not validated: zero and negative keys carry
/// no special meaning here.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, FromRow)]
pub struct EntityBone {
    /// Generated surrogate key (`None` until persisted).
    #[serde(default)]
    id: Option<i32>,
}

impl EntityBone {
    /// Identity of an entity that has not been persisted yet.
    pub const fn new() -> Self {
        Self { id: None }
    }

    /// Identity carrying an already-assigned key.
    pub const fn with_id(id: i32) -> Self {
        Self { id: Some(id) }
    }

    /// Return the surrogate key, if assigned.
    pub fn id(&self) -> Option<i32> {
        self.id
    }

    /// Assign the surrogate key.
    pub fn set_id(&mut self, id: i32) {
        self.id = Some(id);
    }

    /// Whether no key has been assigned yet.
    pub fn is_new(&self) -> bool {
        self.id.is_none()
    }

    /// Key-based identity comparison.
    ///
    /// Two bones are the same identity when they are the same instance, or
    /// when both carry a key and the keys are equal. Callers pass bones
    /// borrowed from the entities being compared, so instance identity of
    /// the bones is instance identity of the entities.
    pub fn same_identity(a: &Self, b: &Self) -> bool {
        if std::ptr::eq(a, b) {
            return true;
        }
        match (a.id, b.id) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        }
    }

    /// Deterministic hash code derived from the key alone.
    pub fn identity_hash(&self) -> i32 {
        HASH_PRIME.wrapping_add(self.id.unwrap_or(0))
    }
}

/// Implement `PartialEq`, `Eq` and `Hash` for an entity type from its
/// [`EntityBone`](crate::EntityBone).
///
/// Because the impls are per concrete type, values of different entity
/// types cannot be compared with `==`; use
/// [`Entity::same_entity`](crate::Entity::same_entity) for that.
#[macro_export]
macro_rules! impl_entity_identity {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ::core::cmp::PartialEq for $ty {
                fn eq(&self, other: &Self) -> bool {
                    $crate::EntityBone::same_identity(
                        $crate::Entity::bone(self),
                        $crate::Entity::bone(other),
                    )
                }
            }

            impl ::core::cmp::Eq for $ty {}

            impl ::core::hash::Hash for $ty {
                fn hash<H: ::core::hash::Hasher>(&self, state: &mut H) {
                    state.write_i32($crate::Entity::bone(self).identity_hash());
                }
            }
        )+
    };
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    use bonekit_core::types::{Field, Value};

    use super::*;
    use crate::Entity;

    #[derive(Debug, Clone, Default, FromRow)]
    struct Author {
        #[sqlx(flatten)]
        bone: EntityBone,
        name: String,
    }

    #[derive(Debug, Clone, Default, FromRow)]
    struct Book {
        #[sqlx(flatten)]
        bone: EntityBone,
        name: String,
    }

    impl Entity for Author {
        const TABLE: &'static str = "authors";

        fn fields() -> &'static [Field] {
            const FIELDS: &[Field] = &[Field::text("name")];
            FIELDS
        }

        fn bone(&self) -> &EntityBone {
            &self.bone
        }

        fn bone_mut(&mut self) -> &mut EntityBone {
            &mut self.bone
        }

        fn values(&self) -> Vec<Value> {
            vec![Value::from(self.name.as_str())]
        }
    }

    impl Entity for Book {
        const TABLE: &'static str = "books";

        fn fields() -> &'static [Field] {
            const FIELDS: &[Field] = &[Field::text("name")];
            FIELDS
        }

        fn bone(&self) -> &EntityBone {
            &self.bone
        }

        fn bone_mut(&mut self) -> &mut EntityBone {
            &mut self.bone
        }

        fn values(&self) -> Vec<Value> {
            vec![Value::from(self.name.as_str())]
        }
    }

    crate::impl_entity_identity!(Author, Book);

    fn author(id: Option<i32>, name: &str) -> Author {
        Author {
            bone: EntityBone { id },
            name: name.to_string(),
        }
    }

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_equal_ids_are_equal_and_hash_alike() {
        let a = author(Some(7), "Ann");
        let b = author(Some(7), "Someone else");
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_different_ids_are_not_equal() {
        assert_ne!(author(Some(1), "Ann"), author(Some(2), "Ann"));
    }

    #[test]
    fn test_unassigned_only_equal_to_itself() {
        let a = author(None, "Ann");
        let b = author(None, "Ann");
        assert_eq!(a, a);
        assert_ne!(a, b);
        assert_ne!(a, author(Some(0), "Ann"));
    }

    #[test]
    fn test_zero_and_negative_ids_compare_normally() {
        assert_eq!(author(Some(0), "a"), author(Some(0), "b"));
        assert_eq!(author(Some(-4), "a"), author(Some(-4), "b"));
    }

    #[test]
    fn test_different_types_never_same_entity() {
        let a = author(Some(3), "Ann");
        let b = Book {
            bone: EntityBone::with_id(3),
            name: "Ann".to_string(),
        };
        assert!(!a.same_entity(&b));
        assert!(a.same_entity(&author(Some(3), "x")));
    }

    #[test]
    fn test_identity_hash_is_deterministic() {
        assert_eq!(EntityBone::with_id(5).identity_hash(), 36);
        assert_eq!(
            EntityBone::with_id(5).identity_hash(),
            EntityBone::with_id(5).identity_hash()
        );
        assert_eq!(EntityBone::with_id(i32::MAX).identity_hash(), i32::MIN + 30);
    }

    #[test]
    fn test_set_id() {
        let mut bone = EntityBone::new();
        assert!(bone.is_new());
        bone.set_id(42);
        assert_eq!(bone.id(), Some(42));
        assert!(!bone.is_new());
    }

    #[test]
    fn test_serde_roundtrip() {
        let json = serde_json::to_string(&EntityBone::with_id(9)).expect("serialize");
        assert_eq!(json, r#"{"id":9}"#);
        let parsed: EntityBone = serde_json::from_str("{}").expect("deserialize");
        assert!(parsed.is_new());
    }
}
