//! # bonekit-entity
//!
//! The identity base shared by every persistent type. An entity embeds an
//! [`EntityBone`] carrying its generated surrogate key, implements
//! [`Entity`] to describe its table and queryable fields, and gets
//! key-based equality and hashing from [`impl_entity_identity!`].

pub mod bone;
pub mod entity;
pub mod key;

pub use bone::EntityBone;
pub use entity::{Entity, NamedQuery};
pub use key::EntityKey;
