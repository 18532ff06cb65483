//! Entity types shared by this crate's unit tests.

use bonekit_core::types::{Field, Value};
use bonekit_entity::{Entity, EntityBone, NamedQuery, impl_entity_identity};
use sqlx::FromRow;

#[derive(Debug, Clone, Default, FromRow)]
pub struct Person {
    #[sqlx(flatten)]
    pub bone: EntityBone,
    pub name: String,
    pub age: i64,
    pub nick: Option<String>,
}

impl Person {
    pub fn new(name: &str, age: i64) -> Self {
        Self {
            bone: EntityBone::new(),
            name: name.to_string(),
            age,
            nick: None,
        }
    }
}

impl Entity for Person {
    const TABLE: &'static str = "persons";

    fn fields() -> &'static [Field] {
        const FIELDS: &[Field] = &[Field::text("name"), Field::integer("age"), Field::text("nick")];
        FIELDS
    }

    fn bone(&self) -> &EntityBone {
        &self.bone
    }

    fn bone_mut(&mut self) -> &mut EntityBone {
        &mut self.bone
    }

    fn values(&self) -> Vec<Value> {
        vec![
            Value::from(self.name.as_str()),
            Value::from(self.age),
            Value::from(self.nick.clone()),
        ]
    }

    fn named_queries() -> &'static [NamedQuery] {
        const QUERIES: &[NamedQuery] = &[
            NamedQuery::new("Person.byName", "SELECT * FROM persons WHERE name = :name"),
            NamedQuery::new("Person.olderThan", "SELECT * FROM persons WHERE age > :age"),
        ];
        QUERIES
    }
}

impl_entity_identity!(Person);
