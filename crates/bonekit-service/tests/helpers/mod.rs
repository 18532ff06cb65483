//! Shared test helpers for service integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use sqlx::FromRow;

use bonekit_core::config::DatabaseConfig;
use bonekit_core::types::{Field, Value};
use bonekit_database::{DatabasePool, PersistenceContext, SqlContext, schema};
use bonekit_entity::{Entity, EntityBone, NamedQuery, impl_entity_identity};
use bonekit_service::GenericService;

/// Test entity with a textual and an integer field.
#[derive(Debug, Clone, Default, FromRow)]
pub struct Person {
    #[sqlx(flatten)]
    pub bone: EntityBone,
    pub name: String,
    pub age: i64,
    pub city: Option<String>,
}

impl Person {
    pub fn new(name: &str, age: i64) -> Self {
        Self {
            bone: EntityBone::new(),
            name: name.to_string(),
            age,
            city: None,
        }
    }
}

impl Entity for Person {
    const TABLE: &'static str = "people";

    fn fields() -> &'static [Field] {
        const FIELDS: &[Field] = &[Field::text("name"), Field::integer("age"), Field::text("city")];
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
            Value::from(self.city.clone()),
        ]
    }

    fn named_queries() -> &'static [NamedQuery] {
        const QUERIES: &[NamedQuery] = &[
            NamedQuery::new("Person.byName", "SELECT * FROM people WHERE name = :name"),
            NamedQuery::new("Person.byMinAge", "SELECT * FROM people WHERE age >= :age"),
            NamedQuery::new("Person.all", "SELECT * FROM people"),
        ];
        QUERIES
    }
}

impl_entity_identity!(Person);

/// A fresh in-memory database with the `people` table.
pub async fn context() -> Arc<SqlContext> {
    let db = DatabasePool::connect(&DatabaseConfig::in_memory())
        .await
        .expect("Failed to connect to test database");
    schema::create_table::<Person>(db.pool())
        .await
        .expect("Failed to create table");
    Arc::new(SqlContext::new(db.into_pool()))
}

/// A service over a fresh database, with a transaction already started.
pub async fn service() -> GenericService<Person, SqlContext> {
    let ctx = context().await;
    ctx.begin().await.expect("begin");
    GenericService::new(ctx)
}

/// Create one person per `(name, age)` pair, in order.
pub async fn seed(
    service: &GenericService<Person, SqlContext>,
    people: &[(&str, i64)],
) -> Vec<Person> {
    let mut created = Vec::with_capacity(people.len());
    for (name, age) in people {
        created.push(
            service
                .create(Person::new(name, *age))
                .await
                .expect("Failed to seed person"),
        );
    }
    created
}

/// Create `n` people named `p01`, `p02`, ...
pub async fn seed_numbered(service: &GenericService<Person, SqlContext>, n: usize) -> Vec<Person> {
    let names: Vec<String> = (1..=n).map(|i| format!("p{i:02}")).collect();
    let people: Vec<(&str, i64)> = names.iter().map(|name| (name.as_str(), 20)).collect();
    seed(service, &people).await
}
