//! The CRUD capability shared by every generic service.

use async_trait::async_trait;

use bonekit_core::result::AppResult;
use bonekit_entity::Entity;

/// Create/read/update/delete over one entity type.
///
/// Object safe, so services for a given entity type can be held as
/// `Arc<dyn CrudService<T>>` by callers that only need CRUD.
#[async_trait]
pub trait CrudService<T: Entity>: Send + Sync {
    /// Persist a new entity and return it with its generated key.
    async fn create(&self, entity: T) -> AppResult<T>;

    /// Find an entity by key. Absence is `Ok(None)`.
    async fn read(&self, id: i32) -> AppResult<Option<T>>;

    /// Merge the entity's state into the store.
    async fn update(&self, entity: &T) -> AppResult<bool>;

    /// Delete the entity, re-attaching it first if it is detached.
    async fn delete(&self, entity: &T) -> AppResult<bool>;
}
