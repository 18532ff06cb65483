//! Generic CRUD and query service bound to one entity type.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use bonekit_core::result::AppResult;
use bonekit_core::types::{EntityQuery, PageRequest, PageResponse, Predicate, SearchCriteria, Value};
use bonekit_database::PersistenceContext;
use bonekit_entity::Entity;

use crate::crud::CrudService;
use crate::search;
use crate::single::SingleResult;

/// CRUD, listing, named-query, and search operations for entity type `T`.
///
/// Every call goes straight through to the bound persistence context.
/// Mutations flush before returning, so their effects are visible to later
/// reads within the same transaction.
pub struct GenericService<T, C> {
    context: Arc<C>,
    _entity: PhantomData<fn() -> T>,
}

impl<T, C> Clone for GenericService<T, C> {
    fn clone(&self) -> Self {
        Self {
            context: Arc::clone(&self.context),
            _entity: PhantomData,
        }
    }
}

impl<T, C> std::fmt::Debug for GenericService<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericService")
            .field("entity", &std::any::type_name::<T>())
            .finish_non_exhaustive()
    }
}

impl<T, C> GenericService<T, C>
where
    T: Entity,
    C: PersistenceContext,
{
    /// Bind a service to a persistence context.
    pub fn new(context: Arc<C>) -> Self {
        Self {
            context,
            _entity: PhantomData,
        }
    }

    /// The bound persistence context.
    pub fn context(&self) -> &Arc<C> {
        &self.context
    }

    /// Persist a new entity, flush, and return it with its generated key.
    pub async fn create(&self, mut entity: T) -> AppResult<T> {
        self.context.persist(&mut entity).await?;
        self.context.flush().await?;
        Ok(entity)
    }

    /// Find an entity by key. Absence is `Ok(None)`.
    pub async fn read(&self, id: i32) -> AppResult<Option<T>> {
        self.context.find::<T>(id).await
    }

    /// Merge the entity's state and flush.
    pub async fn update(&self, entity: &T) -> AppResult<bool> {
        self.context.merge(entity).await?;
        self.context.flush().await?;
        Ok(true)
    }

    /// Remove the entity and flush.
    ///
    /// A detached entity is merged first so that it can be removed.
    pub async fn delete(&self, entity: &T) -> AppResult<bool> {
        if !self.context.contains(entity).await {
            self.context.merge(entity).await?;
        }
        self.context.remove(entity).await?;
        self.context.flush().await?;
        Ok(true)
    }

    /// Every entity of the bound type.
    pub async fn find_all(&self) -> AppResult<Vec<T>> {
        self.context.list::<T>(&EntityQuery::all()).await
    }

    /// At most `max_results` entities starting at `(index - 1) * max_results`.
    ///
    /// `index` is 1-based. Inputs are not validated; out-of-range windows
    /// follow the provider's `LIMIT`/`OFFSET` semantics.
    pub async fn find_range(&self, index: i64, max_results: i64) -> AppResult<Vec<T>> {
        let offset = index.saturating_sub(1).saturating_mul(max_results);
        self.window(offset, max_results).await
    }

    /// Number of entities of the bound type.
    pub async fn count(&self) -> AppResult<u64> {
        let total = self.context.count::<T>(&Predicate::conjunction()).await?;
        Ok(u64::try_from(total).unwrap_or_default())
    }

    /// One page with totals.
    pub async fn find_page(&self, page: &PageRequest) -> AppResult<PageResponse<T>> {
        let page = PageRequest::new(page.page, page.page_size);
        let total = self.count().await?;
        let items = self.window(page.offset(), page.limit()).await?;
        Ok(PageResponse::new(items, &page, total))
    }

    /// Page `page` (1-based) of
    /// [`DEFAULT_PAGE_SIZE`](bonekit_core::types::DEFAULT_PAGE_SIZE) entities.
    ///
    /// Pages below 1 are read as page 1.
    pub async fn paginate(&self, page: i64) -> AppResult<Vec<T>> {
        let page = PageRequest::numbered(page);
        debug!(
            table = T::TABLE,
            page = page.page,
            page_size = page.page_size,
            "Current page"
        );
        self.window(page.offset(), page.limit()).await
    }

    async fn window(&self, offset: i64, limit: i64) -> AppResult<Vec<T>> {
        let query = EntityQuery::all().first_result(offset).max_results(limit);
        self.context.list::<T>(&query).await
    }

    /// Run a single-result named query and classify the outcome.
    ///
    /// Parameters are bound only when the map is present and non-empty.
    pub async fn find_one(
        &self,
        named_query: &str,
        parameters: Option<&HashMap<String, Value>>,
    ) -> SingleResult<T> {
        let empty = HashMap::new();
        let params = parameters.filter(|p| !p.is_empty()).unwrap_or(&empty);
        SingleResult::from_result(self.context.single_result::<T>(named_query, params).await)
    }

    /// Run a single-result named query, never failing.
    ///
    /// No row, several rows, and query failures all come back as `None`;
    /// the cause is only logged.
    pub async fn find_one_result(
        &self,
        named_query: &str,
        parameters: Option<&HashMap<String, Value>>,
    ) -> Option<T> {
        match self.find_one(named_query, parameters).await {
            SingleResult::Found(entity) => Some(entity),
            SingleResult::Empty => {
                warn!(query = named_query, "Error while running query: no result");
                None
            }
            SingleResult::NonUnique => {
                warn!(query = named_query, "Error while running query: more than one result");
                None
            }
            SingleResult::Failed(e) => {
                warn!(
                    query = named_query,
                    kind = %e.kind,
                    error = %e.message,
                    "Error while running query"
                );
                None
            }
        }
    }

    /// Entities matching every recognized criterion.
    ///
    /// See [`search::build_predicate`] for how criteria translate.
    pub async fn search(&self, criteria: &[SearchCriteria]) -> AppResult<Vec<T>> {
        let predicate = search::build_predicate::<T>(criteria)?;
        self.context
            .list::<T>(&EntityQuery::all().filter(predicate))
            .await
    }
}

#[async_trait]
impl<T, C> CrudService<T> for GenericService<T, C>
where
    T: Entity,
    C: PersistenceContext,
{
    async fn create(&self, entity: T) -> AppResult<T> {
        GenericService::create(self, entity).await
    }

    async fn read(&self, id: i32) -> AppResult<Option<T>> {
        GenericService::read(self, id).await
    }

    async fn update(&self, entity: &T) -> AppResult<bool> {
        GenericService::update(self, entity).await
    }

    async fn delete(&self, entity: &T) -> AppResult<bool> {
        GenericService::delete(self, entity).await
    }
}
