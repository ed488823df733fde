use std::marker::PhantomData;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::models::{fields, from_document, to_document, Entity};
use crate::database::store::{DocumentStore, StoreError};
use crate::filter::{Filter, FindOptions};
use crate::services::{Page, PageRequest, ServiceError};

/// Typed access to the collection backing `T`.
pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _phantom: PhantomData<T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self { store: self.store.clone(), _phantom: PhantomData }
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store, _phantom: PhantomData }
    }

    pub fn by_id(id: Uuid) -> Filter {
        Filter::new().eq(fields::ID, id.to_string())
    }

    pub async fn insert(&self, entity: &T) -> Result<Uuid, StoreError> {
        self.store.insert_one(T::COLLECTION, to_document(entity)?).await
    }

    pub async fn select_any(&self, filter: &Filter, options: &FindOptions) -> Result<Vec<T>, StoreError> {
        self.store
            .find(T::COLLECTION, filter, options)
            .await?
            .into_iter()
            .map(from_document)
            .collect()
    }

    pub async fn select_one(&self, filter: &Filter) -> Result<Option<T>, StoreError> {
        self.store
            .find_one(T::COLLECTION, filter)
            .await?
            .map(from_document)
            .transpose()
    }

    pub async fn find_404(&self, id: Uuid) -> Result<T, ServiceError> {
        self.select_one(&Self::by_id(id))
            .await?
            .ok_or_else(|| ServiceError::not_found::<T>())
    }

    pub async fn exists(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.store.find_one(T::COLLECTION, &Self::by_id(id)).await?.is_some())
    }

    /// One page in store natural order.
    pub async fn list(&self, request: &PageRequest) -> Result<Page<T>, StoreError> {
        let data = self.select_any(&Filter::all(), &request.find_options()).await?;
        Ok(Page::new(data, request))
    }
}
