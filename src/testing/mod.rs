//! Fixtures shared by unit tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::database::pipeline::Pipeline;
use crate::database::store::{Collection, Document, DocumentStore, StoreError};
use crate::filter::{DeleteResult, Filter, FindOptions, Patch, UpdateResult};

/// A fresh, random caller.
pub fn caller() -> CallerIdentity {
    CallerIdentity::new(Uuid::new_v4())
}

/// Store decorator counting every call that reaches the backend.
pub struct CountingStore {
    inner: Arc<dyn DocumentStore>,
    calls: AtomicUsize,
}

impl CountingStore {
    pub fn wrap(inner: impl DocumentStore + 'static) -> Arc<Self> {
        Arc::new(Self { inner: Arc::new(inner), calls: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for CountingStore {
    async fn insert_one(&self, collection: Collection, doc: Document) -> Result<Uuid, StoreError> {
        self.tick();
        self.inner.insert_one(collection, doc).await
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        self.tick();
        self.inner.find(collection, filter, options).await
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: &Patch,
    ) -> Result<UpdateResult, StoreError> {
        self.tick();
        self.inner.update_one(collection, filter, patch).await
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<DeleteResult, StoreError> {
        self.tick();
        self.inner.delete_one(collection, filter).await
    }

    async fn aggregate(&self, collection: Collection, pipeline: &Pipeline) -> Result<Vec<Document>, StoreError> {
        self.tick();
        self.inner.aggregate(collection, pipeline).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.tick();
        self.inner.ping().await
    }
}
