use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

use crate::database::pipeline::Pipeline;
use crate::database::store::{Collection, Document, DocumentStore, StoreError};
use crate::filter::{DeleteResult, Filter, FindOptions, Patch, UpdateResult};

/// Bounds every operation of the wrapped store by a fixed ceiling.
/// Exceeded operations are dropped and reported as `StoreError::Timeout`.
#[derive(Clone)]
pub struct TimeoutStore {
    inner: Arc<dyn DocumentStore>,
    limit: Duration,
}

impl TimeoutStore {
    pub fn new(inner: Arc<dyn DocumentStore>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn bounded<T>(
        &self,
        op: &'static str,
        collection: Option<Collection>,
        fut: impl Future<Output = Result<T, StoreError>> + Send,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.limit, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "store {} on {} exceeded {:?}",
                    op,
                    collection.map_or("store", |c| c.name()),
                    self.limit
                );
                Err(StoreError::Timeout(self.limit))
            }
        }
    }
}

#[async_trait]
impl DocumentStore for TimeoutStore {
    async fn insert_one(&self, collection: Collection, doc: Document) -> Result<Uuid, StoreError> {
        self.bounded("insert_one", Some(collection), self.inner.insert_one(collection, doc))
            .await
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        self.bounded("find", Some(collection), self.inner.find(collection, filter, options))
            .await
    }

    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>, StoreError> {
        self.bounded("find_one", Some(collection), self.inner.find_one(collection, filter))
            .await
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: &Patch,
    ) -> Result<UpdateResult, StoreError> {
        self.bounded("update_one", Some(collection), self.inner.update_one(collection, filter, patch))
            .await
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<DeleteResult, StoreError> {
        self.bounded("delete_one", Some(collection), self.inner.delete_one(collection, filter))
            .await
    }

    async fn aggregate(&self, collection: Collection, pipeline: &Pipeline) -> Result<Vec<Document>, StoreError> {
        self.bounded("aggregate", Some(collection), self.inner.aggregate(collection, pipeline))
            .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.bounded("ping", None, self.inner.ping()).await
    }
}
