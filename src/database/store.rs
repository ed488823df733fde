use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::database::pipeline::Pipeline;
use crate::filter::{DeleteResult, Filter, FindOptions, Patch, UpdateResult};

/// A stored record: a JSON object keyed by `id`.
pub type Document = Map<String, Value>;

/// One collection per entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Posts,
    Comments,
    Likes,
}

impl Collection {
    pub const ALL: [Collection; 3] = [Collection::Posts, Collection::Comments, Collection::Likes];

    pub fn name(&self) -> &'static str {
        match self {
            Collection::Posts => "posts",
            Collection::Comments => "comments",
            Collection::Likes => "likes",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Collection-per-entity document storage.
///
/// `update_one` and `delete_one` combine filter and mutation into a single
/// atomic operation, so callers never check-then-act.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert a document carrying a UUID `id`; returns that id.
    async fn insert_one(&self, collection: Collection, doc: Document) -> Result<Uuid, StoreError>;

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    async fn find_one(&self, collection: Collection, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let mut docs = self
            .find(collection, filter, &FindOptions::new().limit(1))
            .await?;
        Ok(docs.pop())
    }

    /// Apply `patch` to the first document matching `filter`.
    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: &Patch,
    ) -> Result<UpdateResult, StoreError>;

    /// Remove the first document matching `filter`.
    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<DeleteResult, StoreError>;

    /// Run an aggregation pipeline rooted at `collection`.
    async fn aggregate(&self, collection: Collection, pipeline: &Pipeline) -> Result<Vec<Document>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Extract and parse the `id` field every stored document must carry.
pub fn document_id(doc: &Document) -> Result<Uuid, StoreError> {
    let raw = doc
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::InvalidDocument("document is missing a string 'id'".to_string()))?;
    Uuid::parse_str(raw).map_err(|_| StoreError::InvalidDocument(format!("document id '{}' is not a UUID", raw)))
}
