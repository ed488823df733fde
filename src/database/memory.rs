use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::database::pipeline::{Pipeline, Stage};
use crate::database::store::{document_id, Collection, Document, DocumentStore, StoreError};
use crate::filter::{DeleteResult, Filter, FindOptions, Patch, SortDirection, UpdateResult};

/// In-process document store. Collections are insertion-ordered vectors,
/// which is the natural iteration order exposed to callers.
#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<HashMap<Collection, Vec<Document>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently stored in `collection`.
    pub async fn len(&self, collection: Collection) -> usize {
        let collections = self.collections.read().await;
        collections.get(&collection).map_or(0, Vec::len)
    }

    fn run_pipeline(
        collections: &HashMap<Collection, Vec<Document>>,
        root: Collection,
        pipeline: &Pipeline,
    ) -> Vec<Document> {
        let mut docs: Vec<Document> = collections.get(&root).cloned().unwrap_or_default();

        for stage in pipeline.stages() {
            docs = match stage {
                Stage::Match(filter) => docs.into_iter().filter(|d| filter.matches(d)).collect(),
                Stage::Lookup(lookup) => {
                    let foreign = collections.get(&lookup.from).map(Vec::as_slice).unwrap_or(&[]);
                    docs.into_iter()
                        .map(|mut doc| {
                            let local = doc.get(&lookup.local_field).cloned().unwrap_or(Value::Null);
                            let joined: Vec<Value> = foreign
                                .iter()
                                .filter(|f| f.get(&lookup.foreign_field).unwrap_or(&Value::Null) == &local)
                                .cloned()
                                .map(Value::Object)
                                .collect();
                            doc.insert(lookup.as_field.clone(), Value::Array(joined));
                            doc
                        })
                        .collect()
                }
                Stage::AddFields(fields) => docs
                    .into_iter()
                    .map(|mut doc| {
                        for c in fields {
                            let v = c.expr.evaluate(&doc);
                            doc.insert(c.name.clone(), v);
                        }
                        doc
                    })
                    .collect(),
                Stage::Project(projection) => docs.iter().map(|d| projection.apply(d)).collect(),
                Stage::Skip(n) => docs.into_iter().skip(clamp(*n)).collect(),
                Stage::Limit(n) => docs.into_iter().take(clamp(*n)).collect(),
            };
        }

        docs
    }
}

fn clamp(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

/// Ordering for JSON scalars used by `FindOptions::sort`.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(&self, collection: Collection, doc: Document) -> Result<Uuid, StoreError> {
        let id = document_id(&doc)?;
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();
        if docs.iter().any(|d| document_id(d).ok() == Some(id)) {
            return Err(StoreError::InvalidDocument(format!("duplicate id {} in {}", id, collection)));
        }
        docs.push(doc);
        debug!("memory store: inserted {} into {}", id, collection);
        Ok(id)
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        let mut docs: Vec<Document> = collections
            .get(&collection)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default();

        if !options.sort.is_empty() {
            // Stable sort keeps insertion order among equal keys
            docs.sort_by(|a, b| {
                options
                    .sort
                    .iter()
                    .map(|key| {
                        let ord = compare_values(a.get(&key.field), b.get(&key.field));
                        match key.direction {
                            SortDirection::Asc => ord,
                            SortDirection::Desc => ord.reverse(),
                        }
                    })
                    .find(|ord| *ord != Ordering::Equal)
                    .unwrap_or(Ordering::Equal)
            });
        }

        let skip = options.skip.map_or(0, clamp);
        let limit = options.limit.map_or(usize::MAX, clamp);
        Ok(docs.into_iter().skip(skip).take(limit).collect())
    }

    async fn update_one(
        &self,
        collection: Collection,
        filter: &Filter,
        patch: &Patch,
    ) -> Result<UpdateResult, StoreError> {
        let mut collections = self.collections.write().await;
        let target = collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|d| filter.matches(d)));

        Ok(match target {
            Some(doc) => {
                let modified = patch.apply(doc);
                UpdateResult { matched: 1, modified: u64::from(modified) }
            }
            None => UpdateResult::default(),
        })
    }

    async fn delete_one(&self, collection: Collection, filter: &Filter) -> Result<DeleteResult, StoreError> {
        let mut collections = self.collections.write().await;
        let Some(docs) = collections.get_mut(&collection) else {
            return Ok(DeleteResult::default());
        };

        Ok(match docs.iter().position(|d| filter.matches(d)) {
            Some(index) => {
                docs.remove(index);
                DeleteResult { deleted: 1 }
            }
            None => DeleteResult::default(),
        })
    }

    async fn aggregate(&self, collection: Collection, pipeline: &Pipeline) -> Result<Vec<Document>, StoreError> {
        let collections = self.collections.read().await;
        Ok(Self::run_pipeline(&collections, collection, pipeline))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
