use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::database::models::{fields, from_document, Post, PostDetail, PostInput, PostPatch, PostSummary};
use crate::database::pipeline::{Expr, Pipeline, Projection};
use crate::database::store::{Collection, DocumentStore};
use crate::filter::Filter;
use crate::services::{OwnershipMutator, Page, PageRequest, ServiceError};

/// Read views over posts joined with their comments and likes, plus the
/// owner-scoped post mutations.
pub struct PostService {
    store: Arc<dyn DocumentStore>,
    mutator: OwnershipMutator,
}

impl PostService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let mutator = OwnershipMutator::new(store.clone());
        Self { store, mutator }
    }

    /// `Match{id}` → join comments → join likes → totals → `Limit(1)`.
    pub fn detail_pipeline(id: Uuid) -> Pipeline {
        Pipeline::new()
            .match_filter(Filter::new().eq(fields::ID, id.to_string()))
            .lookup(Collection::Comments, fields::ID, fields::POST_ID, fields::COMMENTS)
            .lookup(Collection::Likes, fields::ID, fields::POST_ID, fields::LIKES)
            .add_field(fields::TOTAL_COMMENTS, Expr::size(fields::COMMENTS))
            .add_field(fields::TOTAL_LIKES, Expr::size(fields::LIKES))
            .limit(1)
    }

    /// Join, project counts, then slice the page.
    pub fn summary_pipeline(request: &PageRequest) -> Pipeline {
        let projection = Projection::new()
            .include(fields::NAME)
            .include(fields::DESCRIPTION)
            .include(fields::CREATED_AT)
            .include(fields::UPDATED_AT)
            .include(fields::USER_ID)
            .computed(fields::COMMENT_COUNT, Expr::size(fields::COMMENTS))
            .computed(fields::LIKE_COUNT, Expr::size(fields::LIKES));

        Pipeline::new()
            .lookup(Collection::Comments, fields::ID, fields::POST_ID, fields::COMMENTS)
            .lookup(Collection::Likes, fields::ID, fields::POST_ID, fields::LIKES)
            .project(projection)
            .skip(request.skip())
            .limit(request.limit())
    }

    pub async fn fetch_by_id(&self, id: Uuid) -> Result<PostDetail, ServiceError> {
        let rows = self
            .store
            .aggregate(Collection::Posts, &Self::detail_pipeline(id))
            .await?;

        match rows.into_iter().next() {
            Some(doc) => Ok(from_document(doc)?),
            None => Err(ServiceError::not_found::<Post>()),
        }
    }

    /// Validates the window before any store access.
    pub async fn list_page(&self, page: i64, limit: i64) -> Result<Page<PostSummary>, ServiceError> {
        let request = PageRequest::new(page, limit)?;
        self.list(request).await
    }

    pub async fn list(&self, request: PageRequest) -> Result<Page<PostSummary>, ServiceError> {
        let rows = self
            .store
            .aggregate(Collection::Posts, &Self::summary_pipeline(&request))
            .await?;
        debug!("post page {} (limit {}) returned {} rows", request.page(), request.limit(), rows.len());

        let data = rows
            .into_iter()
            .map(from_document)
            .collect::<Result<Vec<PostSummary>, _>>()?;
        Ok(Page::new(data, &request))
    }

    pub async fn create(&self, caller: Option<CallerIdentity>, input: PostInput) -> Result<Uuid, ServiceError> {
        self.mutator.create(caller, input).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        caller: Option<CallerIdentity>,
        patch: PostPatch,
    ) -> Result<(), ServiceError> {
        self.mutator.update_if_owner(id, caller, patch).await
    }

    /// Comments and likes on the post are left in place.
    pub async fn delete(&self, id: Uuid, caller: Option<CallerIdentity>) -> Result<(), ServiceError> {
        self.mutator.delete_if_owner::<Post>(id, caller).await
    }
}
