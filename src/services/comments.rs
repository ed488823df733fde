use std::sync::Arc;
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::database::models::{Comment, CommentInput, CommentPatch};
use crate::database::store::DocumentStore;
use crate::database::Repository;
use crate::services::{OwnershipMutator, Page, PageRequest, ServiceError};

pub struct CommentService {
    comments: Repository<Comment>,
    mutator: OwnershipMutator,
}

impl CommentService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            comments: Repository::new(store.clone()),
            mutator: OwnershipMutator::new(store),
        }
    }

    /// The referenced post must exist.
    pub async fn create(&self, caller: Option<CallerIdentity>, input: CommentInput) -> Result<Uuid, ServiceError> {
        self.mutator.create(caller, input).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Comment, ServiceError> {
        self.comments.find_404(id).await
    }

    pub async fn list_page(&self, page: i64, limit: i64) -> Result<Page<Comment>, ServiceError> {
        let request = PageRequest::new(page, limit)?;
        self.list(request).await
    }

    pub async fn list(&self, request: PageRequest) -> Result<Page<Comment>, ServiceError> {
        Ok(self.comments.list(&request).await?)
    }

    pub async fn update(
        &self,
        id: Uuid,
        caller: Option<CallerIdentity>,
        patch: CommentPatch,
    ) -> Result<(), ServiceError> {
        self.mutator.update_if_owner(id, caller, patch).await
    }

    pub async fn delete(&self, id: Uuid, caller: Option<CallerIdentity>) -> Result<(), ServiceError> {
        self.mutator.delete_if_owner::<Comment>(id, caller).await
    }
}
