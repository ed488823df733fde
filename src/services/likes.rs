use std::sync::Arc;
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::database::models::{Like, LikeInput};
use crate::database::store::DocumentStore;
use crate::database::Repository;
use crate::services::{OwnershipMutator, Page, PageRequest, ServiceError};

/// Likes are created and deleted, never updated.
pub struct LikeService {
    likes: Repository<Like>,
    mutator: OwnershipMutator,
}

impl LikeService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            likes: Repository::new(store.clone()),
            mutator: OwnershipMutator::new(store),
        }
    }

    pub async fn create(&self, caller: Option<CallerIdentity>, input: LikeInput) -> Result<Uuid, ServiceError> {
        self.mutator.create(caller, input).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Like, ServiceError> {
        self.likes.find_404(id).await
    }

    pub async fn list_page(&self, page: i64, limit: i64) -> Result<Page<Like>, ServiceError> {
        let request = PageRequest::new(page, limit)?;
        self.list(request).await
    }

    pub async fn list(&self, request: PageRequest) -> Result<Page<Like>, ServiceError> {
        Ok(self.likes.list(&request).await?)
    }

    pub async fn delete(&self, id: Uuid, caller: Option<CallerIdentity>) -> Result<(), ServiceError> {
        self.mutator.delete_if_owner::<Like>(id, caller).await
    }
}
