//! Ownership-scoped create, update and delete.
//!
//! Updates and deletes filter on `{id, user_id}` in a single store call, so
//! a record owned by someone else looks exactly like a missing one.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::database::models::{fields, Entity, FieldErrors};
use crate::database::store::{Collection, DocumentStore, StoreError};
use crate::database::Repository;
use crate::filter::{Filter, Patch};
use crate::services::ServiceError;

/// Server-assigned values written into every new record.
#[derive(Debug, Clone, PartialEq)]
pub struct Stamp {
    pub id: Uuid,
    pub owner: CallerIdentity,
    pub at: DateTime<Utc>,
}

impl Stamp {
    pub fn new(owner: CallerIdentity) -> Self {
        Self { id: Uuid::new_v4(), owner, at: Utc::now() }
    }
}

/// A foreign key that must resolve at creation time.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub field: &'static str,
    pub collection: Collection,
    pub id: Uuid,
}

/// Client input for a new record.
pub trait Draft: Send {
    type Entity: Entity;

    fn validate(&self) -> Result<(), FieldErrors>;

    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }

    fn into_entity(self, stamp: Stamp) -> Self::Entity;
}

/// Client input for an owner-only update. Only whitelisted fields survive
/// `into_patch`.
pub trait OwnedPatch: Send {
    type Entity: Entity;

    fn validate(&self) -> Result<(), FieldErrors>;

    fn into_patch(self) -> Patch;
}

#[derive(Clone)]
pub struct OwnershipMutator {
    store: Arc<dyn DocumentStore>,
}

impl OwnershipMutator {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn owned_by(id: Uuid, owner: CallerIdentity) -> Filter {
        Filter::new()
            .eq(fields::ID, id.to_string())
            .eq(fields::USER_ID, owner.user_id().to_string())
    }

    pub async fn create<D: Draft>(
        &self,
        caller: Option<CallerIdentity>,
        draft: D,
    ) -> Result<Uuid, ServiceError> {
        let owner = caller.ok_or(ServiceError::Unauthorized)?;
        draft.validate().map_err(ServiceError::validation)?;

        let mut missing = FieldErrors::new();
        for reference in draft.references() {
            let found = self
                .store
                .find_one(reference.collection, &Filter::new().eq(fields::ID, reference.id.to_string()))
                .await?;
            if found.is_none() {
                debug!("{} {} referenced by new record does not exist", reference.collection, reference.id);
                missing.insert(reference.field.to_string(), "Referenced record does not exist".to_string());
            }
        }
        if !missing.is_empty() {
            return Err(ServiceError::validation(missing));
        }

        let entity = draft.into_entity(Stamp::new(owner));
        let id = Repository::<D::Entity>::new(self.store.clone()).insert(&entity).await?;

        info!("Created {} {} for user {}", D::Entity::NAME, id, owner);
        Ok(id)
    }

    pub async fn update_if_owner<P: OwnedPatch>(
        &self,
        id: Uuid,
        caller: Option<CallerIdentity>,
        patch: P,
    ) -> Result<(), ServiceError> {
        let owner = caller.ok_or(ServiceError::Unauthorized)?;
        patch.validate().map_err(ServiceError::validation)?;

        let patch = patch.into_patch();
        if patch.is_empty() {
            return Err(ServiceError::invalid_argument("No updatable fields provided"));
        }
        let now = serde_json::to_value(Utc::now()).map_err(StoreError::from)?;
        let patch = patch.set(fields::UPDATED_AT, now);

        let result = self
            .store
            .update_one(P::Entity::COLLECTION, &Self::owned_by(id, owner), &patch)
            .await?;
        if result.matched == 0 {
            return Err(ServiceError::not_found::<P::Entity>());
        }

        info!("Updated {} {} for user {}", P::Entity::NAME, id, owner);
        Ok(())
    }

    pub async fn delete_if_owner<E: Entity>(
        &self,
        id: Uuid,
        caller: Option<CallerIdentity>,
    ) -> Result<(), ServiceError> {
        let owner = caller.ok_or(ServiceError::Unauthorized)?;

        let result = self
            .store
            .delete_one(E::COLLECTION, &Self::owned_by(id, owner))
            .await?;
        if result.deleted == 0 {
            return Err(ServiceError::not_found::<E>());
        }

        info!("Deleted {} {} for user {}", E::NAME, id, owner);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Post, PostInput, PostPatch};
    use crate::database::MemoryStore;
    use crate::testing::{caller, CountingStore};
    use std::time::Duration;

    fn input(name: &str) -> PostInput {
        PostInput { name: Some(name.into()), description: Some("body".into()) }
    }

    #[tokio::test]
    async fn create_requires_caller_before_touching_store() {
        let store = CountingStore::wrap(MemoryStore::new());
        let mutator = OwnershipMutator::new(store.clone());

        let err = mutator.create(None, input("p")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized));

        let err = mutator.create(Some(caller()), PostInput::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation { ref field_errors, .. } if field_errors.len() == 2));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn create_stamps_owner() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let mutator = OwnershipMutator::new(store.clone());
        let owner = caller();

        let id = mutator.create(Some(owner), input("p")).await.unwrap();
        let post = Repository::<Post>::new(store).find_404(id).await.unwrap();
        assert_eq!(post.user_id, owner.user_id());
        assert_eq!(post.created_at, post.updated_at);
    }

    #[tokio::test]
    async fn non_owner_cannot_mutate() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let mutator = OwnershipMutator::new(store.clone());
        let repo = Repository::<Post>::new(store);
        let (owner, stranger) = (caller(), caller());

        let id = mutator.create(Some(owner), input("mine")).await.unwrap();
        let before = repo.find_404(id).await.unwrap();

        let patch = PostPatch { name: Some("theirs".into()), description: None };
        let err = mutator.update_if_owner(id, Some(stranger), patch).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref m) if m == "Post not found"));

        let err = mutator.delete_if_owner::<Post>(id, Some(stranger)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        // Same failure as an id that never existed
        let err = mutator.delete_if_owner::<Post>(Uuid::new_v4(), Some(owner)).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(ref m) if m == "Post not found"));

        assert_eq!(repo.find_404(id).await.unwrap(), before);
    }

    #[tokio::test]
    async fn repeated_update_only_advances_updated_at() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let mutator = OwnershipMutator::new(store.clone());
        let repo = Repository::<Post>::new(store);
        let owner = caller();
        let id = mutator.create(Some(owner), input("before")).await.unwrap();

        let patch = || PostPatch { name: Some("after".into()), description: Some("d".into()) };
        mutator.update_if_owner(id, Some(owner), patch()).await.unwrap();
        let first = repo.find_404(id).await.unwrap();

        tokio::time::sleep(Duration::from_millis(5)).await;
        mutator.update_if_owner(id, Some(owner), patch()).await.unwrap();
        let second = repo.find_404(id).await.unwrap();

        assert_eq!((first.name.as_str(), first.description.as_str()), ("after", "d"));
        assert_eq!((&second.name, &second.description), (&first.name, &first.description));
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at > first.updated_at);
    }

    #[tokio::test]
    async fn empty_and_blank_patches_are_rejected() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        let mutator = OwnershipMutator::new(store);
        let owner = caller();
        let id = mutator.create(Some(owner), input("p")).await.unwrap();

        let err = mutator.update_if_owner(id, Some(owner), PostPatch::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));

        let blank = PostPatch { name: Some(" ".into()), description: None };
        let err = mutator.update_if_owner(id, Some(owner), blank).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation { .. }));
    }

    #[tokio::test]
    async fn owner_delete_removes_exactly_one() {
        let store = Arc::new(MemoryStore::new());
        let mutator = OwnershipMutator::new(store.clone());
        let owner = caller();
        let keep = mutator.create(Some(owner), input("keep")).await.unwrap();
        let gone = mutator.create(Some(owner), input("gone")).await.unwrap();

        mutator.delete_if_owner::<Post>(gone, Some(owner)).await.unwrap();
        assert_eq!(store.len(Collection::Posts).await, 1);

        let repo = Repository::<Post>::new(store);
        assert!(repo.exists(keep).await.unwrap());
        assert!(!repo.exists(gone).await.unwrap());
    }
}
