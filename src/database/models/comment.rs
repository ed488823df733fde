use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{fields, reject_blank, require_text, Entity, FieldErrors};
use crate::database::store::Collection;
use crate::filter::Patch;
use crate::services::ownership::{Draft, OwnedPatch, Reference, Stamp};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Comment {
    const COLLECTION: Collection = Collection::Comments;
    const NAME: &'static str = "Comment";
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentInput {
    pub post_id: Option<Uuid>,
    pub description: Option<String>,
}

impl Draft for CommentInput {
    type Entity = Comment;

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        match self.post_id {
            None => {
                errors.insert(fields::POST_ID.to_string(), "This field is required".to_string());
            }
            Some(id) if id.is_nil() => {
                errors.insert(fields::POST_ID.to_string(), "Must reference a post".to_string());
            }
            Some(_) => {}
        }
        require_text(fields::DESCRIPTION, &self.description, &mut errors);
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn references(&self) -> Vec<Reference> {
        self.post_id
            .map(|id| Reference { field: fields::POST_ID, collection: Collection::Posts, id })
            .into_iter()
            .collect()
    }

    fn into_entity(self, stamp: Stamp) -> Comment {
        Comment {
            id: stamp.id,
            post_id: self.post_id.unwrap_or_default(),
            user_id: stamp.owner.user_id(),
            description: self.description.unwrap_or_default(),
            created_at: stamp.at,
            updated_at: stamp.at,
        }
    }
}

/// Body of `PUT /comments/:id`: only `description` is mutable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentPatch {
    pub description: Option<String>,
}

impl OwnedPatch for CommentPatch {
    type Entity = Comment;

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        reject_blank(fields::DESCRIPTION, &self.description, &mut errors);
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn into_patch(self) -> Patch {
        match self.description {
            Some(description) => Patch::new().set(fields::DESCRIPTION, description),
            None => Patch::new(),
        }
    }
}
