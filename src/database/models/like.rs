use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{fields, Entity, FieldErrors};
use crate::database::store::Collection;
use crate::services::ownership::{Draft, Reference, Stamp};

// No uniqueness on (user_id, post_id): a user may like the same post more than once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Like {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Like {
    const COLLECTION: Collection = Collection::Likes;
    const NAME: &'static str = "Like";
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LikeInput {
    pub post_id: Option<Uuid>,
}

impl Draft for LikeInput {
    type Entity = Like;

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
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn references(&self) -> Vec<Reference> {
        self.post_id
            .map(|id| Reference { field: fields::POST_ID, collection: Collection::Posts, id })
            .into_iter()
            .collect()
    }

    fn into_entity(self, stamp: Stamp) -> Like {
        Like {
            id: stamp.id,
            user_id: stamp.owner.user_id(),
            post_id: self.post_id.unwrap_or_default(),
            created_at: stamp.at,
            updated_at: stamp.at,
        }
    }
}
