use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{fields, reject_blank, require_text, Comment, Entity, FieldErrors, Like};
use crate::database::store::Collection;
use crate::filter::Patch;
use crate::services::ownership::{Draft, OwnedPatch, Stamp};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Post {
    const COLLECTION: Collection = Collection::Posts;
    const NAME: &'static str = "Post";
}

/// Body of `POST /posts`. Anything else the client sends is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl Draft for PostInput {
    type Entity = Post;

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        require_text(fields::NAME, &self.name, &mut errors);
        require_text(fields::DESCRIPTION, &self.description, &mut errors);
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn into_entity(self, stamp: Stamp) -> Post {
        Post {
            id: stamp.id,
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            user_id: stamp.owner.user_id(),
            created_at: stamp.at,
            updated_at: stamp.at,
        }
    }
}

/// Body of `PUT /posts/:id`: only `name` and `description` are mutable.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostPatch {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl OwnedPatch for PostPatch {
    type Entity = Post;

    fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        reject_blank(fields::NAME, &self.name, &mut errors);
        reject_blank(fields::DESCRIPTION, &self.description, &mut errors);
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    fn into_patch(self) -> Patch {
        let mut patch = Patch::new();
        if let Some(name) = self.name {
            patch = patch.set(fields::NAME, name);
        }
        if let Some(description) = self.description {
            patch = patch.set(fields::DESCRIPTION, description);
        }
        patch
    }
}

/// Single-post read view with embedded comments and likes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub comments: Vec<Comment>,
    pub likes: Vec<Like>,
    pub total_comments: u64,
    pub total_likes: u64,
}

/// Listing view: counts only, no embedded documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostSummary {
    #[serde(flatten)]
    pub post: Post,
    pub comment_count: u64,
    pub like_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CallerIdentity;

    #[test]
    fn input_requires_name_and_description() {
        let errors = PostInput::default().validate().unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.contains_key("name"));
        assert!(errors.contains_key("description"));

        let blank = PostInput { name: Some("  ".into()), description: Some("x".into()) };
        let errors = blank.validate().unwrap_err();
        assert_eq!(errors.get("name").map(String::as_str), Some("This field must not be blank"));
    }

    #[test]
    fn stamp_sets_owner_and_timestamps() {
        let owner = CallerIdentity::new(Uuid::new_v4());
        let stamp = Stamp::new(owner);
        let input = PostInput { name: Some("hi".into()), description: Some("x".into()) };
        let post = input.into_entity(stamp.clone());

        assert_eq!(post.id, stamp.id);
        assert_eq!(post.user_id, owner.user_id());
        assert_eq!(post.created_at, post.updated_at);
    }

    #[test]
    fn patch_only_sets_provided_fields() {
        let patch = PostPatch { name: None, description: Some("new".into()) }.into_patch();
        assert_eq!(patch.fields().collect::<Vec<_>>(), vec!["description"]);

        let bad = PostPatch { name: Some("".into()), description: None };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn summary_serializes_flat() {
        let now = Utc::now();
        let summary = PostSummary {
            post: Post {
                id: Uuid::nil(),
                name: "n".into(),
                description: "d".into(),
                user_id: Uuid::nil(),
                created_at: now,
                updated_at: now,
            },
            comment_count: 2,
            like_count: 3,
        };
        let v = serde_json::to_value(&summary).unwrap();
        assert_eq!(v["name"], "n");
        assert_eq!(v["comment_count"], 2);
        assert_eq!(v["like_count"], 3);
        assert!(v.get("post").is_none());
    }
}
