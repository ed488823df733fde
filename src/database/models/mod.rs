pub mod comment;
pub mod like;
pub mod post;

pub use comment::{Comment, CommentInput, CommentPatch};
pub use like::{Like, LikeInput};
pub use post::{Post, PostDetail, PostInput, PostPatch, PostSummary};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::database::store::{Collection, Document, StoreError};

/// Stored document field names shared by entities, filters and pipelines.
pub mod fields {
    pub const ID: &str = "id";
    pub const USER_ID: &str = "user_id";
    pub const POST_ID: &str = "post_id";
    pub const NAME: &str = "name";
    pub const DESCRIPTION: &str = "description";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";

    pub const COMMENTS: &str = "comments";
    pub const LIKES: &str = "likes";
    pub const TOTAL_COMMENTS: &str = "total_comments";
    pub const TOTAL_LIKES: &str = "total_likes";
    pub const COMMENT_COUNT: &str = "comment_count";
    pub const LIKE_COUNT: &str = "like_count";
}

/// Field name -> human readable problem.
pub type FieldErrors = HashMap<String, String>;

/// A typed record stored in one collection.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;
    /// Singular display name used in messages, e.g. "Post".
    const NAME: &'static str;
}

pub fn to_document<T: Serialize>(value: &T) -> Result<Document, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument(format!("expected object, got {}", other))),
    }
}

pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T, StoreError> {
    Ok(serde_json::from_value(Value::Object(doc))?)
}

/// Required text: present and not blank. Records a field error otherwise.
pub(crate) fn require_text(field: &str, value: &Option<String>, errors: &mut FieldErrors) {
    match value {
        Some(v) if !v.trim().is_empty() => {}
        Some(_) => {
            errors.insert(field.to_string(), "This field must not be blank".to_string());
        }
        None => {
            errors.insert(field.to_string(), "This field is required".to_string());
        }
    }
}

/// Optional text in a patch: absent is fine, blank is not.
pub(crate) fn reject_blank(field: &str, value: &Option<String>, errors: &mut FieldErrors) {
    if matches!(value, Some(v) if v.trim().is_empty()) {
        errors.insert(field.to_string(), "This field must not be blank".to_string());
    }
}
