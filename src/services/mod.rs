pub mod comments;
pub mod error;
pub mod likes;
pub mod ownership;
pub mod pagination;
pub mod posts;

pub use comments::CommentService;
pub use error::ServiceError;
pub use likes::LikeService;
pub use ownership::{Draft, OwnedPatch, OwnershipMutator, Reference, Stamp};
pub use pagination::{Page, PageRequest};
pub use posts::PostService;
