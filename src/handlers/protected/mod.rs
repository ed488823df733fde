// Protected handlers: routed behind jwt_auth_middleware, which puts the
// caller's CallerIdentity into request extensions. Comment and like reads
// live here too.
pub mod comments;
pub mod likes;
pub mod posts;
