use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};

use crate::app::AppState;
use crate::auth::CallerIdentity;
use crate::database::models::{PostInput, PostPatch};
use crate::handlers::utils::{caller, parse_id};
use crate::middleware::{ApiResult, Created, IntoApiResponse, Message};
use crate::services::PostService;

/// POST /posts - owner is always the caller; a client `user_id` is ignored
pub async fn post_create(
    State(state): State<AppState>,
    identity: Option<Extension<CallerIdentity>>,
    payload: Result<Json<PostInput>, JsonRejection>,
) -> ApiResult<Created> {
    let Json(input) = payload?;
    let inserted_id = PostService::new(state.store.clone())
        .create(caller(identity), input)
        .await?;
    Ok(Created { inserted_id }.into_api_response())
}

/// PUT /posts/:id - name and description only, owner only
pub async fn post_update(
    State(state): State<AppState>,
    identity: Option<Extension<CallerIdentity>>,
    Path(id): Path<String>,
    payload: Result<Json<PostPatch>, JsonRejection>,
) -> ApiResult<Message> {
    let id = parse_id(&id)?;
    let Json(patch) = payload?;
    PostService::new(state.store.clone())
        .update(id, caller(identity), patch)
        .await?;
    Ok(Message::new("Post updated successfully").into_api_response())
}

/// DELETE /posts/:id - owner only; comments and likes are kept
pub async fn post_delete(
    State(state): State<AppState>,
    identity: Option<Extension<CallerIdentity>>,
    Path(id): Path<String>,
) -> ApiResult<Message> {
    let id = parse_id(&id)?;
    PostService::new(state.store.clone())
        .delete(id, caller(identity))
        .await?;
    Ok(Message::new("Post deleted successfully").into_api_response())
}
