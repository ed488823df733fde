use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};

use crate::app::AppState;
use crate::auth::CallerIdentity;
use crate::database::models::{Comment, CommentInput, CommentPatch};
use crate::handlers::utils::{caller, parse_id, PageQuery};
use crate::middleware::{ApiResult, Created, IntoApiResponse, Message};
use crate::services::{CommentService, Page};

/// GET /comments
pub async fn comment_list(State(state): State<AppState>, Query(query): Query<PageQuery>) -> ApiResult<Page<Comment>> {
    let request = query.page_request(&state.config.pagination)?;
    let page = CommentService::new(state.store.clone()).list(request).await?;
    Ok(page.into_api_response())
}

/// GET /comments/:id
pub async fn comment_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Comment> {
    let id = parse_id(&id)?;
    let comment = CommentService::new(state.store.clone()).get(id).await?;
    Ok(comment.into_api_response())
}

/// POST /comments
pub async fn comment_create(
    State(state): State<AppState>,
    identity: Option<Extension<CallerIdentity>>,
    payload: Result<Json<CommentInput>, JsonRejection>,
) -> ApiResult<Created> {
    let Json(input) = payload?;
    let inserted_id = CommentService::new(state.store.clone())
        .create(caller(identity), input)
        .await?;
    Ok(Created { inserted_id }.into_api_response())
}

/// PUT /comments/:id
pub async fn comment_update(
    State(state): State<AppState>,
    identity: Option<Extension<CallerIdentity>>,
    Path(id): Path<String>,
    payload: Result<Json<CommentPatch>, JsonRejection>,
) -> ApiResult<Message> {
    let id = parse_id(&id)?;
    let Json(patch) = payload?;
    CommentService::new(state.store.clone())
        .update(id, caller(identity), patch)
        .await?;
    Ok(Message::new("Comment updated successfully").into_api_response())
}

/// DELETE /comments/:id
pub async fn comment_delete(
    State(state): State<AppState>,
    identity: Option<Extension<CallerIdentity>>,
    Path(id): Path<String>,
) -> ApiResult<Message> {
    let id = parse_id(&id)?;
    CommentService::new(state.store.clone())
        .delete(id, caller(identity))
        .await?;
    Ok(Message::new("Comment deleted successfully").into_api_response())
}
