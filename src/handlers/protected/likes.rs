use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    Extension, Json,
};

use crate::app::AppState;
use crate::auth::CallerIdentity;
use crate::database::models::{Like, LikeInput};
use crate::handlers::utils::{caller, parse_id, PageQuery};
use crate::middleware::{ApiResult, Created, IntoApiResponse, Message};
use crate::services::{LikeService, Page};

/// GET /likes
pub async fn like_list(State(state): State<AppState>, Query(query): Query<PageQuery>) -> ApiResult<Page<Like>> {
    let request = query.page_request(&state.config.pagination)?;
    let page = LikeService::new(state.store.clone()).list(request).await?;
    Ok(page.into_api_response())
}

/// GET /likes/:id
pub async fn like_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Like> {
    let id = parse_id(&id)?;
    let like = LikeService::new(state.store.clone()).get(id).await?;
    Ok(like.into_api_response())
}

/// POST /likes
pub async fn like_create(
    State(state): State<AppState>,
    identity: Option<Extension<CallerIdentity>>,
    payload: Result<Json<LikeInput>, JsonRejection>,
) -> ApiResult<Created> {
    let Json(input) = payload?;
    let inserted_id = LikeService::new(state.store.clone())
        .create(caller(identity), input)
        .await?;
    Ok(Created { inserted_id }.into_api_response())
}

/// DELETE /likes/:id
pub async fn like_delete(
    State(state): State<AppState>,
    identity: Option<Extension<CallerIdentity>>,
    Path(id): Path<String>,
) -> ApiResult<Message> {
    let id = parse_id(&id)?;
    LikeService::new(state.store.clone())
        .delete(id, caller(identity))
        .await?;
    Ok(Message::new("Like deleted successfully").into_api_response())
}
