use axum::extract::{Path, Query, State};

use crate::app::AppState;
use crate::database::models::{PostDetail, PostSummary};
use crate::handlers::utils::{parse_id, PageQuery};
use crate::middleware::{ApiResult, IntoApiResponse};
use crate::services::{Page, PostService};

/// GET /posts - page of posts with comment and like counts
pub async fn post_list(State(state): State<AppState>, Query(query): Query<PageQuery>) -> ApiResult<Page<PostSummary>> {
    let request = query.page_request(&state.config.pagination)?;
    let page = PostService::new(state.store.clone()).list(request).await?;
    Ok(page.into_api_response())
}

/// GET /posts/:id - one post with its comments and likes embedded
pub async fn post_get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<PostDetail> {
    let id = parse_id(&id)?;
    let detail = PostService::new(state.store.clone()).fetch_by_id(id).await?;
    Ok(detail.into_api_response())
}
