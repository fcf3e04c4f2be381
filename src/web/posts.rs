use axum::Json;
use axum::extract::{Query, State};

use crate::content::Post;
use crate::content::pagination::{Page, PageParams};
use crate::error::ApiResult;
use crate::state::AppState;

/// 无限滚动分页：`?page=0&limit=5`，最新在前；缺省 `limit` 取自 `listing.default_limit`
pub async fn list_posts(State(state): State<AppState>, Query(params): Query<PageParams>) -> ApiResult<Json<Page<Post>>> {
    let listing = &state.config.listing;
    let request = params.resolve(listing.default_limit, listing.max_limit);

    let total = state.posts.count_active().await?;
    let posts = state.posts.page_active(request.offset(), request.limit).await?;

    Ok(Json(Page::new(posts, total, &request)))
}
