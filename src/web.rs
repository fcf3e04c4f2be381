use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, ApiResult};
use crate::listing::{self, Scope};
use crate::state::AppState;

pub mod likes;
pub mod posts;
pub mod seed;
pub mod views;

/// 前台阅读端：无需登录，只暴露已发布文章
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/posts", get(posts::list_posts))
        .route("/api/likes", get(likes::count_likes).post(likes::toggle_like))
        .route("/api/update/post", get(views::get_views).post(views::increment_views))
        .route("/api/seed", get(seed::reseed))
        .route("/health", get(crate::admin::health::health_check))
        .merge(listing::routes(Scope::ActiveOnly))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 前台只认已发布文章，未发布与不存在同样返回 404
async fn ensure_published(state: &AppState, id: i64) -> ApiResult<()> {
    match state.posts.find_by_id(id).await? {
        Some(post) if post.active => Ok(()),
        _ => Err(ApiError::not_found("文章不存在")),
    }
}
