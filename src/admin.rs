use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, post};
use tower_http::trace::TraceLayer;

use crate::listing::{self, Scope};
use crate::media::upload::parse_max_size;
use crate::state::AppState;

pub mod auth;
pub mod cleanup;
pub mod health;
pub mod posts;
pub mod upload;

/// multipart 边界和字段头的额外开销
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn router(state: AppState) -> Router {
    // 无需认证的路由
    let public_routes = Router::new()
        .route("/api/auth", get(auth::status))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/health", get(health::health_check));

    let upload_limit = parse_max_size(&state.config.storage.max_file_size) + MULTIPART_OVERHEAD;

    // 需要认证的路由
    let protected_routes = Router::new()
        .route("/api/posts", get(posts::list_posts))
        .route("/api/posts/create", post(posts::create_post))
        .route("/api/posts/update/post", post(posts::update_post))
        .route("/api/posts/update/active", post(posts::update_active))
        .route("/api/posts/delete", delete(posts::delete_post))
        .route(
            "/api/upload",
            post(upload::upload_image).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/api/config-check", get(health::config_check))
        .merge(listing::routes(Scope::All))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
