use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// 仅在 `seed.enabled = true` 时可用
pub async fn reseed(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    if !state.config.seed.enabled {
        return Err(ApiError::NotImplemented("Not Available".into()));
    }

    let count = crate::seed::reseed(&state.posts).await?;
    Ok(Json(json!({ "message": "Seeded", "count": count })))
}

#[cfg(test)]
mod tests {
    use crate::listing::testing::{get, json_body};
    use crate::state::test_state;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[tokio::test]
    async fn disabled_by_default() {
        let app = crate::web::router(test_state("").await);
        let (status, body) = json_body(app.oneshot(get("/api/seed")).await.unwrap()).await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(body["error"], "Not Available");
    }

    #[tokio::test]
    async fn enabled_seed_fills_listing() {
        let app = crate::web::router(test_state("[seed]\nenabled = true\n").await);
        let (status, body) = json_body(app.clone().oneshot(get("/api/seed")).await.unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Seeded");

        let (_, body) = json_body(app.oneshot(get("/api/posts?limit=3")).await.unwrap()).await;
        assert_eq!(body["posts"].as_array().unwrap().len(), 3);
        assert_eq!(body["hasMore"], true);
    }
}
