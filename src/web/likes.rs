use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::admin::auth::client_ip;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LikeForm {
    #[serde(rename = "postId")]
    pub post_id: i64,
    /// 点赞来源，缺省时取请求的客户端 IP
    #[serde(rename = "userIP", default)]
    pub user_ip: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LikeQuery {
    #[serde(rename = "postId")]
    pub post_id: Option<String>,
}

/// 同一来源再次点赞即取消
pub async fn toggle_like(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<LikeForm>,
) -> ApiResult<Json<Value>> {
    let source = form
        .user_ip
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| client_ip(&headers));

    super::ensure_published(&state, form.post_id).await?;

    let liked = state.likes.toggle(form.post_id, &source).await?;
    let message = if liked { "Post liked" } else { "Post unliked" };
    Ok(Json(json!({ "message": message, "liked": liked })))
}

pub async fn count_likes(State(state): State<AppState>, Query(query): Query<LikeQuery>) -> ApiResult<Json<i64>> {
    let post_id = query
        .post_id
        .as_deref()
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|id| *id != 0)
        .ok_or_else(|| ApiError::bad_request("postId is required"))?;

    Ok(Json(state.likes.count(post_id).await?))
}
