use axum::Json;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ViewsQuery {
    #[serde(rename = "postId")]
    pub post_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ViewForm {
    pub id: i64,
}

pub async fn get_views(State(state): State<AppState>, Query(query): Query<ViewsQuery>) -> ApiResult<Json<i64>> {
    let post_id = query
        .post_id
        .as_deref()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| ApiError::bad_request("postId is required"))?;
    super::ensure_published(&state, post_id).await?;

    state
        .posts
        .views(post_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("文章不存在"))
}

/// 每次调用阅读量恰好加一，请求体里的其他字段一律忽略
pub async fn increment_views(State(state): State<AppState>, Json(form): Json<ViewForm>) -> ApiResult<Json<Value>> {
    super::ensure_published(&state, form.id).await?;
    let views = state
        .posts
        .increment_views(form.id)
        .await?
        .ok_or_else(|| ApiError::not_found("文章不存在"))?;

    Ok(Json(json!({ "id": form.id, "views": views })))
}
