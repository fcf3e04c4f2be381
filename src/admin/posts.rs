use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::admin::auth::AuthUser;
use crate::content::Post;
use crate::content::filter::{PostFilter, SortKey, filter_and_sort};
use crate::content::slug::generate_slug_with;
use crate::error::{ApiError, ApiResult};
use crate::repository::post::{PostInput, is_unique_violation};
use crate::state::AppState;

/// url_id 唯一索引冲突时最多重新生成的次数
const SLUG_ATTEMPTS: usize = 3;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub tag: Option<String>,
    /// `DDMMYYYY`
    pub date: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePostForm {
    pub id: i64,
    #[serde(flatten)]
    pub input: PostInput,
}

#[derive(Debug, Deserialize)]
pub struct UpdateActiveForm {
    pub id: i64,
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    pub id: Option<String>,
}

/// 后台列表：全部文章（含未发布），先按最新在前，再应用过滤和排序
pub async fn list_posts(State(state): State<AppState>, Query(query): Query<ListQuery>) -> ApiResult<Json<Vec<Post>>> {
    let posts = state.posts.list_all().await?;
    let filter = PostFilter {
        text: query.q,
        tag: query.tag,
        min_date: query.date,
    };
    let sort = SortKey::parse(query.sort.as_deref());

    Ok(Json(filter_and_sort(&posts, &filter, sort).into_iter().cloned().collect()))
}

pub async fn create_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(input): Json<PostInput>,
) -> ApiResult<(StatusCode, Json<Post>)> {
    validate(&input)?;

    let post = with_fresh_slug(&state, &input.title, None, |url_id| {
        let posts = &state.posts;
        let input = &input;
        async move { posts.create(input, &url_id).await }
    })
    .await?;

    tracing::info!(id = post.id, url_id = %post.url_id, by = %user.username, "文章已创建");
    Ok((StatusCode::CREATED, Json(post)))
}

/// 标题变化时才重新生成 url_id，查重时排除自身
pub async fn update_post(State(state): State<AppState>, Json(form): Json<UpdatePostForm>) -> ApiResult<Json<Post>> {
    validate(&form.input)?;

    let existing = state
        .posts
        .find_by_id(form.id)
        .await?
        .ok_or_else(|| ApiError::not_found("文章不存在"))?;

    let updated = if existing.title == form.input.title {
        state.posts.update(form.id, &form.input, &existing.url_id).await?
    } else {
        with_fresh_slug(&state, &form.input.title, Some(form.id), |url_id| {
            let posts = &state.posts;
            let form = &form;
            async move { posts.update(form.id, &form.input, &url_id).await }
        })
        .await?
    };

    let post = updated.ok_or_else(|| ApiError::not_found("文章不存在"))?;
    tracing::info!(id = post.id, url_id = %post.url_id, "文章已更新");
    Ok(Json(post))
}

pub async fn update_active(State(state): State<AppState>, Json(form): Json<UpdateActiveForm>) -> ApiResult<Json<Post>> {
    let post = state
        .posts
        .set_active(form.id, form.active)
        .await?
        .ok_or_else(|| ApiError::not_found("文章不存在"))?;

    tracing::info!(id = post.id, active = post.active, "文章发布状态已修改");
    Ok(Json(post))
}

pub async fn delete_post(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<DeleteQuery>,
) -> ApiResult<Json<Value>> {
    let id = query
        .id
        .as_deref()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::bad_request("需要有效的文章 ID"))?;

    let post = state
        .posts
        .delete(id)
        .await?
        .ok_or_else(|| ApiError::not_found("文章不存在"))?;

    tracing::info!(id, by = %user.username, "文章已删除");
    Ok(Json(json!({ "message": "文章已删除", "post": post })))
}

fn validate(input: &PostInput) -> ApiResult<()> {
    if input.title.trim().is_empty() {
        return Err(ApiError::bad_request("标题不能为空"));
    }
    Ok(())
}

/// 生成 url_id 后执行写入；并发写入撞上唯一索引时重新生成
async fn with_fresh_slug<T, F, Fut>(state: &AppState, title: &str, exclude_id: Option<i64>, mut write: F) -> anyhow::Result<T>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let mut attempt = 1;
    loop {
        let url_id = generate_slug_with(title, exclude_id, &state.posts).await?;
        match write(url_id).await {
            Err(e) if attempt < SLUG_ATTEMPTS && is_unique_violation(&e) => {
                tracing::warn!(attempt, "url_id 冲突，重新生成");
                attempt += 1;
            }
            other => return other,
        }
    }
}
