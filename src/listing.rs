//! 前台与后台共用的只读列表路由。
//!
//! 两个应用的差别只在快照范围：后台看到全部文章，前台只看到已发布的。

use axum::Json;
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use serde::Deserialize;

use crate::content::Post;
use crate::content::filter::in_month;
use crate::content::navigation::{Navigation, build_navigation, has_tag, in_category, matches_query};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    ActiveOnly,
}

impl Scope {
    /// 按发布时间降序的快照
    pub async fn snapshot(self, state: &AppState) -> anyhow::Result<Vec<Post>> {
        match self {
            Self::All => state.posts.list_all().await,
            Self::ActiveOnly => state.posts.list_active().await,
        }
    }

    fn admits(self, post: &Post) -> bool {
        self == Self::All || post.active
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub fn routes(scope: Scope) -> Router<AppState> {
    Router::new()
        .route(
            "/api/navigation",
            get(move |state: State<AppState>| navigation(state, scope)),
        )
        .route(
            "/api/category/{name}",
            get(move |state: State<AppState>, path: Path<String>| by_category(state, path, scope)),
        )
        .route(
            "/api/tags/{name}",
            get(move |state: State<AppState>, path: Path<String>| by_tag(state, path, scope)),
        )
        .route(
            "/api/history/{year}/{month}",
            get(move |state: State<AppState>, path: Path<(String, String)>| by_month(state, path, scope)),
        )
        .route(
            "/api/search",
            get(move |state: State<AppState>, query: Query<SearchQuery>| search(state, query, scope)),
        )
        .route(
            "/api/post/{url_id}",
            get(move |state: State<AppState>, path: Path<String>| detail(state, path, scope)),
        )
}

async fn navigation(State(state): State<AppState>, scope: Scope) -> ApiResult<Json<Navigation>> {
    let posts = scope.snapshot(&state).await?;
    Ok(Json(build_navigation(&posts)))
}

async fn by_category(State(state): State<AppState>, Path(name): Path<String>, scope: Scope) -> ApiResult<Json<Vec<Post>>> {
    let mut posts = scope.snapshot(&state).await?;
    posts.retain(|p| in_category(p, &name));
    Ok(Json(posts))
}

async fn by_tag(State(state): State<AppState>, Path(name): Path<String>, scope: Scope) -> ApiResult<Json<Vec<Post>>> {
    let mut posts = scope.snapshot(&state).await?;
    posts.retain(|p| has_tag(p, &name));
    Ok(Json(posts))
}

/// 路由中的月份从 1 开始
async fn by_month(
    State(state): State<AppState>,
    Path((year, month)): Path<(String, String)>,
    scope: Scope,
) -> ApiResult<Json<Vec<Post>>> {
    let year: i32 = year.parse().map_err(|_| ApiError::bad_request("无效的年份"))?;
    let month: u32 = month
        .parse()
        .ok()
        .filter(|m| (1..=12).contains(m))
        .ok_or_else(|| ApiError::bad_request("无效的月份"))?;

    let mut posts = scope.snapshot(&state).await?;
    posts.retain(|p| in_month(p, year, month));
    Ok(Json(posts))
}

async fn search(State(state): State<AppState>, Query(query): Query<SearchQuery>, scope: Scope) -> ApiResult<Json<Vec<Post>>> {
    let mut posts = scope.snapshot(&state).await?;
    posts.retain(|p| matches_query(p, &query.q));
    Ok(Json(posts))
}

async fn detail(State(state): State<AppState>, Path(url_id): Path<String>, scope: Scope) -> ApiResult<Json<Post>> {
    state
        .posts
        .find_by_url_id(&url_id)
        .await?
        .filter(|p| scope.admits(p))
        .map(Json)
        .ok_or_else(|| ApiError::not_found("文章不存在"))
}

#[cfg(test)]
pub(crate) mod testing {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use serde_json::Value;

    pub async fn json_body(resp: Response) -> (StatusCode, Value) {
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    pub fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{get, json_body};
    use super::*;
    use crate::repository::post::PostInput;
    use crate::state::test_state;
    use axum::http::StatusCode;
    use chrono::{TimeZone, Utc};
    use tower::ServiceExt;

    fn input(title: &str, tags: &str, category: &str, ymd: (i32, u32, u32)) -> PostInput {
        PostInput {
            title: title.into(),
            description: format!("About {title}"),
            content: String::new(),
            image_url: String::new(),
            tags: tags.into(),
            category: category.into(),
            date: Utc.with_ymd_and_hms(ymd.0, ymd.1, ymd.2, 8, 0, 0).single(),
        }
    }

    async fn app(scope: Scope) -> Router {
        let state = test_state("").await;
        let posts = &state.posts;
        posts.create(&input("Tokio Tips", "rust, async", "Dev Ops", (2024, 3, 2)), "tokio-tips").await.unwrap();
        let draft = posts.create(&input("Hidden Draft", "rust", "Dev Ops", (2024, 3, 9)), "hidden-draft").await.unwrap();
        posts.create(&input("Garden Notes", "plants", "Life", (2023, 11, 20)), "garden-notes").await.unwrap();
        posts.set_active(draft.id, false).await.unwrap();
        routes(scope).with_state(state)
    }

    fn titles(body: &serde_json::Value) -> Vec<&str> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|p| p["title"].as_str().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn active_scope_hides_drafts() {
        let (status, body) = json_body(app(Scope::ActiveOnly).await.oneshot(get("/api/tags/rust")).await.unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(titles(&body), vec!["Tokio Tips"]);

        let (status, _) = json_body(app(Scope::ActiveOnly).await.oneshot(get("/api/post/hidden-draft")).await.unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn all_scope_includes_drafts_newest_first() {
        let (_, body) = json_body(app(Scope::All).await.oneshot(get("/api/category/dev-ops")).await.unwrap()).await;
        assert_eq!(titles(&body), vec!["Hidden Draft", "Tokio Tips"]);

        let (status, body) = json_body(app(Scope::All).await.oneshot(get("/api/post/hidden-draft")).await.unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["active"], false);
    }

    #[tokio::test]
    async fn navigation_counts_active_posts() {
        let (_, body) = json_body(app(Scope::ActiveOnly).await.oneshot(get("/api/navigation")).await.unwrap()).await;
        assert_eq!(body["categories"][0]["name"], "Dev Ops");
        assert_eq!(body["categories"][0]["count"], 1);
        assert_eq!(body["history"][0]["href"], "/history/2024/3");
        assert_eq!(body["history"][1]["month"], 10);
    }

    #[tokio::test]
    async fn history_route_is_one_based() {
        let (_, body) = json_body(app(Scope::All).await.oneshot(get("/api/history/2023/11")).await.unwrap()).await;
        assert_eq!(titles(&body), vec!["Garden Notes"]);

        let (status, body) = json_body(app(Scope::All).await.oneshot(get("/api/history/2023/13")).await.unwrap()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "无效的月份");
    }

    #[tokio::test]
    async fn search_matches_description() {
        let (_, body) = json_body(app(Scope::ActiveOnly).await.oneshot(get("/api/search?q=about%20garden")).await.unwrap()).await;
        assert_eq!(titles(&body), vec!["Garden Notes"]);

        let (_, body) = json_body(app(Scope::ActiveOnly).await.oneshot(get("/api/search")).await.unwrap()).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }
}
