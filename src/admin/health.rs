use axum::extract::State;
use axum::response::Json;
use serde_json::{Value, json};

use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let posts = state.posts.count_active().await;
    let db_ok = posts.is_ok();

    Json(json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "version": env!("CARGO_PKG_VERSION"),
        "database": if db_ok { "connected" } else { "error" },
        "activePosts": posts.ok(),
    }))
}

/// 报告对象存储各项是否已配置，不返回密钥本身
pub async fn config_check(State(state): State<AppState>) -> Json<Value> {
    let storage = state.storage.config();
    Json(json!({
        "region": !storage.region.is_empty(),
        "bucket": !storage.bucket.is_empty(),
        "accessKeyId": !storage.access_key_id.is_empty(),
        "secretAccessKey": !storage.secret_access_key.is_empty(),
        "endpoint": (!storage.endpoint.is_empty()).then(|| storage.endpoint.clone()),
        "configured": storage.is_configured(),
    }))
}
