use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use anyhow::{Context, Result};
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::Json;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::{Duration, Instant};

const LOGIN_WINDOW: Duration = Duration::from_secs(60);
const LOGIN_MAX_ATTEMPTS: usize = 5;

#[derive(Clone)]
pub struct AuthUser {
    pub id: String,
    pub username: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize)]
struct Claims {
    sub: String,
    username: String,
    exp: usize,
    jti: String,
}

// ── 密码工具 ──

pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("密码哈希失败: {e}"))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("解析密码哈希失败: {e}"))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

// ── JWT 工具 ──

/// `7d` / `12h` / `30m` / `45s`
fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    let Some(unit) = s.chars().last() else {
        anyhow::bail!("时间为空");
    };
    let num: u64 = s[..s.len() - unit.len_utf8()].parse().context("无效的时间数值")?;
    let secs = match unit {
        'd' => num * 86400,
        'h' => num * 3600,
        'm' => num * 60,
        's' => num,
        _ => anyhow::bail!("不支持的时间单位: {unit}"),
    };
    Ok(Duration::from_secs(secs))
}

fn session_duration(state: &AppState) -> Duration {
    parse_duration(&state.config.auth.jwt_expires_in).unwrap_or(Duration::from_secs(7 * 86400))
}

fn create_jwt(user_id: &str, username: &str, jwt_secret: &str, ttl: Duration) -> Result<String> {
    let exp = chrono::Utc::now().timestamp() as usize + ttl.as_secs() as usize;
    let claims = Claims {
        sub: user_id.to_owned(),
        username: username.to_owned(),
        exp,
        jti: ulid::Ulid::new().to_string(),
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .context("JWT 编码失败")
}

fn decode_jwt(token: &str, jwt_secret: &str) -> Result<Claims> {
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .context("JWT 解码失败")?;
    Ok(data.claims)
}

fn build_cookie(name: &str, value: &str, max_age_secs: u64, secure: bool) -> String {
    let secure_flag = if secure { "; Secure" } else { "" };
    format!("{name}={value}; HttpOnly; SameSite=Strict; Path=/; Max-Age={max_age_secs}{secure_flag}")
}

fn with_cookie(mut resp: Response, cookie: &str) -> Response {
    if let Ok(val) = HeaderValue::from_str(cookie) {
        resp.headers_mut().insert(SET_COOKIE, val);
    }
    resp
}

/// 提取客户端 IP：优先 x-forwarded-for，回退到 x-real-ip
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_owned())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_owned())
        })
        .unwrap_or_else(|| "unknown".to_owned())
}

/// 窗口内尝试次数未超限时记录本次尝试；窗口外的记录连同空条目一并清掉
fn allow_attempt(state: &AppState, ip: &str) -> bool {
    let mut limiter = state.login_limiter.lock().unwrap_or_else(|e| e.into_inner());
    let now = Instant::now();
    limiter.retain(|_, attempts| {
        attempts.retain(|t| now.duration_since(*t) < LOGIN_WINDOW);
        !attempts.is_empty()
    });

    let attempts = limiter.entry(ip.to_owned()).or_default();

    if attempts.len() >= LOGIN_MAX_ATTEMPTS {
        return false;
    }
    attempts.push(now);
    true
}

// ── 路由处理 ──

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<LoginForm>,
) -> ApiResult<Response> {
    let ip = client_ip(&headers);
    if !allow_attempt(&state, &ip) {
        tracing::warn!(%ip, "登录请求过于频繁");
        return Err(ApiError::TooManyRequests("登录请求过于频繁，请稍后再试".into()));
    }

    let Some(token) = try_login(&state, &form).await? else {
        tracing::info!(username = %form.username, "登录失败");
        return Err(ApiError::Unauthorized);
    };

    let cookie = build_cookie(
        &state.config.auth.session_name,
        &token,
        session_duration(&state).as_secs(),
        state.is_https,
    );
    tracing::info!(username = %form.username, "后台登录成功");
    Ok(with_cookie(Json(json!({ "loggedIn": true })).into_response(), &cookie))
}

/// 用户名或密码不对时返回 `None`
async fn try_login(state: &AppState, form: &LoginForm) -> Result<Option<String>> {
    let Some(creds) = state.auth.credentials(&form.username).await? else {
        return Ok(None);
    };

    if !verify_password(&form.password, &creds.password_hash)? {
        return Ok(None);
    }

    if let Err(e) = state.auth.touch_last_login(&creds.id).await {
        tracing::warn!("更新最后登录时间失败：{e}");
    }

    create_jwt(&creds.id, &form.username, &state.jwt_secret, session_duration(state)).map(Some)
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    let cookie_name = &state.config.auth.session_name;

    if let Some(token) = extract_token(&headers, cookie_name)
        && let Ok(claims) = decode_jwt(&token, &state.jwt_secret)
    {
        let expires_at = chrono::DateTime::from_timestamp(claims.exp as i64, 0).unwrap_or_default();
        state.auth.revoke(&claims.jti, expires_at).await?;
    }

    let clear_cookie = build_cookie(cookie_name, "", 0, state.is_https);
    Ok(with_cookie(Json(json!({ "loggedIn": false })).into_response(), &clear_cookie))
}

/// 会话是否有效，只回答是或否
pub async fn status(State(state): State<AppState>, headers: HeaderMap) -> Json<serde_json::Value> {
    let logged_in = authenticate(&state, &headers).await.is_some();
    Json(json!({ "loggedIn": logged_in }))
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Option<Claims> {
    let token = extract_token(headers, &state.config.auth.session_name)?;
    let claims = decode_jwt(&token, &state.jwt_secret).ok()?;
    if state.auth.is_revoked(&claims.jti).await {
        return None;
    }
    Some(claims)
}

// ── 认证中间件 ──

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(claims) = authenticate(&state, req.headers()).await else {
        return ApiError::Unauthorized.into_response();
    };

    req.extensions_mut().insert(AuthUser {
        id: claims.sub.clone(),
        username: claims.username.clone(),
    });

    let resp = next.run(req).await;

    // 自动续期：剩余时间不足总有效期的 1/3 时签发新 token
    let total = session_duration(&state);
    let now = chrono::Utc::now().timestamp() as usize;
    let remaining = claims.exp.saturating_sub(now);
    if remaining < total.as_secs() as usize / 3
        && let Ok(new_token) = create_jwt(&claims.sub, &claims.username, &state.jwt_secret, total)
    {
        let cookie = build_cookie(
            &state.config.auth.session_name,
            &new_token,
            total.as_secs(),
            state.is_https,
        );
        return with_cookie(resp, &cookie);
    }

    resp
}

fn extract_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let header_str = headers.get(axum::http::header::COOKIE)?.to_str().ok()?;
    header_str
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == cookie_name && !value.is_empty())
        .map(|(_, value)| value.to_owned())
}

/// 测试用：直接签发一个有效会话 Cookie
#[cfg(test)]
pub(crate) fn session_cookie(state: &AppState) -> String {
    let token = create_jwt("test-user", "admin", &state.jwt_secret, Duration::from_secs(3600))
        .expect("sign test token");
    format!("{}={token}", state.config.auth.session_name)
}
