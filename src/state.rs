use crate::config::SiteConfig;
use crate::media::s3::S3Client;
use crate::repository::{AuthRepository, LikeRepository, PostRepository, SettingsRepository};
use anyhow::Result;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// 登录速率限制：IP -> 登录尝试时间戳列表
pub type LoginLimiter = Arc<std::sync::Mutex<HashMap<String, Vec<Instant>>>>;

/// 前台与后台共享的状态，两个 Router 各自持有一份克隆
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SiteConfig>,
    pub posts: PostRepository,
    pub likes: LikeRepository,
    pub auth: AuthRepository,
    pub storage: S3Client,
    pub login_limiter: LoginLimiter,
    /// 实际使用的 JWT 密钥（优先配置文件，其次数据库持久化自动生成）
    pub jwt_secret: Arc<String>,
    /// 站点是否通过 HTTPS 提供服务（根据 site.url 判断）
    pub is_https: bool,
}

impl AppState {
    pub async fn open(project_root: &Path, config: SiteConfig) -> Result<Self> {
        let db_path = project_root.join(&config.server.database);
        let pool = crate::repository::connect(&db_path).await?;
        Self::new(pool, config).await
    }

    pub async fn new(db: SqlitePool, config: SiteConfig) -> Result<Self> {
        let settings = SettingsRepository::new(db.clone());

        // 解析 JWT secret：配置文件显式设置 > 数据库持久化 > 自动生成
        let jwt_secret = resolve_jwt_secret(&config.auth.jwt_secret, &settings).await?;

        let is_https = config.site.url.starts_with("https://");
        let storage = S3Client::new(config.storage.clone());

        Ok(Self {
            posts: PostRepository::new(db.clone()),
            likes: LikeRepository::new(db.clone()),
            auth: AuthRepository::new(db),
            config: Arc::new(config),
            storage,
            login_limiter: Arc::new(std::sync::Mutex::new(HashMap::new())),
            jwt_secret: Arc::new(jwt_secret),
            is_https,
        })
    }
}

const DEFAULT_JWT_SECRET: &str = "CHANGE_ME_IN_PRODUCTION";
const JWT_SECRET_KEY: &str = "jwt_secret";

/// 配置文件显式设置 > 数据库持久化 > 自动生成新密钥
async fn resolve_jwt_secret(config_secret: &str, settings: &SettingsRepository) -> Result<String> {
    if config_secret != DEFAULT_JWT_SECRET && !config_secret.is_empty() {
        return Ok(config_secret.to_owned());
    }

    tracing::warn!("JWT secret 未配置或为默认值，将使用自动生成并持久化的密钥");
    settings.get_or_init(JWT_SECRET_KEY, generate_random_secret).await
}

fn generate_random_secret() -> String {
    use argon2::password_hash::rand_core::{OsRng, RngCore};

    let mut bytes = [0u8; 64];
    OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// 测试用状态：内存数据库 + 最小配置
#[cfg(test)]
pub(crate) async fn test_state(extra_config: &str) -> AppState {
    let content = format!("[site]\ntitle = \"Test\"\n{extra_config}");
    let config = SiteConfig::parse(&content).expect("parse test config");
    AppState::new(crate::repository::test_pool().await, config)
        .await
        .expect("build test state")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn generated_secret_is_persisted() {
        let pool = crate::repository::test_pool().await;
        let settings = SettingsRepository::new(pool);

        let first = resolve_jwt_secret(DEFAULT_JWT_SECRET, &settings).await.unwrap();
        let second = resolve_jwt_secret("", &settings).await.unwrap();
        assert_eq!(first.len(), 128);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn configured_secret_wins() {
        let pool = crate::repository::test_pool().await;
        let settings = SettingsRepository::new(pool);
        let secret = resolve_jwt_secret("s3cret", &settings).await.unwrap();
        assert_eq!(secret, "s3cret");
        assert_eq!(settings.get(JWT_SECRET_KEY).await.unwrap(), None);
    }
}
